//! Drop and overrun counters shared between the host threads.
//!
//! The block thread only increments atomics; reporting happens on the output thread.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

#[derive(Debug, Default)]
pub struct HostStats {
    blocks: AtomicU64,
    dropped_input: AtomicU64,
    dropped_output: AtomicU64,
    overruns: AtomicU64,
}

impl HostStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_block(&self) {
        self.blocks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped_input(&self, count: u64) {
        self.dropped_input.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped_output(&self, count: u64) {
        self.dropped_output.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            blocks: self.blocks.load(Ordering::Relaxed),
            dropped_input: self.dropped_input.load(Ordering::Relaxed),
            dropped_output: self.dropped_output.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`HostStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub blocks: u64,
    /// Inbound messages lost to a full queue or too long to represent (SysEx).
    pub dropped_input: u64,
    /// Outbound messages lost to a full block buffer or output channel.
    pub dropped_output: u64,
    /// Blocks whose processing took longer than the block period.
    pub overruns: u64,
}

impl StatsSnapshot {
    /// Counter increases since `earlier`.
    pub fn since(&self, earlier: &StatsSnapshot) -> StatsSnapshot {
        StatsSnapshot {
            blocks: self.blocks.saturating_sub(earlier.blocks),
            dropped_input: self.dropped_input.saturating_sub(earlier.dropped_input),
            dropped_output: self.dropped_output.saturating_sub(earlier.dropped_output),
            overruns: self.overruns.saturating_sub(earlier.overruns),
        }
    }

    pub fn has_losses(&self) -> bool {
        self.dropped_input > 0 || self.dropped_output > 0 || self.overruns > 0
    }
}

/// Logs counter increases since the previous report.
#[derive(Debug, Default)]
pub struct StatsReporter {
    last: StatsSnapshot,
}

impl StatsReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the increases, warning if any of them is a loss.
    pub fn report(&mut self, stats: &HostStats) -> StatsSnapshot {
        let now = stats.snapshot();
        let delta = now.since(&self.last);
        self.last = now;
        if delta.has_losses() {
            warn!(
                "Dropped {} input and {} output MIDI events, {} block overruns in the last {} blocks",
                delta.dropped_input, delta.dropped_output, delta.overruns, delta.blocks
            );
        }
        delta
    }
}
