//! Output thread: takes translated events off the block thread and sends them.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use retune_midi::RawMidiEvent;
use tracing::{debug, trace, warn};

use crate::stats::{HostStats, StatsReporter};
use crate::Result;

const IDLE_TIMEOUT: Duration = Duration::from_millis(100);
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Destination for outbound MIDI bytes. Runs on the output thread, so it may block
/// and allocate.
pub trait OutputSink: Send + 'static {
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Forwards copies of the bytes to a channel; used for loopback and tests.
impl OutputSink for Sender<Vec<u8>> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        Sender::send(self, bytes.to_vec())
            .map_err(|_| crate::Error::MidiPort("output receiver disconnected".to_string()))
    }
}

#[cfg(feature = "midi-io")]
impl OutputSink for midir::MidiOutputConnection {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        midir::MidiOutputConnection::send(self, bytes)?;
        Ok(())
    }
}

/// Spawns the thread that drains `events` into `sink`.
///
/// Counter increases are reported when idle and at most once a second otherwise.
/// The thread exits once every sender is dropped and the channel is empty.
pub fn spawn_output_thread<S: OutputSink>(
    events: Receiver<RawMidiEvent>,
    mut sink: S,
    stats: Arc<HostStats>,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("retune-output".to_string())
        .spawn(move || {
            let mut reporter = StatsReporter::new();
            let mut last_report = Instant::now();
            loop {
                match events.recv_timeout(IDLE_TIMEOUT) {
                    Ok(event) => {
                        trace!("MIDI out {} {:?}", event, event.to_midi_msg());
                        if let Err(e) = sink.send(event.bytes()) {
                            warn!("Failed to send MIDI message {}: {}", event, e);
                        }
                        if last_report.elapsed() >= REPORT_INTERVAL {
                            reporter.report(&stats);
                            last_report = Instant::now();
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        reporter.report(&stats);
                        last_report = Instant::now();
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        reporter.report(&stats);
                        break;
                    }
                }
            }
            debug!("MIDI output thread stopped");
        })?;
    Ok(handle)
}
