//! Host: wires the input queue, block thread and output thread together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::bounded;
use retune_core::{BlockProcessor, RetuneConfig};
use tracing::{info, warn};

use crate::block::BlockDriver;
use crate::output::{spawn_output_thread, OutputSink};
use crate::port::{input_queue, InputProducer};
use crate::stats::{HostStats, StatsSnapshot};
use crate::Result;

/// Output channel slots per block's worth of events.
const OUTPUT_QUEUE_BLOCKS: usize = 4;

/// Running host threads. Dropping it stops them.
pub struct MidiHost {
    stop: Arc<AtomicBool>,
    block_thread: Option<JoinHandle<()>>,
    output_thread: Option<JoinHandle<()>>,
    stats: Arc<HostStats>,
    #[cfg(feature = "midi-io")]
    input: Option<crate::io::MidiInputPort>,
}

impl MidiHost {
    /// Starts the block and output threads around `processor`.
    ///
    /// Inbound MIDI is whatever gets pushed into the returned producer.
    pub fn start<P, S>(
        processor: P,
        sink: S,
        config: &RetuneConfig,
    ) -> Result<(Self, InputProducer)>
    where
        P: BlockProcessor + 'static,
        S: OutputSink,
    {
        config.validate()?;

        let stats = Arc::new(HostStats::new());
        let (producer, consumer) = input_queue(config.queue_capacity, stats.clone());
        let (event_tx, event_rx) = bounded(config.event_capacity * OUTPUT_QUEUE_BLOCKS);
        let stop = Arc::new(AtomicBool::new(false));

        let output_thread = spawn_output_thread(event_rx, sink, stats.clone())?;
        let driver = BlockDriver::new(processor, consumer, event_tx, config, stats.clone());
        let stop_flag = stop.clone();
        let block_thread = thread::Builder::new()
            .name("retune-block".to_string())
            .spawn(move || {
                driver.run(stop_flag);
            })?;

        info!(
            "MIDI host started: {} frames per block at {} Hz",
            config.block_size, config.sample_rate
        );

        let host = Self {
            stop,
            block_thread: Some(block_thread),
            output_thread: Some(output_thread),
            stats,
            #[cfg(feature = "midi-io")]
            input: None,
        };
        Ok((host, producer))
    }

    /// Opens the configured MIDI ports and starts processing.
    #[cfg(feature = "midi-io")]
    pub fn open<P>(processor: P, config: &RetuneConfig) -> Result<Self>
    where
        P: BlockProcessor + 'static,
    {
        let output = crate::io::open_output(
            &config.client_name,
            &config.output_port,
            config.connect_output.as_deref(),
        )?;
        let (mut host, producer) = Self::start(processor, output, config)?;
        let input = crate::io::open_input(
            &config.client_name,
            &config.input_port,
            config.connect_input.as_deref(),
            producer,
        )?;
        info!("Listening on MIDI input '{}'", input.name());
        host.input = Some(input);
        Ok(host)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::Acquire)
    }

    /// Stops input, flushes held notes and joins both threads.
    pub fn shutdown(mut self) -> StatsSnapshot {
        self.stop_threads();
        self.stats.snapshot()
    }

    fn stop_threads(&mut self) {
        #[cfg(feature = "midi-io")]
        drop(self.input.take());

        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.block_thread.take() {
            if handle.join().is_err() {
                warn!("Block thread panicked");
            }
        }
        // The block thread dropped its sender; the output thread drains and exits
        if let Some(handle) = self.output_thread.take() {
            if handle.join().is_err() {
                warn!("MIDI output thread panicked");
            }
        }
    }
}

impl Drop for MidiHost {
    fn drop(&mut self) {
        self.stop_threads();
    }
}

impl std::fmt::Debug for MidiHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiHost")
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish()
    }
}
