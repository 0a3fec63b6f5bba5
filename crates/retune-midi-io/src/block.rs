//! Fixed-period block driver.
//!
//! Stands in for an audio callback: once per `block_size / sample_rate` it drains the
//! input queue, runs the processor and hands the output to the output thread. The
//! per-block path touches only pre-allocated buffers and atomics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use retune_core::{BlockProcessor, EventBuffer, RetuneConfig};
use retune_midi::RawMidiEvent;
use tracing::debug;

use crate::port::InputConsumer;
use crate::stats::HostStats;

pub struct BlockDriver<P> {
    processor: P,
    input: InputConsumer,
    output: Sender<RawMidiEvent>,
    input_buffer: Vec<RawMidiEvent>,
    output_buffer: EventBuffer,
    event_capacity: usize,
    block_size: usize,
    sample_rate: f64,
    period: Duration,
    stats: Arc<HostStats>,
}

impl<P: BlockProcessor> BlockDriver<P> {
    pub fn new(
        processor: P,
        input: InputConsumer,
        output: Sender<RawMidiEvent>,
        config: &RetuneConfig,
        stats: Arc<HostStats>,
    ) -> Self {
        Self {
            processor,
            input,
            output,
            input_buffer: Vec::with_capacity(config.event_capacity),
            output_buffer: EventBuffer::with_capacity(config.event_capacity),
            event_capacity: config.event_capacity,
            block_size: config.block_size,
            sample_rate: config.sample_rate,
            period: config.block_period(),
            stats,
        }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Processes the events that arrived before `block_start`.
    pub fn run_block(&mut self, block_start: Instant) {
        self.input.read_block(
            &mut self.input_buffer,
            self.event_capacity,
            block_start,
            self.block_size,
            self.sample_rate,
        );
        self.output_buffer.clear();
        self.processor
            .process(&self.input_buffer, &mut self.output_buffer);
        self.forward();
        self.stats.record_block();
    }

    /// Sends what is still sounding a note-off.
    pub fn flush(&mut self) {
        self.output_buffer.clear();
        self.processor.flush(0, &mut self.output_buffer);
        self.forward();
    }

    fn forward(&mut self) {
        let mut dropped = self.output_buffer.take_dropped();
        for event in self.output_buffer.iter() {
            if self.output.try_send(*event).is_err() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            self.stats.record_dropped_output(dropped);
        }
    }

    /// Runs blocks on a fixed schedule until `stop` is set, then flushes.
    ///
    /// Hands the processor back when done.
    pub fn run(mut self, stop: Arc<AtomicBool>) -> P {
        debug!(
            "Block driver running: {} frames at {} Hz ({:?} per block)",
            self.block_size, self.sample_rate, self.period
        );
        let mut deadline = Instant::now();
        while !stop.load(Ordering::Acquire) {
            let block_start = Instant::now();
            self.run_block(block_start);
            if block_start.elapsed() > self.period {
                self.stats.record_overrun();
            }

            deadline += self.period;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                // Fell behind; restart the schedule instead of bursting
                deadline = now;
            }
        }
        self.flush();
        debug!("Block driver stopped");
        self.processor
    }
}
