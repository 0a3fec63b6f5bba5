//! Lock-free input queue between the MIDI callback and the block thread.
//!
//! - Producer: midir callback thread, stamps each message with its arrival time
//! - Consumer: block thread, converts arrival times to frame offsets

use std::sync::Arc;
use std::time::Instant;

use retune_midi::RawMidiEvent;
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};

use crate::stats::HostStats;

/// Creates a queue holding up to `capacity` messages.
pub fn input_queue(capacity: usize, stats: Arc<HostStats>) -> (InputProducer, InputConsumer) {
    let (producer, consumer) = HeapRb::<(Instant, RawMidiEvent)>::new(capacity).split();
    (
        InputProducer { producer, stats },
        InputConsumer { consumer },
    )
}

/// Single producer end. Owned by whichever thread delivers inbound MIDI.
pub struct InputProducer {
    producer: HeapProd<(Instant, RawMidiEvent)>,
    stats: Arc<HostStats>,
}

impl InputProducer {
    /// Queues a raw message that arrived at `at`.
    ///
    /// Messages longer than three bytes (SysEx) and messages that do not fit are
    /// counted as dropped.
    #[inline]
    pub fn push_bytes(&mut self, bytes: &[u8], at: Instant) -> bool {
        match RawMidiEvent::from_slice(0, bytes) {
            Some(event) => self.push(event, at),
            None => {
                self.stats.record_dropped_input(1);
                false
            }
        }
    }

    #[inline]
    pub fn push(&mut self, event: RawMidiEvent, at: Instant) -> bool {
        if self.producer.try_push((at, event)).is_err() {
            self.stats.record_dropped_input(1);
            return false;
        }
        true
    }
}

/// Single consumer end, owned by the block thread.
pub struct InputConsumer {
    consumer: HeapCons<(Instant, RawMidiEvent)>,
}

impl InputConsumer {
    /// Moves up to `max_events` queued messages into `buffer`.
    ///
    /// An event that arrived `d` before `block_start` lands `d * sample_rate` frames
    /// before the end of the block, clamped to `[0, nframes)`. Messages beyond
    /// `max_events` stay queued for the next block. Returns the number read.
    pub fn read_block(
        &mut self,
        buffer: &mut Vec<RawMidiEvent>,
        max_events: usize,
        block_start: Instant,
        nframes: usize,
        sample_rate: f64,
    ) -> usize {
        buffer.clear();
        while buffer.len() < max_events {
            let Some((arrived, mut event)) = self.consumer.try_pop() else {
                break;
            };
            let delta = block_start.saturating_duration_since(arrived);
            let samples_ago = (delta.as_secs_f64() * sample_rate) as usize;
            event.frame_offset = nframes
                .saturating_sub(samples_ago)
                .min(nframes.saturating_sub(1));
            buffer.push(event);
        }
        buffer.len()
    }

    pub fn pending(&self) -> usize {
        self.consumer.occupied_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_push_and_read_preserves_order() {
        let stats = Arc::new(HostStats::new());
        let (mut producer, mut consumer) = input_queue(8, stats.clone());
        let now = Instant::now();
        assert!(producer.push_bytes(&[0x90, 60, 100], now));
        assert!(producer.push_bytes(&[0xB0, 7, 64], now));

        let mut buffer = Vec::with_capacity(8);
        assert_eq!(consumer.read_block(&mut buffer, 8, now, 256, 48000.0), 2);
        assert_eq!(buffer[0].bytes(), &[0x90, 60, 100]);
        assert_eq!(buffer[1].bytes(), &[0xB0, 7, 64]);
        assert_eq!(stats.snapshot().dropped_input, 0);
    }

    #[test]
    fn test_frame_offsets() {
        let stats = Arc::new(HostStats::new());
        let (mut producer, mut consumer) = input_queue(8, stats);
        let block_start = Instant::now() + Duration::from_secs(1);
        // 1 ms = 48 frames before the block start
        producer.push_bytes(&[0x90, 60, 100], block_start - Duration::from_millis(1));
        // Long ago: clamps to frame 0
        producer.push_bytes(&[0x80, 60, 0], block_start - Duration::from_millis(500));
        // At the block start: clamps to the last frame
        producer.push_bytes(&[0xB0, 1, 1], block_start);

        let mut buffer = Vec::with_capacity(8);
        consumer.read_block(&mut buffer, 8, block_start, 256, 48000.0);
        assert_eq!(buffer[0].frame_offset, 208);
        assert_eq!(buffer[1].frame_offset, 0);
        assert_eq!(buffer[2].frame_offset, 255);
    }

    #[test]
    fn test_sysex_and_overflow_counted() {
        let stats = Arc::new(HostStats::new());
        let (mut producer, _consumer) = input_queue(2, stats.clone());
        let now = Instant::now();
        assert!(!producer.push_bytes(&[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7], now));
        assert!(!producer.push_bytes(&[], now));
        assert!(producer.push_bytes(&[0xF8], now));
        assert!(producer.push_bytes(&[0xF8], now));
        assert!(!producer.push_bytes(&[0xF8], now));
        assert_eq!(stats.snapshot().dropped_input, 3);
    }

    #[test]
    fn test_read_block_respects_capacity() {
        let stats = Arc::new(HostStats::new());
        let (mut producer, mut consumer) = input_queue(8, stats);
        let now = Instant::now();
        for note in 0..5 {
            producer.push_bytes(&[0x90, note, 100], now);
        }
        let mut buffer = Vec::with_capacity(3);
        assert_eq!(consumer.read_block(&mut buffer, 3, now, 64, 48000.0), 3);
        assert_eq!(consumer.pending(), 2);
        assert_eq!(consumer.read_block(&mut buffer, 3, now, 64, 48000.0), 2);
        assert_eq!(buffer[0].data[1], 3);
    }
}
