//! Real-time event translator.
//!
//! Called once per block with that block's inbound events. Never allocates, locks,
//! logs or fails: unmapped keys, exhausted polyphony and unmatched note-offs are
//! dropped silently.

use std::sync::Arc;

use retune_midi::{RawMidiEvent, CHANNEL_COUNT, NOTE_OFF, NOTE_ON};

use crate::allocator::ChannelAllocator;
use crate::buffer::EventBuffer;
use crate::table::{TuningEntry, TuningTable};

/// Per-block MIDI processing driven by the host.
///
/// Implementations run on the block thread: no blocking, allocation or I/O.
pub trait BlockProcessor: Send {
    /// Translates one block. `input` is in timestamp order; `output` arrives cleared.
    fn process(&mut self, input: &[RawMidiEvent], output: &mut EventBuffer);

    /// Silences everything still sounding, e.g. before shutdown.
    fn flush(&mut self, _frame_offset: usize, _output: &mut EventBuffer) {}
}

/// Rewrites note messages through a [`TuningTable`] and spreads held notes over the
/// enabled output channels.
#[derive(Debug)]
pub struct Retuner {
    table: Arc<TuningTable>,
    channels: ChannelAllocator,
}

impl Retuner {
    pub fn new(table: Arc<TuningTable>, channels: ChannelAllocator) -> Self {
        Self { table, channels }
    }

    pub fn table(&self) -> &TuningTable {
        &self.table
    }

    pub fn channels(&self) -> &ChannelAllocator {
        &self.channels
    }

    /// Clears `output`, then translates `input` into it in order.
    pub fn process_block(&mut self, input: &[RawMidiEvent], output: &mut EventBuffer) {
        output.clear();
        for event in input {
            self.process_event(event, output);
        }
    }

    #[inline]
    pub fn process_event(&mut self, event: &RawMidiEvent, output: &mut EventBuffer) {
        if event.is_note_on() {
            self.note_on(event, output);
        } else if event.is_note_off() {
            self.note_off(event, output);
        } else {
            output.push(*event);
        }
    }

    fn note_on(&mut self, event: &RawMidiEvent, output: &mut EventBuffer) {
        let TuningEntry::Mapped { output_key, bend } = self.table.entry(event.data[1]) else {
            return;
        };
        // No room for both messages: drop before a channel gets bound
        if output.remaining() < 2 {
            output.mark_dropped(2);
            return;
        }
        let Some(channel) = self.channels.allocate(output_key) else {
            return;
        };
        let offset = event.frame_offset;
        output.push_pair(
            RawMidiEvent::pitch_bend(offset, channel, bend),
            RawMidiEvent::note_on(offset, channel, output_key, event.data[2]),
        );
    }

    /// Also handles note-on with velocity 0, which keeps its status kind.
    fn note_off(&mut self, event: &RawMidiEvent, output: &mut EventBuffer) {
        let Some(output_key) = self.table.entry(event.data[1]).output_key() else {
            return;
        };
        let Some(channel) = self.channels.release_key(output_key) else {
            return;
        };
        let status = if event.status() == NOTE_ON { NOTE_ON } else { NOTE_OFF };
        output.push(RawMidiEvent::new(
            event.frame_offset,
            [status | channel, output_key, event.data[2]],
            3,
        ));
    }

    /// Emits a note-off for every bound channel and frees it.
    pub fn all_notes_off(&mut self, frame_offset: usize, output: &mut EventBuffer) {
        for channel in 0..CHANNEL_COUNT as u8 {
            if let Some(output_key) = self.channels.bound_key(channel) {
                output.push(RawMidiEvent::note_off(frame_offset, channel, output_key, 0));
                self.channels.release(channel);
            }
        }
    }

    /// Forgets all held notes without emitting anything.
    pub fn reset(&mut self) {
        self.channels.reset();
    }
}

impl BlockProcessor for Retuner {
    fn process(&mut self, input: &[RawMidiEvent], output: &mut EventBuffer) {
        self.process_block(input, output);
    }

    fn flush(&mut self, frame_offset: usize, output: &mut EventBuffer) {
        self.all_notes_off(frame_offset, output);
    }
}
