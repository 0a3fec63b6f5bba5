//! MIDI types shared by the retune crates.
//!
//! Everything here is `Copy`, allocation-free and safe to use from the block callback:
//!
//! - [`RawMidiEvent`]: a frame-stamped MIDI 1.0 message of up to three bytes
//! - [`PitchBend`]: a 14-bit bend value with LSB/MSB wire encoding
//! - [`note_to_hz`]: the 12-TET reference grid (A4 = 440 Hz at key 69)

mod bend;
mod event;
mod utils;

pub use bend::PitchBend;
pub use event::{RawMidiEvent, CONTROL_CHANGE, NOTE_OFF, NOTE_ON, PITCH_BEND};
pub use utils::{note_to_hz, CHANNEL_COUNT, KEY_COUNT};

// Structured message types for decoding raw events in diagnostics
pub use midi_msg::{Channel, ChannelVoiceMsg, MidiMsg, ParseError};
