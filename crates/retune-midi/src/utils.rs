//! MIDI utility functions

/// Number of MIDI keys (0-127).
pub const KEY_COUNT: usize = 128;

/// Number of MIDI 1.0 channels per port.
pub const CHANNEL_COUNT: usize = 16;

/// 12-TET frequency of a (possibly fractional) MIDI key, A4 = 440 Hz at key 69.
#[inline]
pub fn note_to_hz(note: f64) -> f64 {
    440.0 * ((note - 69.0) / 12.0).exp2()
}
