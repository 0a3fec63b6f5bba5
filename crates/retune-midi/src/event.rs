//! Frame-stamped raw MIDI events.

use core::fmt;

use crate::PitchBend;
use midi_msg::{MidiMsg, ParseError};

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const PITCH_BEND: u8 = 0xE0;

/// Raw MIDI 1.0 message of one to three bytes with a frame offset.
///
/// The retuner reads and writes the bytes verbatim, so messages it does not
/// understand round-trip unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawMidiEvent {
    /// Offset within the current block (0 = first frame).
    pub frame_offset: usize,
    pub data: [u8; 3],
    /// Valid bytes in `data` (1-3).
    pub len: u8,
}

impl RawMidiEvent {
    #[inline]
    pub fn new(frame_offset: usize, data: [u8; 3], len: u8) -> Self {
        Self {
            frame_offset,
            data,
            len,
        }
    }

    /// Copies a message of one to three bytes. Longer messages (SysEx) do not fit.
    #[inline]
    pub fn from_slice(frame_offset: usize, bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > 3 {
            return None;
        }
        let mut data = [0u8; 3];
        data[..bytes.len()].copy_from_slice(bytes);
        Some(Self::new(frame_offset, data, bytes.len() as u8))
    }

    #[inline]
    pub fn note_on(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self::channel_message(frame_offset, NOTE_ON, channel, note, velocity)
    }

    #[inline]
    pub fn note_off(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self::channel_message(frame_offset, NOTE_OFF, channel, note, velocity)
    }

    #[inline]
    pub fn control_change(frame_offset: usize, channel: u8, cc: u8, value: u8) -> Self {
        Self::channel_message(frame_offset, CONTROL_CHANGE, channel, cc, value)
    }

    #[inline]
    pub fn pitch_bend(frame_offset: usize, channel: u8, bend: PitchBend) -> Self {
        Self::channel_message(frame_offset, PITCH_BEND, channel, bend.lsb(), bend.msb())
    }

    #[inline]
    fn channel_message(frame_offset: usize, status: u8, channel: u8, data1: u8, data2: u8) -> Self {
        Self {
            frame_offset,
            data: [status | (channel & 0x0F), data1 & 0x7F, data2 & 0x7F],
            len: 3,
        }
    }

    /// High nibble of the status byte.
    #[inline]
    pub fn status(&self) -> u8 {
        self.data[0] & 0xF0
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        self.data[0] & 0x0F
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data[..(self.len as usize).min(3)]
    }

    /// Three-byte note-on with non-zero velocity.
    #[inline]
    pub fn is_note_on(&self) -> bool {
        self.len == 3 && self.status() == NOTE_ON && self.data[2] > 0
    }

    /// Three-byte note-off, or note-on with zero velocity.
    #[inline]
    pub fn is_note_off(&self) -> bool {
        self.len == 3
            && (self.status() == NOTE_OFF || (self.status() == NOTE_ON && self.data[2] == 0))
    }

    #[inline]
    pub fn note(&self) -> Option<u8> {
        (self.is_note_on() || self.is_note_off()).then_some(self.data[1])
    }

    /// Decodes the bytes into a structured message. Allocates; not for the block path.
    pub fn to_midi_msg(&self) -> Result<MidiMsg, ParseError> {
        MidiMsg::from_midi(self.bytes()).map(|(msg, _len)| msg)
    }
}

impl fmt::Display for RawMidiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.frame_offset)?;
        for byte in self.bytes() {
            write!(f, " {:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use midi_msg::{Channel, ChannelVoiceMsg};

    #[test]
    fn test_note_on() {
        let event = RawMidiEvent::note_on(100, 3, 60, 100);
        assert_eq!(event.data, [0x93, 60, 100]);
        assert!(event.is_note_on());
        assert!(!event.is_note_off());
        assert_eq!(event.note(), Some(60));
        assert_eq!(event.channel(), 3);
        assert_eq!(event.frame_offset, 100);
    }

    #[test]
    fn test_note_on_zero_velocity_is_note_off() {
        let event = RawMidiEvent::note_on(0, 0, 60, 0);
        assert!(event.is_note_off());
        assert!(!event.is_note_on());
    }

    #[test]
    fn test_pitch_bend_wire_format() {
        let event = RawMidiEvent::pitch_bend(7, 15, PitchBend::from_clamped(8272));
        assert_eq!(event.data, [0xEF, 80, 64]);
        assert_eq!(event.frame_offset, 7);
    }

    #[test]
    fn test_channel_and_data_masking() {
        let event = RawMidiEvent::note_off(0, 0x1F, 0xFF, 0x80);
        assert_eq!(event.data, [0x8F, 0x7F, 0x00]);
    }

    #[test]
    fn test_from_slice() {
        let clock = RawMidiEvent::from_slice(4, &[0xF8]).unwrap();
        assert_eq!(clock.bytes(), &[0xF8]);
        assert_eq!(clock.len, 1);
        assert!(clock.note().is_none());

        assert!(RawMidiEvent::from_slice(0, &[]).is_none());
        assert!(RawMidiEvent::from_slice(0, &[0xF0, 1, 2, 0xF7]).is_none());
    }

    #[test]
    fn test_short_note_message_is_not_a_note() {
        let event = RawMidiEvent::from_slice(0, &[0x90, 60]).unwrap();
        assert!(!event.is_note_on());
        assert!(!event.is_note_off());
    }

    #[test]
    fn test_to_midi_msg() {
        let event = RawMidiEvent::control_change(0, 2, 7, 127);
        match event.to_midi_msg().unwrap() {
            MidiMsg::ChannelVoice { channel, msg } => {
                assert_eq!(channel, Channel::Ch3);
                assert!(matches!(msg, ChannelVoiceMsg::ControlChange { .. }));
            }
            other => panic!("Expected ChannelVoice, got {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        let event = RawMidiEvent::note_on(12, 0, 0x3c, 0x64);
        assert_eq!(event.to_string(), "@12 90 3c 64");
    }
}
