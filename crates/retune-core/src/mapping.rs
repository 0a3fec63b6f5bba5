//! Keyboard mapping model: how physical keys repeat and which of them sound.

use serde::{Deserialize, Serialize};

use crate::math::floor_div_mod;
use crate::{Error, Result};

/// Keyboard mapping in the shape of a Scala `.kbm` file.
///
/// Physical keys repeat every `period_size` keys starting at `middle_key`. Each
/// position within that pattern either names an offset into scale space or is
/// silent (`None`). One full pattern advances `formal_octave_size` scale steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyboardMapping {
    pub period_size: usize,
    pub first_key: u8,
    pub last_key: u8,
    pub middle_key: u8,
    pub reference_key: u8,
    pub reference_freq_hz: f64,
    pub formal_octave_size: usize,
    /// One entry per pattern position, `None` = unmapped key.
    pub offsets: Vec<Option<i32>>,
}

impl KeyboardMapping {
    /// Every key sounds, one scale step per key, key 69 tuned to 440 Hz.
    pub fn linear(scale_len: usize) -> Self {
        let period_size = scale_len.max(1);
        Self {
            period_size,
            first_key: 0,
            last_key: 127,
            middle_key: 60,
            reference_key: 69,
            reference_freq_hz: 440.0,
            formal_octave_size: period_size,
            offsets: (0..period_size as i32).map(Some).collect(),
        }
    }

    /// Re-anchors the tuning to `freq_hz` at `key`.
    pub fn with_reference(mut self, key: u8, freq_hz: f64) -> Self {
        self.reference_key = key;
        self.reference_freq_hz = freq_hz;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.period_size == 0 || self.period_size > 128 {
            return Err(Error::InvalidMapping(format!(
                "mapping size {} out of range (1-128)",
                self.period_size
            )));
        }
        if self.offsets.len() != self.period_size {
            return Err(Error::InvalidMapping(format!(
                "mapping size is {} but {} entries are listed",
                self.period_size,
                self.offsets.len()
            )));
        }
        for (name, key) in [
            ("first key", self.first_key),
            ("last key", self.last_key),
            ("middle key", self.middle_key),
            ("reference key", self.reference_key),
        ] {
            if key > 127 {
                return Err(Error::InvalidMapping(format!("{} {} out of range (0-127)", name, key)));
            }
        }
        if self.first_key > self.last_key {
            return Err(Error::InvalidMapping(format!(
                "first key {} is above last key {}",
                self.first_key, self.last_key
            )));
        }
        if !(self.reference_freq_hz.is_finite() && self.reference_freq_hz > 0.0) {
            return Err(Error::InvalidMapping(format!(
                "reference frequency must be positive, got {} Hz",
                self.reference_freq_hz
            )));
        }
        if self.formal_octave_size > 128 {
            return Err(Error::InvalidMapping(format!(
                "formal octave size {} out of range (0-128)",
                self.formal_octave_size
            )));
        }
        if let Some(offset) = self.offsets.iter().flatten().find(|o| !(0..=127).contains(*o)) {
            return Err(Error::InvalidMapping(format!(
                "mapping entry {} out of range (0-127)",
                offset
            )));
        }
        Ok(())
    }

    /// Number of pattern positions that sound.
    pub fn mapped_positions(&self) -> usize {
        self.offsets.iter().filter(|o| o.is_some()).count()
    }

    /// Resolves a physical key to its key in scale space.
    ///
    /// `first_key..=last_key` bounds the physical input key, not the mapped result.
    /// `None` for keys outside that range, silent pattern positions and results
    /// outside 0-127.
    pub fn map_key(&self, key: u8) -> Option<u8> {
        if key < self.first_key || key > self.last_key {
            return None;
        }
        let (periods, position) =
            floor_div_mod(key as i32 - self.middle_key as i32, self.period_size as i32);
        let offset = self.offsets.get(position as usize).copied().flatten()?;
        let mapped =
            self.middle_key as i32 + periods * self.formal_octave_size as i32 + offset;
        u8::try_from(mapped).ok().filter(|key| *key <= 127)
    }
}

impl Default for KeyboardMapping {
    fn default() -> Self {
        Self::linear(12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Seven-note scale on the white keys, black keys silent.
    fn white_keys() -> KeyboardMapping {
        KeyboardMapping {
            period_size: 12,
            formal_octave_size: 7,
            offsets: vec![
                Some(0),
                None,
                Some(1),
                None,
                Some(2),
                Some(3),
                None,
                Some(4),
                None,
                Some(5),
                None,
                Some(6),
            ],
            ..KeyboardMapping::default()
        }
    }

    #[test]
    fn test_linear_is_identity() {
        let mapping = KeyboardMapping::linear(12);
        mapping.validate().unwrap();
        for key in 0..128u8 {
            assert_eq!(mapping.map_key(key), Some(key));
        }

        let mapping = KeyboardMapping::linear(3);
        for key in 0..128u8 {
            assert_eq!(mapping.map_key(key), Some(key));
        }
    }

    #[test]
    fn test_white_keys_above_middle() {
        let mapping = white_keys();
        mapping.validate().unwrap();
        assert_eq!(mapping.map_key(60), Some(60));
        assert_eq!(mapping.map_key(61), None);
        assert_eq!(mapping.map_key(62), Some(61));
        assert_eq!(mapping.map_key(71), Some(66));
        assert_eq!(mapping.map_key(72), Some(67));
    }

    #[test]
    fn test_white_keys_below_middle_use_floor_division() {
        let mapping = white_keys();
        // B3 is the last position of the previous pattern
        assert_eq!(mapping.map_key(59), Some(59));
        assert_eq!(mapping.map_key(58), None);
        assert_eq!(mapping.map_key(48), Some(53));
        assert_eq!(mapping.map_key(47), Some(52));
        assert_eq!(mapping.map_key(0), Some(60 - 5 * 7));
    }

    #[test]
    fn test_key_range_bounds_physical_key() {
        let mapping = KeyboardMapping {
            first_key: 55,
            last_key: 66,
            ..white_keys()
        };
        // B4 would land on 66 but the key itself is above the range
        assert_eq!(mapping.map_key(71), None);
        // G3 is inside the range and lands on 57, also inside
        assert_eq!(mapping.map_key(55), Some(57));
        assert_eq!(mapping.map_key(65), Some(63));
        assert_eq!(mapping.map_key(54), None);
    }

    #[test]
    fn test_key_range_limits() {
        let mapping = KeyboardMapping {
            first_key: 36,
            last_key: 96,
            ..KeyboardMapping::default()
        };
        assert_eq!(mapping.map_key(35), None);
        assert_eq!(mapping.map_key(36), Some(36));
        assert_eq!(mapping.map_key(96), Some(96));
        assert_eq!(mapping.map_key(97), None);
    }

    #[test]
    fn test_mapped_key_leaving_midi_range() {
        // Two scale steps per physical key pushes the top keys past 127
        let mapping = KeyboardMapping {
            period_size: 1,
            formal_octave_size: 2,
            offsets: vec![Some(0)],
            ..KeyboardMapping::default()
        };
        assert_eq!(mapping.map_key(60), Some(60));
        assert_eq!(mapping.map_key(93), Some(126));
        assert_eq!(mapping.map_key(94), None);
        assert_eq!(mapping.map_key(30), Some(0));
        assert_eq!(mapping.map_key(29), None);
    }

    #[test]
    fn test_validation_errors() {
        let bad_size = KeyboardMapping {
            period_size: 0,
            offsets: vec![],
            ..KeyboardMapping::default()
        };
        assert!(bad_size.validate().is_err());

        let count_mismatch = KeyboardMapping {
            offsets: vec![Some(0); 11],
            ..KeyboardMapping::default()
        };
        assert!(count_mismatch.validate().is_err());

        let reversed = KeyboardMapping {
            first_key: 100,
            last_key: 10,
            ..KeyboardMapping::default()
        };
        assert!(reversed.validate().is_err());

        let bad_freq = KeyboardMapping::default().with_reference(69, 0.0);
        assert!(bad_freq.validate().is_err());

        let mut bad_offset = KeyboardMapping::default();
        bad_offset.offsets[3] = Some(200);
        assert!(bad_offset.validate().is_err());

        let bad_key = KeyboardMapping {
            last_key: 128,
            ..KeyboardMapping::default()
        };
        assert!(bad_key.validate().is_err());
    }
}
