//! Pitch arithmetic shared by the scale model and the table builder.

use retune_midi::{note_to_hz, KEY_COUNT};

pub const CENTS_PER_OCTAVE: f64 = 1200.0;

/// Relative slack when comparing a target against the 12-TET grid, so a target that
/// equals a grid pitch up to float rounding resolves to that key.
pub const KEY_TOLERANCE: f64 = 1e-9;

/// Floor division and floor modulo (remainder takes the divisor's sign).
///
/// `-1 / 12` must be `(-1, 11)`, not the truncating `(0, -1)`.
#[inline]
pub fn floor_div_mod(value: i32, divisor: i32) -> (i32, i32) {
    debug_assert!(divisor > 0, "floor_div_mod needs a positive divisor");
    (value.div_euclid(divisor), value.rem_euclid(divisor))
}

#[inline]
pub fn ratio_to_cents(ratio: f64) -> f64 {
    CENTS_PER_OCTAVE * ratio.log2()
}

#[inline]
pub fn cents_to_ratio(cents: f64) -> f64 {
    (cents / CENTS_PER_OCTAVE).exp2()
}

/// Frequencies of the 128 keys of the 12-TET receiver, ascending.
///
/// Independent of the custom scale: this is the grid the output notes are actually
/// sounded on before bend is applied.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferencePitches {
    freqs: [f64; KEY_COUNT],
}

impl ReferencePitches {
    /// A4 = 440 Hz at key 69.
    pub fn equal_tempered() -> Self {
        Self {
            freqs: std::array::from_fn(|key| note_to_hz(key as f64)),
        }
    }

    #[inline]
    pub fn freq(&self, key: u8) -> f64 {
        self.freqs[key as usize & 0x7F]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.freqs
    }

    #[inline]
    pub fn lowest(&self) -> f64 {
        self.freqs[0]
    }

    #[inline]
    pub fn highest(&self) -> f64 {
        self.freqs[KEY_COUNT - 1]
    }

    /// Greatest key whose frequency does not exceed `target_hz`.
    ///
    /// `None` when the target lies outside the grid: such pitches cannot be reached
    /// with an upward bend from any key.
    pub fn find_key(&self, target_hz: f64) -> Option<u8> {
        if !target_hz.is_finite() || !self.in_reach(target_hz) {
            return None;
        }
        let limit = target_hz * (1.0 + KEY_TOLERANCE);
        // Binary search over the ascending grid
        let count = self.freqs.partition_point(|&freq| freq <= limit);
        count.checked_sub(1).map(|key| key as u8)
    }

    #[inline]
    fn in_reach(&self, target_hz: f64) -> bool {
        target_hz * (1.0 + KEY_TOLERANCE) >= self.lowest()
            && target_hz * (1.0 - KEY_TOLERANCE) <= self.highest()
    }
}

impl Default for ReferencePitches {
    fn default() -> Self {
        Self::equal_tempered()
    }
}
