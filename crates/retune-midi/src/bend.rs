//! 14-bit pitch bend values.

use serde::{Deserialize, Serialize};

/// Unsigned 14-bit pitch bend (0..=16383), 8192 = no bend.
///
/// On the wire the value is split into two 7-bit data bytes, LSB first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PitchBend(u16);

impl PitchBend {
    pub const MIN: Self = Self(0);
    pub const CENTER: Self = Self(8192);
    pub const MAX: Self = Self(16383);

    /// Returns `None` for values above 16383.
    #[inline]
    pub fn new(value: u16) -> Option<Self> {
        (value <= Self::MAX.0).then_some(Self(value))
    }

    /// Saturates to `MIN..=MAX`.
    #[inline]
    pub fn from_clamped(value: i32) -> Self {
        Self(value.clamp(Self::MIN.0 as i32, Self::MAX.0 as i32) as u16)
    }

    /// Bend that shifts a note by `cents` on a receiver whose bend half-range is
    /// `range_cents`: `8192 + round(8192 * cents / range_cents)`, saturated.
    #[inline]
    pub fn from_cents(cents: f64, range_cents: f64) -> Self {
        let offset = (8192.0 * cents / range_cents).round();
        Self::from_clamped(Self::CENTER.0 as i32 + offset as i32)
    }

    #[inline]
    pub fn to_cents(self, range_cents: f64) -> f64 {
        (self.0 as f64 - Self::CENTER.0 as f64) * range_cents / 8192.0
    }

    #[inline]
    pub fn from_bytes(lsb: u8, msb: u8) -> Self {
        Self(((msb as u16 & 0x7F) << 7) | (lsb as u16 & 0x7F))
    }

    #[inline]
    pub fn value(self) -> u16 {
        self.0
    }

    /// Low 7 bits (first data byte).
    #[inline]
    pub fn lsb(self) -> u8 {
        (self.0 & 0x7F) as u8
    }

    /// Bits 7-13 (second data byte).
    #[inline]
    pub fn msb(self) -> u8 {
        ((self.0 >> 7) & 0x7F) as u8
    }
}

impl Default for PitchBend {
    fn default() -> Self {
        Self::CENTER
    }
}
