//! Output channel pool.
//!
//! A held note owns its channel because pitch bend is per channel. Free channels wait
//! in a FIFO so the channel released longest ago is handed out next, giving the tail
//! of its previous note the most time to decay.

use core::fmt;

use retune_midi::CHANNEL_COUNT;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Bit `n` enables output channel `n` (0-based).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelMask(u16);

impl ChannelMask {
    pub const ALL: Self = Self(0xFFFF);
    pub const NONE: Self = Self(0);

    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, channel: u8) -> bool {
        channel < CHANNEL_COUNT as u8 && self.0 & (1 << channel) != 0
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Enabled channels in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..CHANNEL_COUNT as u8).filter(move |&channel| self.contains(channel))
    }
}

impl Default for ChannelMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<u16> for ChannelMask {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

impl fmt::Debug for ChannelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelMask({:#06x})", self.0)
    }
}

/// Fixed-capacity channel allocator.
///
/// Every enabled channel is either in the free ring or bound to an output key, never
/// both. All operations are O(1) except the key lookup, which scans 16 slots.
#[derive(Clone, Debug)]
pub struct ChannelAllocator {
    mask: ChannelMask,
    free: [u8; CHANNEL_COUNT],
    head: usize,
    free_len: usize,
    bound: [Option<u8>; CHANNEL_COUNT],
}

impl ChannelAllocator {
    /// Fails when `mask` enables no channel.
    pub fn new(mask: impl Into<ChannelMask>) -> Result<Self> {
        let mut allocator = Self {
            mask: ChannelMask::NONE,
            free: [0; CHANNEL_COUNT],
            head: 0,
            free_len: 0,
            bound: [None; CHANNEL_COUNT],
        };
        allocator.enable(mask)?;
        Ok(allocator)
    }

    /// Restricts the pool to `mask` and frees every channel.
    pub fn enable(&mut self, mask: impl Into<ChannelMask>) -> Result<()> {
        let mask = mask.into();
        if mask.is_empty() {
            return Err(Error::InvalidConfig(
                "channel mask enables no output channel".to_string(),
            ));
        }
        self.mask = mask;
        self.reset();
        Ok(())
    }

    /// All enabled channels free, queued in ascending order.
    pub fn reset(&mut self) {
        self.bound = [None; CHANNEL_COUNT];
        self.head = 0;
        self.free_len = 0;
        for channel in self.mask.iter() {
            self.free[self.free_len] = channel;
            self.free_len += 1;
        }
    }

    /// Takes the least recently freed channel and binds it to `output_key`.
    ///
    /// `None` when every enabled channel is busy.
    #[inline]
    pub fn allocate(&mut self, output_key: u8) -> Option<u8> {
        if self.free_len == 0 {
            return None;
        }
        let channel = self.free[self.head];
        self.head = (self.head + 1) % CHANNEL_COUNT;
        self.free_len -= 1;
        self.bound[channel as usize] = Some(output_key);
        Some(channel)
    }

    /// Returns `channel` to the back of the free queue.
    ///
    /// Returns `false` (and changes nothing) if the channel was not bound.
    #[inline]
    pub fn release(&mut self, channel: u8) -> bool {
        let Some(slot) = self.bound.get_mut(channel as usize) else {
            return false;
        };
        if slot.take().is_none() {
            return false;
        }
        let tail = (self.head + self.free_len) % CHANNEL_COUNT;
        self.free[tail] = channel;
        self.free_len += 1;
        true
    }

    /// Lowest-numbered channel bound to `output_key`.
    #[inline]
    pub fn find_bound(&self, output_key: u8) -> Option<u8> {
        self.bound
            .iter()
            .position(|bound| *bound == Some(output_key))
            .map(|channel| channel as u8)
    }

    /// Releases the lowest-numbered channel bound to `output_key`.
    #[inline]
    pub fn release_key(&mut self, output_key: u8) -> Option<u8> {
        let channel = self.find_bound(output_key)?;
        self.release(channel);
        Some(channel)
    }

    #[inline]
    pub fn bound_key(&self, channel: u8) -> Option<u8> {
        self.bound.get(channel as usize).copied().flatten()
    }

    #[inline]
    pub fn is_active(&self, channel: u8) -> bool {
        self.bound_key(channel).is_some()
    }

    pub fn mask(&self) -> ChannelMask {
        self.mask
    }

    pub fn free_count(&self) -> usize {
        self.free_len
    }

    pub fn active_count(&self) -> usize {
        self.bound.iter().filter(|bound| bound.is_some()).count()
    }

    /// Bound channels with their output keys, ascending by channel.
    pub fn active_channels(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.bound
            .iter()
            .enumerate()
            .filter_map(|(channel, bound)| bound.map(|key| (channel as u8, key)))
    }

    /// Free channels in the order they will be handed out.
    pub fn free_channels(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.free_len).map(move |i| self.free[(self.head + i) % CHANNEL_COUNT])
    }
}
