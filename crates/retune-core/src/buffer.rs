//! Fixed-capacity per-block event buffer.

use retune_midi::RawMidiEvent;

/// Outbound events for one block.
///
/// Storage is reserved up front; a full buffer drops further writes and counts them
/// instead of growing.
#[derive(Clone, Debug)]
pub struct EventBuffer {
    events: Vec<RawMidiEvent>,
    capacity: usize,
    dropped: u64,
}

impl EventBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Empties the buffer for the next block. The drop count is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    #[inline]
    pub fn push(&mut self, event: RawMidiEvent) -> bool {
        if self.events.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.events.push(event);
        true
    }

    /// Writes both events or neither.
    #[inline]
    pub fn push_pair(&mut self, first: RawMidiEvent, second: RawMidiEvent) -> bool {
        if self.remaining() < 2 {
            self.dropped += 2;
            return false;
        }
        self.events.push(first);
        self.events.push(second);
        true
    }

    /// Counts events discarded by the caller without being offered.
    #[inline]
    pub fn mark_dropped(&mut self, count: u64) {
        self.dropped += count;
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.events.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[RawMidiEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawMidiEvent> {
        self.events.iter()
    }

    /// Events dropped since the last [`take_dropped`](Self::take_dropped).
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[inline]
    pub fn take_dropped(&mut self) -> u64 {
        std::mem::take(&mut self.dropped)
    }
}

impl<'a> IntoIterator for &'a EventBuffer {
    type Item = &'a RawMidiEvent;
    type IntoIter = std::slice::Iter<'a, RawMidiEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
