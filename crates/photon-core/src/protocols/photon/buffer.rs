//! Reassembly of fragmented reliable messages.
//!
//! Fragments are grouped by sequence number until every piece has arrived,
//! then concatenated in fragment-number order into a synthesized SendReliable
//! command. Incomplete sequences live in a bounded cache ordered by last use;
//! when it is full the least recently touched sequence is dropped. Each
//! sequence holds at most the `total_length` its first fragment declared,
//! itself capped at [`layout::MAX_REASSEMBLED_LENGTH`], so lossy or hostile
//! traffic cannot grow memory without bound.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use tracing::debug;

use super::command::RawCommand;
use super::fragment::ReliableFragment;
use super::layout;

#[derive(Debug, Clone, Default)]
struct FragmentBufferEntry {
    fragments_needed: usize,
    total_length: usize,
    stored: usize,
    fragments: BTreeMap<usize, Vec<u8>>,
}

impl FragmentBufferEntry {
    fn new(slot: &FragmentSlot) -> Self {
        Self {
            fragments_needed: slot.count,
            total_length: slot.total_length,
            stored: 0,
            fragments: BTreeMap::new(),
        }
    }

    /// Whether `len` bytes at `number` fit the declared shape of the message.
    fn accepts(&self, number: usize, len: usize) -> bool {
        let replaced = self.fragments.get(&number).map_or(0, Vec::len);
        number < self.fragments_needed && self.stored - replaced + len <= self.total_length
    }

    fn insert(&mut self, number: usize, data: Vec<u8>) {
        self.stored += data.len();
        if let Some(old) = self.fragments.insert(number, data) {
            self.stored -= old.len();
        }
    }

    fn is_complete(&self) -> bool {
        self.fragments.len() == self.fragments_needed
    }

    fn assemble(self) -> Vec<u8> {
        let total = self.fragments.values().map(Vec::len).sum();
        let mut data = Vec::with_capacity(total);
        for fragment in self.fragments.into_values() {
            data.extend_from_slice(&fragment);
        }
        data
    }
}

/// Per-stream fragment reassembly cache.
///
/// Not meant to be shared between capture streams; keep one per connection.
///
/// # Examples
/// ```
/// use photon_core::{FragmentBuffer, ReliableFragment};
///
/// let mut buffer = FragmentBuffer::new();
/// let first = ReliableFragment {
///     sequence_number: 5,
///     fragment_count: 2,
///     fragment_number: 0,
///     total_length: 2,
///     fragment_offset: 0,
///     data: vec![0xca],
/// };
/// let second = ReliableFragment { fragment_number: 1, fragment_offset: 1, data: vec![0xfe], ..first.clone() };
///
/// assert!(buffer.offer(first).is_none());
/// let command = buffer.offer(second).unwrap();
/// assert_eq!(command.data, vec![0xca, 0xfe]);
/// assert!(!buffer.contains(5));
/// ```
#[derive(Debug, Clone)]
pub struct FragmentBuffer {
    entries: IndexMap<i32, FragmentBufferEntry>,
    capacity: usize,
    evicted: u64,
    rejected: u64,
}

impl FragmentBuffer {
    pub fn new() -> Self {
        Self::with_capacity(layout::DEFAULT_FRAGMENT_CAPACITY)
    }

    /// A cache holding at most `capacity` incomplete sequences (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity: capacity.max(1),
            evicted: 0,
            rejected: 0,
        }
    }

    /// Add a fragment, returning the assembled command once its sequence is
    /// complete.
    ///
    /// A repeated fragment number replaces the earlier data. Fragments are
    /// dropped when they can never complete: an empty payload, a non-positive
    /// count, a number outside `0..fragment_count`, more fragments than
    /// declared bytes, a `total_length` above
    /// [`layout::MAX_REASSEMBLED_LENGTH`], or data that would overflow the
    /// `total_length` fixed by the first fragment of the sequence.
    pub fn offer(&mut self, fragment: ReliableFragment) -> Option<RawCommand> {
        let sequence = fragment.sequence_number;
        let len = fragment.data.len();
        let slot = fragment_slot(&fragment).filter(|slot| {
            self.entries
                .get(&sequence)
                .is_none_or(|entry| entry.accepts(slot.number, len))
        });
        let Some(slot) = slot else {
            self.rejected += 1;
            debug!(
                sequence = fragment.sequence_number,
                count = fragment.fragment_count,
                number = fragment.fragment_number,
                total_length = fragment.total_length,
                bytes = len,
                "dropping fragment outside its declared range"
            );
            return None;
        };

        let mut entry = match self.entries.shift_remove(&sequence) {
            Some(entry) => entry,
            None => FragmentBufferEntry::new(&slot),
        };
        entry.insert(slot.number, fragment.data);

        if entry.is_complete() {
            return Some(RawCommand::reliable(sequence, entry.assemble()));
        }

        if self.entries.len() >= self.capacity {
            if let Some((oldest, _)) = self.entries.shift_remove_index(0) {
                self.evicted += 1;
                debug!(sequence = oldest, "evicting incomplete fragment sequence");
            }
        }
        self.entries.insert(sequence, entry);
        None
    }

    pub fn contains(&self, sequence_number: i32) -> bool {
        self.entries.contains_key(&sequence_number)
    }

    /// Number of incomplete sequences currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sequences dropped to make room for newer ones.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Fragments dropped because they could never complete.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

impl Default for FragmentBuffer {
    fn default() -> Self {
        Self::new()
    }
}

struct FragmentSlot {
    count: usize,
    number: usize,
    total_length: usize,
}

fn fragment_slot(fragment: &ReliableFragment) -> Option<FragmentSlot> {
    let count = usize::try_from(fragment.fragment_count).ok()?;
    let number = usize::try_from(fragment.fragment_number).ok()?;
    let total_length = usize::try_from(fragment.total_length).ok()?;
    let valid = count > 0
        && number < count
        && count <= total_length
        && total_length <= layout::MAX_REASSEMBLED_LENGTH
        && !fragment.data.is_empty()
        && fragment.data.len() <= total_length;
    valid.then_some(FragmentSlot {
        count,
        number,
        total_length,
    })
}
