//! Table of recorded traces, one entry per trace name.

use tracing::{debug, info};

use crate::collections::ShrinkingVec;
use crate::config::DEFAULT_TABLE_CAPACITY;
use crate::trace_entry::TraceEntry;
use crate::types::{EntryId, FaceId, Interest, MatchMode, PitToken, TimerId};

const COMPONENT: &str = "trace_table";

/// Insertion-ordered trace entries keyed by trace name.
///
/// Owned by one strategy instance. Not `Clone`: entries hold host handles.
#[derive(Debug)]
pub struct TraceTable {
    entries: ShrinkingVec<TraceEntry>,
    next_id: u64,
}

impl Default for TraceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceTable {
    /// Empty table with the default shrink threshold.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TABLE_CAPACITY)
    }

    /// Empty table whose storage shrinks back toward `capacity` after removals.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: ShrinkingVec::with_max_capacity(capacity),
            next_id: 0,
        }
    }

    /// First entry, in insertion order, that matches `interest` under `mode`.
    pub fn match_interest(&self, interest: &Interest, mode: MatchMode) -> Option<&TraceEntry> {
        self.entries.iter().find(|e| e.matches(interest, mode))
    }

    /// Entry recorded for the interest's trace name.
    ///
    /// # Panics
    ///
    /// Panics if `interest` carries no trace name.
    pub fn find(&self, interest: &Interest) -> Option<&TraceEntry> {
        self.position(interest).and_then(|i| self.entries.get(i))
    }

    /// Mutable [`find`](Self::find).
    ///
    /// # Panics
    ///
    /// Panics if `interest` carries no trace name.
    pub fn find_mut(&mut self, interest: &Interest) -> Option<&mut TraceEntry> {
        self.position(interest).and_then(|i| self.entries.get_mut(i))
    }

    fn position(&self, interest: &Interest) -> Option<usize> {
        assert!(
            interest.has_trace_name(),
            "trace table lookup requires an interest with a trace name"
        );
        self.entries.position(|e| e.is_equal(interest))
    }

    /// Record `interest` as seen on `face` under pending record `pit`.
    ///
    /// Returns the entry for the interest's trace name and whether it was
    /// created by this call. An existing entry is returned untouched.
    ///
    /// # Panics
    ///
    /// Panics if `interest` carries no trace name.
    pub fn insert(
        &mut self,
        face: FaceId,
        interest: &Interest,
        pit: PitToken,
    ) -> (&mut TraceEntry, bool) {
        if let Some(index) = self.position(interest) {
            return (&mut self.entries[index], false);
        }

        let id = EntryId(self.next_id);
        self.next_id += 1;
        let entry = TraceEntry::new(id, face, interest.clone(), pit);
        info!(
            component = COMPONENT,
            entry = id.0,
            trace_name = %entry.trace_name(),
            face = %face,
            pit = %pit,
            "trace entry inserted"
        );
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        (&mut self.entries[last], true)
    }

    /// Remove the entry with identity `id`. Absent entries are ignored.
    pub fn erase(&mut self, id: EntryId) -> Option<TraceEntry> {
        let index = self.entries.position(|e| e.id() == id)?;
        let entry = self.entries.remove(index)?;
        debug!(
            component = COMPONENT,
            entry = id.0,
            trace_name = %entry.trace_name(),
            remaining = self.entries.len(),
            "trace entry erased"
        );
        Some(entry)
    }

    /// Entry with identity `id`, if still present.
    pub fn get(&self, id: EntryId) -> Option<&TraceEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Mutable [`get`](Self::get).
    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut TraceEntry> {
        let index = self.entries.position(|e| e.id() == id)?;
        self.entries.get_mut(index)
    }

    /// Entries bound to the pending record `pit`.
    pub fn ids_for_pit(&self, pit: PitToken) -> Vec<EntryId> {
        self.entries
            .iter()
            .filter(|e| e.pit() == pit)
            .map(TraceEntry::id)
            .collect()
    }

    /// Entry whose lifetime timer is `timer`.
    pub fn find_by_timer(&self, timer: TimerId) -> Option<EntryId> {
        self.entries
            .iter()
            .find(|e| e.expiry_timer() == Some(timer))
            .map(TraceEntry::id)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter()
    }

    /// Number of recorded traces.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no trace is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
