//! Multi-subscriber trace table.
//!
//! Same storage as [`TraceTable`], but a known trace name arriving from a new
//! face becomes another downstream subscriber of the entry's pending record
//! instead of a duplicate. Consumers tracking the same mobile share one entry
//! and the eventual fan-out reaches all of them.

use tracing::debug;

use crate::trace_entry::TraceEntry;
use crate::trace_table::TraceTable;
use crate::traits::Forwarder;
use crate::types::{EntryId, FaceId, Interest, MatchMode, PitToken, TimerId};

const COMPONENT: &str = "interest_trace_table";

/// Entries of the multi-subscriber table have the same shape.
pub type InterestTraceEntry = TraceEntry;

#[derive(Debug, Default)]
pub struct InterestTraceTable {
    inner: TraceTable,
}

impl InterestTraceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: TraceTable::with_capacity(capacity),
        }
    }

    pub fn match_interest(&self, interest: &Interest, mode: MatchMode) -> Option<&InterestTraceEntry> {
        self.inner.match_interest(interest, mode)
    }

    /// Entry recorded for the interest's trace name.
    ///
    /// # Panics
    ///
    /// Panics if `interest` carries no trace name.
    pub fn find(&self, interest: &Interest) -> Option<&InterestTraceEntry> {
        self.inner.find(interest)
    }

    /// Record `interest` from `face`.
    ///
    /// - Known trace from the same face: `(entry, false)`, nothing changes.
    /// - Known trace from another face: `face` is added as an in-record on the
    ///   entry's pending record and `(entry, true)` is returned.
    /// - Unknown trace: a new entry, `(entry, true)`.
    ///
    /// # Panics
    ///
    /// Panics if `interest` carries no trace name.
    pub fn insert(
        &mut self,
        host: &mut dyn Forwarder,
        face: FaceId,
        interest: &Interest,
        pit: PitToken,
    ) -> (&mut InterestTraceEntry, bool) {
        let subscriber_of = self
            .inner
            .find(interest)
            .filter(|existing| existing.face() != face)
            .map(|existing| (existing.id(), existing.pit()));

        if let Some((id, entry_pit)) = subscriber_of {
            host.insert_or_update_in_record(entry_pit, face, interest);
            debug!(
                component = COMPONENT,
                entry = id.0,
                face = %face,
                pit = %entry_pit,
                "subscriber added to existing trace"
            );
            let (entry, _) = self.inner.insert(face, interest, pit);
            return (entry, true);
        }
        self.inner.insert(face, interest, pit)
    }

    pub fn erase(&mut self, id: EntryId) -> Option<InterestTraceEntry> {
        self.inner.erase(id)
    }

    pub fn get(&self, id: EntryId) -> Option<&InterestTraceEntry> {
        self.inner.get(id)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut InterestTraceEntry> {
        self.inner.get_mut(id)
    }

    pub fn ids_for_pit(&self, pit: PitToken) -> Vec<EntryId> {
        self.inner.ids_for_pit(pit)
    }

    pub fn find_by_timer(&self, timer: TimerId) -> Option<EntryId> {
        self.inner.find_by_timer(timer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterestTraceEntry> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::test_impls::MockForwarder;
    use crate::types::TraceFlag;

    fn subscribe(nonce: u32) -> Interest {
        Interest::new("/server".parse().unwrap(), nonce)
            .with_trace("/mobile/A".parse().unwrap(), TraceFlag::Announce)
    }

    #[test]
    fn test_second_face_becomes_subscriber() {
        let mut host = MockForwarder::new();
        let mut table = InterestTraceTable::new();

        let first = subscribe(1);
        let pit = host.receive(FaceId(1), &first);
        let (_, was_new) = table.insert(&mut host, FaceId(1), &first, pit);
        assert!(was_new);

        // A later subscriber under a different pending record.
        let second = subscribe(2).with_lifetime(crate::Duration::from_secs(2));
        let other_pit = PitToken(77);
        let (entry, was_new) = table.insert(&mut host, FaceId(2), &second, other_pit);
        assert!(was_new);
        assert_eq!(entry.pit(), pit);
        assert_eq!(entry.face(), FaceId(1));

        assert_eq!(table.len(), 1);
        assert_eq!(host.in_faces(pit), vec![FaceId(1), FaceId(2)]);
    }

    #[test]
    fn test_same_face_is_duplicate() {
        let mut host = MockForwarder::new();
        let mut table = InterestTraceTable::new();
        let interest = subscribe(1);
        let pit = host.receive(FaceId(3), &interest);

        table.insert(&mut host, FaceId(3), &interest, pit);
        let (_, was_new) = table.insert(&mut host, FaceId(3), &subscribe(9), pit);
        assert!(!was_new);
        assert_eq!(table.len(), 1);
        assert_eq!(host.in_faces(pit), vec![FaceId(3)]);
    }

    #[test]
    fn test_erase_and_lookup() {
        let mut host = MockForwarder::new();
        let mut table = InterestTraceTable::new();
        let interest = subscribe(1);
        let pit = host.receive(FaceId(1), &interest);
        let id = table.insert(&mut host, FaceId(1), &interest, pit).0.id();

        assert!(table.find(&interest).is_some());
        assert_eq!(table.ids_for_pit(pit), vec![id]);
        assert!(table.erase(id).is_some());
        assert!(table.erase(id).is_none());
        assert!(table.is_empty());
    }
}
