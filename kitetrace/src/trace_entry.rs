//! A single recorded trace.

use crate::name::Name;
use crate::types::{EntryId, FaceId, Interest, MatchMode, PitToken, TimerId};

/// One recorded rendezvous path: the face a trace-carrying interest arrived
/// on, the pending record it belongs to, and the interest itself.
///
/// The face and pending record are host handles. The entry never decides
/// when either goes away.
#[derive(Debug)]
pub struct TraceEntry {
    id: EntryId,
    face: FaceId,
    trace_name: Name,
    interest: Interest,
    pit: PitToken,
    expiry_timer: Option<TimerId>,
}

impl TraceEntry {
    /// Record `interest` as arriving on `face` under pending record `pit`.
    ///
    /// # Panics
    ///
    /// Panics if `interest` carries no trace name.
    pub fn new(id: EntryId, face: FaceId, interest: Interest, pit: PitToken) -> Self {
        let trace_name = match &interest.trace_name {
            Some(name) => name.clone(),
            None => panic!("trace entry requires an interest with a trace name"),
        };
        Self {
            id,
            face,
            trace_name,
            interest,
            pit,
            expiry_timer: None,
        }
    }

    /// Compare the stored trace name with the interest's plain name
    /// (`ByName`) or its trace name (`ByTraceName`). Exact over all
    /// components.
    pub fn matches(&self, interest: &Interest, mode: MatchMode) -> bool {
        match mode {
            MatchMode::ByName => interest.name == self.trace_name,
            MatchMode::ByTraceName => interest.trace_name.as_ref() == Some(&self.trace_name),
        }
    }

    /// Dedup key comparison. False when the interest has no trace name.
    pub fn is_equal(&self, interest: &Interest) -> bool {
        self.matches(interest, MatchMode::ByTraceName)
    }

    /// Table-assigned handle, stable until the entry is erased.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Face the trace currently points at.
    pub fn face(&self) -> FaceId {
        self.face
    }

    /// Point the trace at a new face.
    pub fn update_face(&mut self, face: FaceId) {
        self.face = face;
    }

    /// Attach the entry to another pending record and store the interest
    /// that created it. The trace name is unchanged.
    pub fn rebind(&mut self, interest: Interest, pit: PitToken) {
        debug_assert!(self.is_equal(&interest));
        self.interest = interest;
        self.pit = pit;
    }

    /// The dedup key.
    pub fn trace_name(&self) -> &Name {
        &self.trace_name
    }

    /// The representative interest recorded with the entry.
    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    /// Pending record whose in-records redirected interests fan out to.
    pub fn pit(&self) -> PitToken {
        self.pit
    }

    /// Lifetime timer, if one is armed.
    pub fn expiry_timer(&self) -> Option<TimerId> {
        self.expiry_timer
    }

    /// Replace the expiry timer, returning the previous one for cancellation.
    pub fn set_expiry_timer(&mut self, timer: Option<TimerId>) -> Option<TimerId> {
        core::mem::replace(&mut self.expiry_timer, timer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TraceFlag;

    fn announce(name: &str, trace: &str) -> Interest {
        Interest::new(name.parse().unwrap(), 1)
            .with_trace(trace.parse().unwrap(), TraceFlag::Announce)
    }

    fn entry(trace: &str) -> TraceEntry {
        TraceEntry::new(EntryId(0), FaceId(1), announce("/server", trace), PitToken(9))
    }

    #[test]
    fn test_match_by_name() {
        let e = entry("/mobile/A");
        assert!(e.matches(&Interest::new("/mobile/A".parse().unwrap(), 2), MatchMode::ByName));
        assert!(!e.matches(&Interest::new("/mobile/A/1".parse().unwrap(), 2), MatchMode::ByName));
        // The plain name of the announcement itself is not the trace name.
        assert!(!e.matches(&announce("/server", "/mobile/A"), MatchMode::ByName));
    }

    #[test]
    fn test_match_by_trace_name() {
        let e = entry("/mobile/A");
        assert!(e.matches(&announce("/other", "/mobile/A"), MatchMode::ByTraceName));
        assert!(!e.matches(&announce("/mobile/A", "/mobile/B"), MatchMode::ByTraceName));
        assert!(!e.matches(&Interest::new("/mobile/A".parse().unwrap(), 2), MatchMode::ByTraceName));
    }

    #[test]
    fn test_is_equal_needs_trace_name() {
        let e = entry("/mobile/A");
        assert!(e.is_equal(&announce("/x", "/mobile/A")));
        assert!(!e.is_equal(&Interest::new("/mobile/A".parse().unwrap(), 3)));
    }

    #[test]
    fn test_update_face_and_timer() {
        let mut e = entry("/mobile/A");
        e.update_face(FaceId(4));
        assert_eq!(e.face(), FaceId(4));
        assert_eq!(e.set_expiry_timer(Some(TimerId(1))), None);
        assert_eq!(e.set_expiry_timer(None), Some(TimerId(1)));
        assert_eq!(e.pit(), PitToken(9));
        assert_eq!(e.trace_name().to_string(), "/mobile/A");
    }

    #[test]
    fn test_rebind_replaces_record_and_interest() {
        let mut e = entry("/mobile/A");
        let later = announce("/server/other", "/mobile/A");
        e.rebind(later.clone(), PitToken(3));
        assert_eq!(e.pit(), PitToken(3));
        assert_eq!(e.interest(), &later);
        assert_eq!(e.face(), FaceId(1));
        assert_eq!(e.trace_name().to_string(), "/mobile/A");
    }

    #[test]
    #[should_panic(expected = "trace name")]
    fn test_new_without_trace_name_panics() {
        TraceEntry::new(
            EntryId(0),
            FaceId(1),
            Interest::new("/server".parse().unwrap(), 1),
            PitToken(0),
        );
    }
}
