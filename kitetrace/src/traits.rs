//! Host collaborator traits.
//!
//! The strategy never owns faces or pending-interest records. It sees them
//! through [`Forwarder`] as copyable handles and asks the host to act on them.
//! This lets the same strategy run inside the simulator, a real forwarding
//! daemon, or the mock host used in unit tests.

use crate::debug::DebugEvent;
use crate::name::Name;
use crate::time::{Duration, Timestamp};
use crate::types::{Data, FaceId, InRecord, Interest, NextHop, PitToken, TimerId};

/// Forwarding-daemon surface consumed by strategies.
///
/// All calls are synchronous and run on the host's single processing
/// context. A `PitToken` handed to a strategy callback stays valid for the
/// duration of that callback.
pub trait Forwarder {
    /// Current host time.
    fn now(&self) -> Timestamp;

    /// The interest a pending record was created for.
    fn pit_interest(&self, pit: PitToken) -> Option<&Interest>;

    /// Downstream faces waiting on `pit`, in arrival order.
    fn in_records(&self, pit: PitToken) -> Vec<InRecord>;

    /// In-record for `face`, if it has not expired.
    fn in_record(&self, pit: PitToken, face: FaceId) -> Option<InRecord>;

    /// Register `face` as waiting on `pit`, or refresh its record.
    fn insert_or_update_in_record(&mut self, pit: PitToken, face: FaceId, interest: &Interest);

    /// FIB next hops for the pending interest, best first.
    fn lookup_fib(&self, pit: PitToken) -> Vec<NextHop>;

    /// Would sending `interest` from `in_face` to `out_face` leave its scope.
    fn would_violate_scope(&self, in_face: FaceId, interest: &Interest, out_face: FaceId) -> bool;

    /// Legacy duplicate check: false if `out_face` already carries this
    /// pending interest or nobody else is waiting for it.
    fn can_forward_to_legacy(&self, pit: PitToken, out_face: FaceId) -> bool;

    /// Transmit `interest` on `out_face`, recording an out-record on `pit`.
    fn send_interest(&mut self, pit: PitToken, out_face: FaceId, interest: &Interest);

    /// Signal "no route": the pending record expires immediately.
    fn reject_pending_interest(&mut self, pit: PitToken);

    /// Schedule a strategy timer. The host calls [`Strategy::on_timer`] when
    /// it fires unless it was cancelled first.
    fn schedule(&mut self, after: Duration) -> TimerId;

    fn cancel(&mut self, timer: TimerId);

    /// Debug hook. Ignored unless the host collects events.
    fn emit(&mut self, _event: DebugEvent) {}
}

/// Strategy callback surface invoked by the host.
pub trait Strategy {
    /// Protocol identifier the strategy is registered under.
    fn name(&self) -> &Name;

    /// An interest arrived on `in_face` and was recorded in `pit`.
    fn after_receive_interest(
        &mut self,
        host: &mut dyn Forwarder,
        in_face: FaceId,
        interest: &Interest,
        pit: PitToken,
    );

    /// `pit` is about to expire unsatisfied (or after rejection).
    fn before_expire_pending_interest(&mut self, host: &mut dyn Forwarder, pit: PitToken);

    /// `pit` is about to be satisfied by `data` arriving on `in_face`.
    fn before_satisfy_interest(
        &mut self,
        _host: &mut dyn Forwarder,
        _pit: PitToken,
        _in_face: FaceId,
        _data: &Data,
    ) {
    }

    /// A timer scheduled through [`Forwarder::schedule`] fired.
    fn on_timer(&mut self, _host: &mut dyn Forwarder, _timer: TimerId) {}

    /// Trace names currently recorded, for introspection.
    fn trace_names(&self) -> Vec<Name> {
        Vec::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_impls {
    //! Mock host for unit testing and doc tests.
    //!
    //! Available when running tests or with the `test-support` feature enabled.

    use hashbrown::HashMap;

    use super::*;

    /// Pending record kept by [`MockForwarder`].
    #[derive(Debug, Clone)]
    pub struct MockPit {
        pub interest: Interest,
        pub in_records: Vec<InRecord>,
        pub out_records: Vec<(FaceId, u32)>,
    }

    /// In-memory forwarder with a single FIB entry shared by all interests.
    #[derive(Debug, Default)]
    pub struct MockForwarder {
        pub now: Timestamp,
        pub pits: HashMap<PitToken, MockPit>,
        pub fib: Vec<NextHop>,
        /// Out faces that violate scope for every interest.
        pub scope_blocked: Vec<FaceId>,
        /// Out faces refused by the legacy check.
        pub legacy_blocked: Vec<FaceId>,
        pub sent: Vec<(PitToken, FaceId, Interest)>,
        pub rejected: Vec<PitToken>,
        pub timers: Vec<(TimerId, Timestamp)>,
        pub cancelled: Vec<TimerId>,
        pub events: Vec<DebugEvent>,
        next_pit: u64,
        next_timer: u64,
    }

    impl MockForwarder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Set the FIB next hops, all with cost 0.
        pub fn with_next_hops(mut self, faces: &[FaceId]) -> Self {
            self.fib = faces.iter().map(|&face| NextHop { face, cost: 0 }).collect();
            self
        }

        /// Interest arrival: aggregate by (name, trace name) like a PIT,
        /// then add or refresh the in-record for `in_face`.
        pub fn receive(&mut self, in_face: FaceId, interest: &Interest) -> PitToken {
            let existing = self
                .pits
                .iter()
                .find(|(_, p)| {
                    p.interest.name == interest.name && p.interest.trace_name == interest.trace_name
                })
                .map(|(&token, _)| token);
            let token = match existing {
                Some(token) => token,
                None => {
                    let token = PitToken(self.next_pit);
                    self.next_pit += 1;
                    self.pits.insert(
                        token,
                        MockPit {
                            interest: interest.clone(),
                            in_records: Vec::new(),
                            out_records: Vec::new(),
                        },
                    );
                    token
                }
            };
            self.insert_or_update_in_record(token, in_face, interest);
            token
        }

        pub fn in_faces(&self, pit: PitToken) -> Vec<FaceId> {
            self.in_records(pit).iter().map(|r| r.face).collect()
        }

        pub fn sent_faces(&self) -> Vec<FaceId> {
            self.sent.iter().map(|(_, face, _)| *face).collect()
        }

        pub fn take_sent(&mut self) -> Vec<(PitToken, FaceId, Interest)> {
            core::mem::take(&mut self.sent)
        }

        pub fn advance(&mut self, by: Duration) {
            self.now = self.now + by;
        }

        /// Remove and return timers whose deadline has passed.
        pub fn take_due_timers(&mut self) -> Vec<TimerId> {
            let now = self.now;
            let (due, pending): (Vec<_>, Vec<_>) =
                self.timers.drain(..).partition(|(_, at)| *at <= now);
            self.timers = pending;
            due.into_iter().map(|(id, _)| id).collect()
        }
    }

    impl Forwarder for MockForwarder {
        fn now(&self) -> Timestamp {
            self.now
        }

        fn pit_interest(&self, pit: PitToken) -> Option<&Interest> {
            self.pits.get(&pit).map(|p| &p.interest)
        }

        fn in_records(&self, pit: PitToken) -> Vec<InRecord> {
            self.pits
                .get(&pit)
                .map(|p| p.in_records.clone())
                .unwrap_or_default()
        }

        fn in_record(&self, pit: PitToken, face: FaceId) -> Option<InRecord> {
            let now = self.now;
            self.pits
                .get(&pit)?
                .in_records
                .iter()
                .find(|r| r.face == face && r.expiry > now)
                .copied()
        }

        fn insert_or_update_in_record(&mut self, pit: PitToken, face: FaceId, interest: &Interest) {
            let expiry = self.now + interest.lifetime;
            let Some(entry) = self.pits.get_mut(&pit) else {
                return;
            };
            let record = InRecord {
                face,
                nonce: interest.nonce,
                expiry,
            };
            match entry.in_records.iter_mut().find(|r| r.face == face) {
                Some(existing) => *existing = record,
                None => entry.in_records.push(record),
            }
        }

        fn lookup_fib(&self, _pit: PitToken) -> Vec<NextHop> {
            self.fib.clone()
        }

        fn would_violate_scope(&self, _in_face: FaceId, _interest: &Interest, out_face: FaceId) -> bool {
            self.scope_blocked.contains(&out_face)
        }

        fn can_forward_to_legacy(&self, pit: PitToken, out_face: FaceId) -> bool {
            if self.legacy_blocked.contains(&out_face) {
                return false;
            }
            self.pits
                .get(&pit)
                .is_some_and(|p| !p.out_records.iter().any(|(face, _)| *face == out_face))
        }

        fn send_interest(&mut self, pit: PitToken, out_face: FaceId, interest: &Interest) {
            if let Some(entry) = self.pits.get_mut(&pit) {
                entry.out_records.push((out_face, interest.nonce));
            }
            self.sent.push((pit, out_face, interest.clone()));
        }

        fn reject_pending_interest(&mut self, pit: PitToken) {
            self.rejected.push(pit);
        }

        fn schedule(&mut self, after: Duration) -> TimerId {
            let id = TimerId(self.next_timer);
            self.next_timer += 1;
            self.timers.push((id, self.now + after));
            id
        }

        fn cancel(&mut self, timer: TimerId) {
            self.timers.retain(|(id, _)| *id != timer);
            self.cancelled.push(timer);
        }

        fn emit(&mut self, event: DebugEvent) {
            self.events.push(event);
        }
    }

}
