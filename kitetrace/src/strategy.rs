//! Trace-aware forwarding strategy.
//!
//! Every arriving interest first records its reverse path if it carries a
//! trace name. Its trace flag then decides the route:
//!
//! - `Announce`: pull the asker toward a trace recorded under the interest's
//!   plain name, then forward normally.
//! - `Redirected`: forward to every face waiting on the pending record of the
//!   matching trace. FIB forwarding only runs if nothing was sent.
//! - `None`: FIB forwarding.
//!
//! An expiring pending record that carries a trace name erases that trace. A
//! satisfied record releases only the entries bound to it. A per-entry timer
//! can also erase entries.

use tracing::{debug, info};

use crate::algorithm::{can_forward_to_face, forward_multicast};
use crate::config::{StrategyConfig, SubscriberMode};
use crate::debug::{DebugEvent, TableKind};
use crate::interest_trace_table::InterestTraceTable;
use crate::name::Name;
use crate::time::Duration;
use crate::trace_entry::TraceEntry;
use crate::trace_table::TraceTable;
use crate::traits::{Forwarder, Strategy};
use crate::types::{
    Data, EntryId, FaceId, Interest, MatchMode, PitToken, TimerId, TraceFlag,
    TRACE_FORWARDING_STRATEGY,
};

const COMPONENT: &str = "trace_forwarding";

/// Strategy registered as [`TRACE_FORWARDING_STRATEGY`]. One instance per
/// forwarder, owning its trace tables.
pub struct TraceForwardingStrategy {
    name: Name,
    config: StrategyConfig,
    tt: TraceTable,
    itt: InterestTraceTable,
}

impl TraceForwardingStrategy {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            name: Name::from_components(TRACE_FORWARDING_STRATEGY.split('/')),
            tt: TraceTable::with_capacity(config.table_capacity),
            itt: InterestTraceTable::with_capacity(config.table_capacity),
            config,
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Single-subscriber table, always maintained.
    pub fn trace_table(&self) -> &TraceTable {
        &self.tt
    }

    /// Multi-subscriber table, empty unless [`SubscriberMode::Multi`].
    pub fn interest_trace_table(&self) -> &InterestTraceTable {
        &self.itt
    }

    /// Record the reverse path of a trace-carrying interest whose inbound
    /// face is still waiting on `pit`.
    fn record_trace(&mut self, host: &mut dyn Forwarder, in_face: FaceId, interest: &Interest, pit: PitToken) {
        if !interest.has_trace_name() || host.in_record(pit, in_face).is_none() {
            return;
        }
        let lifetime = self.config.trace_lifetime;

        let (entry, was_new) = self.tt.insert(in_face, interest, pit);
        if was_new {
            host.emit(DebugEvent::TraceRecorded {
                table: TableKind::Trace,
                entry: entry.id(),
                trace_name: entry.trace_name().clone(),
                face: in_face,
                pit,
            });
        } else if interest.trace_flag == TraceFlag::Announce {
            // The latest announcement owns the entry, even one first
            // recorded by a redirected interest.
            if entry.pit() != pit {
                debug!(
                    component = COMPONENT,
                    trace_name = %entry.trace_name(),
                    from = ?entry.pit(),
                    to = ?pit,
                    "trace rebound to announcing record"
                );
                entry.rebind(interest.clone(), pit);
            }
            if entry.face() != in_face {
                let from = entry.face();
                entry.update_face(in_face);
                debug!(
                    component = COMPONENT,
                    trace_name = %entry.trace_name(),
                    from = %from,
                    to = %in_face,
                    "trace moved to new face"
                );
                host.emit(DebugEvent::TraceFaceUpdated {
                    entry: entry.id(),
                    trace_name: entry.trace_name().clone(),
                    from,
                    to: in_face,
                });
            }
        }
        if was_new || interest.trace_flag == TraceFlag::Announce {
            rearm_timer(host, entry, lifetime);
        }

        // Only announcements subscribe to a trace.
        if self.config.subscriber_mode == SubscriberMode::Multi && interest.trace_flag == TraceFlag::Announce {
            let known = self.itt.find(interest).map(TraceEntry::id);
            let (entry, was_new) = self.itt.insert(host, in_face, interest, pit);
            match (known, was_new) {
                (None, _) => host.emit(DebugEvent::TraceRecorded {
                    table: TableKind::InterestTrace,
                    entry: entry.id(),
                    trace_name: entry.trace_name().clone(),
                    face: in_face,
                    pit,
                }),
                (Some(id), true) => host.emit(DebugEvent::SubscriberAdded {
                    entry: id,
                    trace_name: entry.trace_name().clone(),
                    face: in_face,
                }),
                (Some(_), false) => {}
            }
            rearm_timer(host, entry, lifetime);
        }
    }

    /// Resend the interest recorded under this interest's plain name toward
    /// the asker. The out-record lands on the trace's own pending record.
    fn pull(&mut self, host: &mut dyn Forwarder, in_face: FaceId, interest: &Interest, pit: PitToken) -> bool {
        let Some(entry) = self.tt.match_interest(interest, MatchMode::ByName) else {
            host.emit(DebugEvent::PullMissed {
                name: interest.name.clone(),
            });
            return false;
        };
        let Some(record) = host.in_record(pit, in_face) else {
            return false;
        };
        if record.face == entry.face() {
            // The trace already points at the asker.
            debug!(
                component = COMPONENT,
                trace_name = %entry.trace_name(),
                face = %record.face,
                "pull skipped, trace owned by asking face"
            );
            return false;
        }

        let stored = entry.interest().clone();
        host.send_interest(entry.pit(), record.face, &stored);
        info!(
            component = COMPONENT,
            trace_name = %entry.trace_name(),
            out_face = %record.face,
            "pulled toward recorded trace"
        );
        host.emit(DebugEvent::Pulled {
            trace_name: entry.trace_name().clone(),
            out_face: record.face,
        });
        true
    }

    /// Forward to every face waiting on the pending record of the trace this
    /// interest names, except the inbound face. Returns the faces used.
    fn forward_by_tft(
        &mut self,
        host: &mut dyn Forwarder,
        in_face: FaceId,
        interest: &Interest,
        pit: PitToken,
    ) -> Vec<FaceId> {
        let matched = match self.config.subscriber_mode {
            SubscriberMode::Single => self.tt.match_interest(interest, MatchMode::ByTraceName),
            SubscriberMode::Multi => self.itt.match_interest(interest, MatchMode::ByTraceName),
        };
        let Some(trace_pit) = matched.map(TraceEntry::pit) else {
            return Vec::new();
        };

        let mut sent: Vec<FaceId> = Vec::new();
        for record in host.in_records(trace_pit) {
            if record.face == in_face || sent.contains(&record.face) {
                continue;
            }
            if can_forward_to_face(&*host, pit, in_face, interest, record.face) {
                host.send_interest(pit, record.face, interest);
                sent.push(record.face);
            }
        }
        sent
    }

    fn erase_entry(&mut self, host: &mut dyn Forwarder, table: TableKind, id: EntryId, reason: &'static str) {
        let removed = match table {
            TableKind::Trace => self.tt.erase(id),
            TableKind::InterestTrace => self.itt.erase(id),
        };
        let Some(mut entry) = removed else {
            return;
        };
        if let Some(timer) = entry.set_expiry_timer(None) {
            host.cancel(timer);
        }
        host.emit(DebugEvent::TraceErased {
            table,
            entry: id,
            trace_name: entry.trace_name().clone(),
            reason,
        });
    }

    /// Erase the trace named by an expiring pending record, whichever record
    /// the entry is bound to.
    fn release_trace(&mut self, host: &mut dyn Forwarder, pit: PitToken, reason: &'static str) {
        let Some(interest) = host.pit_interest(pit).filter(|i| i.has_trace_name()).cloned() else {
            return;
        };
        if let Some(id) = self.tt.find(&interest).map(TraceEntry::id) {
            self.erase_entry(host, TableKind::Trace, id, reason);
        }
        if let Some(id) = self.itt.find(&interest).map(TraceEntry::id) {
            self.erase_entry(host, TableKind::InterestTrace, id, reason);
        }
    }

    /// Release entries bound to `pit`.
    fn release_pit(&mut self, host: &mut dyn Forwarder, pit: PitToken, reason: &'static str) {
        let Some(interest) = host.pit_interest(pit) else {
            return;
        };
        if !interest.has_trace_name() {
            return;
        }
        for id in self.tt.ids_for_pit(pit) {
            self.erase_entry(host, TableKind::Trace, id, reason);
        }
        for id in self.itt.ids_for_pit(pit) {
            self.erase_entry(host, TableKind::InterestTrace, id, reason);
        }
    }
}

/// Replace an entry's lifetime timer. No-op without a configured lifetime.
fn rearm_timer(host: &mut dyn Forwarder, entry: &mut TraceEntry, lifetime: Option<Duration>) {
    let Some(lifetime) = lifetime else {
        return;
    };
    let timer = host.schedule(lifetime);
    if let Some(previous) = entry.set_expiry_timer(Some(timer)) {
        host.cancel(previous);
    }
}

impl Strategy for TraceForwardingStrategy {
    fn name(&self) -> &Name {
        &self.name
    }

    fn after_receive_interest(
        &mut self,
        host: &mut dyn Forwarder,
        in_face: FaceId,
        interest: &Interest,
        pit: PitToken,
    ) {
        self.record_trace(host, in_face, interest, pit);

        match interest.trace_flag {
            TraceFlag::Announce => {
                self.pull(host, in_face, interest, pit);
            }
            TraceFlag::Redirected => {
                let sent = self.forward_by_tft(host, in_face, interest, pit);
                if !sent.is_empty() {
                    debug!(
                        component = COMPONENT,
                        name = %interest.name,
                        faces = sent.len(),
                        "redirected along trace"
                    );
                    host.emit(DebugEvent::RedirectedForwarded {
                        trace_name: interest.trace_name.clone().unwrap_or_default(),
                        faces: sent,
                    });
                    return;
                }
                debug!(
                    component = COMPONENT,
                    name = %interest.name,
                    "no usable trace, falling back to FIB"
                );
                host.emit(DebugEvent::RedirectFellBack {
                    trace_name: interest.trace_name.clone(),
                });
            }
            TraceFlag::None => {}
        }

        forward_multicast(host, pit, in_face, interest);
    }

    fn before_expire_pending_interest(&mut self, host: &mut dyn Forwarder, pit: PitToken) {
        self.release_trace(host, pit, "pending interest expired");
    }

    fn before_satisfy_interest(&mut self, host: &mut dyn Forwarder, pit: PitToken, _in_face: FaceId, _data: &Data) {
        self.release_pit(host, pit, "pending interest satisfied");
    }

    fn on_timer(&mut self, host: &mut dyn Forwarder, timer: TimerId) {
        if let Some(id) = self.tt.find_by_timer(timer) {
            if let Some(entry) = self.tt.get_mut(id) {
                entry.set_expiry_timer(None);
            }
            self.erase_entry(host, TableKind::Trace, id, "trace lifetime elapsed");
        }
        if let Some(id) = self.itt.find_by_timer(timer) {
            if let Some(entry) = self.itt.get_mut(id) {
                entry.set_expiry_timer(None);
            }
            self.erase_entry(host, TableKind::InterestTrace, id, "trace lifetime elapsed");
        }
    }

    fn trace_names(&self) -> Vec<Name> {
        let mut names: Vec<Name> = self.tt.iter().map(|e| e.trace_name().clone()).collect();
        for entry in self.itt.iter() {
            if !names.contains(entry.trace_name()) {
                names.push(entry.trace_name().clone());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::test_impls::MockForwarder;

    const F1: FaceId = FaceId(1);
    const F2: FaceId = FaceId(2);
    const F3: FaceId = FaceId(3);
    const F4: FaceId = FaceId(4);
    const UPSTREAM: FaceId = FaceId(9);

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    fn announce(trace: &str, nonce: u32) -> Interest {
        Interest::new(name("/server"), nonce)
            .with_trace(name(trace), TraceFlag::Announce)
            .with_lifetime(Duration::from_secs(10))
    }

    fn redirected(trace: &str, nonce: u32) -> Interest {
        Interest::new(name(trace).append("0"), nonce).with_trace(name(trace), TraceFlag::Redirected)
    }

    fn arrive(
        strategy: &mut TraceForwardingStrategy,
        host: &mut MockForwarder,
        face: FaceId,
        interest: &Interest,
    ) -> PitToken {
        let pit = host.receive(face, interest);
        strategy.after_receive_interest(host, face, interest, pit);
        pit
    }

    fn sent_on(host: &MockForwarder, pit: PitToken) -> Vec<FaceId> {
        host.sent
            .iter()
            .filter(|(p, _, _)| *p == pit)
            .map(|(_, face, _)| *face)
            .collect()
    }

    #[test]
    fn test_announce_then_pull_then_redirect() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());

        let mobile = announce("/mobile/A", 1);
        let p1 = arrive(&mut strategy, &mut host, F1, &mobile);
        assert_eq!(strategy.trace_table().len(), 1);
        assert_eq!(sent_on(&host, p1), vec![UPSTREAM]);

        // Someone asks to be pulled toward /mobile/A.
        let pull = Interest::new(name("/mobile/A"), 2).with_flag(TraceFlag::Announce);
        let p2 = arrive(&mut strategy, &mut host, F2, &pull);
        // The stored interest goes out under the mobile's own pending record.
        let pulled: Vec<_> = host.sent.iter().filter(|(_, f, _)| *f == F2).collect();
        assert_eq!(pulled.len(), 1);
        assert_eq!(pulled[0].0, p1);
        assert_eq!(pulled[0].2, mobile);
        assert!(host.pits[&p1].out_records.contains(&(F2, 1)));
        // Pull does not stop standard forwarding.
        assert_eq!(sent_on(&host, p2), vec![UPSTREAM]);
        assert!(host.events.iter().any(|e| matches!(e, DebugEvent::Pulled { out_face, .. } if *out_face == F2)));

        // More downstream faces wait on the mobile's pending record.
        host.receive(F3, &announce("/mobile/A", 3));
        host.receive(F4, &announce("/mobile/A", 4));

        let p3 = arrive(&mut strategy, &mut host, F3, &redirected("/mobile/A", 5));
        assert_eq!(sent_on(&host, p3), vec![F1, F4]);
        assert!(!host.sent_faces().is_empty());
        assert!(host.rejected.is_empty());
    }

    #[test]
    fn test_redirect_without_trace_falls_back() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());

        let p = arrive(&mut strategy, &mut host, F2, &redirected("/mobile/Z", 1));
        // The redirect's own trace got recorded, but it only points back at F2.
        assert_eq!(strategy.trace_table().len(), 1);
        assert_eq!(sent_on(&host, p), vec![UPSTREAM]);
        assert!(host
            .events
            .iter()
            .any(|e| matches!(e, DebugEvent::RedirectFellBack { .. })));
    }

    #[test]
    fn test_redirect_with_ineligible_faces_falls_back() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        arrive(&mut strategy, &mut host, F1, &announce("/mobile/A", 1));
        host.scope_blocked.push(F1);

        let p = arrive(&mut strategy, &mut host, F3, &redirected("/mobile/A", 2));
        assert_eq!(sent_on(&host, p), vec![UPSTREAM]);
    }

    #[test]
    fn test_redirect_with_no_route_is_rejected() {
        let mut host = MockForwarder::new();
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        let p = arrive(&mut strategy, &mut host, F3, &redirected("/mobile/A", 2));
        assert_eq!(host.rejected, vec![p]);
        assert!(host.sent.is_empty());
    }

    #[test]
    fn test_plain_interest_uses_fib() {
        let mut host = MockForwarder::new().with_next_hops(&[F1, F2, UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        let p = arrive(&mut strategy, &mut host, F2, &Interest::new(name("/server/file"), 1));
        assert_eq!(sent_on(&host, p), vec![F1, UPSTREAM]);
        assert!(strategy.trace_table().is_empty());
    }

    #[test]
    fn test_trace_recorded_regardless_of_flag() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        let interest = Interest::new(name("/server"), 1).with_trace(name("/mobile/C"), TraceFlag::None);
        arrive(&mut strategy, &mut host, F1, &interest);
        assert_eq!(strategy.trace_names(), vec![name("/mobile/C")]);
    }

    #[test]
    fn test_record_requires_live_in_record() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        let interest = announce("/mobile/A", 1);
        let pit = host.receive(F1, &interest);
        // F2 never registered an in-record on this pending record.
        strategy.after_receive_interest(&mut host, F2, &interest, pit);
        assert!(strategy.trace_table().is_empty());
    }

    #[test]
    fn test_reannouncement_moves_face() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        arrive(&mut strategy, &mut host, F1, &announce("/mobile/A", 1));
        arrive(&mut strategy, &mut host, F2, &announce("/mobile/A", 2));

        let entry = strategy.trace_table().iter().next().unwrap();
        assert_eq!(entry.face(), F2);
        assert_eq!(strategy.trace_table().len(), 1);

        // A redirected interest on F3 does not move the trace.
        arrive(&mut strategy, &mut host, F3, &redirected("/mobile/A", 3));
        assert_eq!(strategy.trace_table().iter().next().unwrap().face(), F2);
    }

    #[test]
    fn test_pull_skips_owning_face() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        let mobile = announce("/mobile/A", 1);
        arrive(&mut strategy, &mut host, F1, &mobile);

        let pull = Interest::new(name("/mobile/A"), 2).with_flag(TraceFlag::Announce);
        let p = arrive(&mut strategy, &mut host, F1, &pull);
        assert_eq!(sent_on(&host, p), vec![UPSTREAM]);
    }

    #[test]
    fn test_pull_miss_still_forwards() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        let pull = Interest::new(name("/mobile/Q"), 2).with_flag(TraceFlag::Announce);
        let p = arrive(&mut strategy, &mut host, F2, &pull);
        assert_eq!(sent_on(&host, p), vec![UPSTREAM]);
        assert!(host.events.contains(&DebugEvent::PullMissed { name: name("/mobile/Q") }));
    }

    #[test]
    fn test_expiry_erases_entry() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        let p = arrive(&mut strategy, &mut host, F1, &announce("/mobile/B", 1));
        assert_eq!(strategy.trace_table().len(), 1);

        strategy.before_expire_pending_interest(&mut host, p);
        assert_eq!(strategy.trace_table().len(), 0);

        // Expiry of an unrelated record leaves other traces alone.
        arrive(&mut strategy, &mut host, F1, &announce("/mobile/C", 2));
        let other = host.receive(F2, &Interest::new(name("/x"), 3));
        strategy.before_expire_pending_interest(&mut host, other);
        assert_eq!(strategy.trace_table().len(), 1);
    }

    #[test]
    fn test_expiry_erases_trace_by_name() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        let p1 = arrive(&mut strategy, &mut host, F1, &announce("/mobile/A", 1));
        // Same trace, different plain name: another pending record.
        let p2 = arrive(&mut strategy, &mut host, F3, &redirected("/mobile/A", 2));
        assert_eq!(strategy.trace_table().iter().next().unwrap().pit(), p1);

        strategy.before_expire_pending_interest(&mut host, p2);
        assert!(strategy.trace_table().is_empty());
        assert!(host.events.iter().any(|e| matches!(
            e,
            DebugEvent::TraceErased { reason, .. } if *reason == "pending interest expired"
        )));
    }

    #[test]
    fn test_expiry_erases_subscriber_entry_by_name() {
        let config = StrategyConfig::default().with_subscriber_mode(SubscriberMode::Multi);
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(config);
        arrive(&mut strategy, &mut host, F1, &announce("/mobile/A", 1));
        let p2 = arrive(&mut strategy, &mut host, F3, &redirected("/mobile/A", 2));

        strategy.before_expire_pending_interest(&mut host, p2);
        assert!(strategy.trace_table().is_empty());
        assert!(strategy.interest_trace_table().is_empty());
        assert!(strategy.trace_names().is_empty());
    }

    #[test]
    fn test_satisfaction_releases_entry() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        let p = arrive(&mut strategy, &mut host, F1, &announce("/mobile/A", 1));
        let data = Data::new(name("/server"), vec![1]);
        strategy.before_satisfy_interest(&mut host, p, UPSTREAM, &data);
        assert!(strategy.trace_table().is_empty());
    }

    #[test]
    fn test_satisfied_redirect_keeps_trace() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        arrive(&mut strategy, &mut host, F1, &announce("/mobile/A", 1));
        let p = arrive(&mut strategy, &mut host, F3, &redirected("/mobile/A", 2));

        let data = Data::new(name("/mobile/A/0"), vec![1]);
        strategy.before_satisfy_interest(&mut host, p, F1, &data);
        assert_eq!(strategy.trace_names(), vec![name("/mobile/A")]);
    }

    #[test]
    fn test_announce_rebinds_entry_recorded_by_redirect() {
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        let first = arrive(&mut strategy, &mut host, F3, &redirected("/mobile/A", 1));
        assert_eq!(strategy.trace_table().iter().next().unwrap().pit(), first);

        let mobile = announce("/mobile/A", 2);
        let p = arrive(&mut strategy, &mut host, F1, &mobile);
        let entry = strategy.trace_table().iter().next().unwrap();
        assert_eq!(entry.pit(), p);
        assert_eq!(entry.face(), F1);
        assert_eq!(entry.interest(), &mobile);

        // Satisfying the first redirect leaves the rebound trace alone.
        let data = Data::new(name("/mobile/A/0"), vec![1]);
        strategy.before_satisfy_interest(&mut host, first, UPSTREAM, &data);
        assert_eq!(strategy.trace_table().len(), 1);

        // Later redirects follow the announcement, not the first redirect.
        let next = Interest::new(name("/mobile/A/1"), 3).with_trace(name("/mobile/A"), TraceFlag::Redirected);
        let p3 = arrive(&mut strategy, &mut host, F2, &next);
        assert_eq!(sent_on(&host, p3), vec![F1]);
    }

    #[test]
    fn test_trace_lifetime_timer() {
        let config = StrategyConfig::default().with_trace_lifetime(Duration::from_secs(10));
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(config);

        arrive(&mut strategy, &mut host, F1, &announce("/mobile/A", 1));
        assert_eq!(host.timers.len(), 1);

        // Re-announcement re-arms.
        host.advance(Duration::from_secs(3));
        arrive(&mut strategy, &mut host, F1, &announce("/mobile/A", 2));
        assert_eq!(host.timers.len(), 1);
        assert_eq!(host.cancelled.len(), 1);

        host.advance(Duration::from_secs(8));
        assert!(host.take_due_timers().is_empty());
        host.advance(Duration::from_secs(2));
        for timer in host.take_due_timers() {
            strategy.on_timer(&mut host, timer);
        }
        assert!(strategy.trace_table().is_empty());
    }

    #[test]
    fn test_early_erase_cancels_timer() {
        let config = StrategyConfig::default().with_trace_lifetime(Duration::from_secs(10));
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(config);
        let p = arrive(&mut strategy, &mut host, F1, &announce("/mobile/A", 1));

        strategy.before_expire_pending_interest(&mut host, p);
        assert!(host.timers.is_empty());
        assert_eq!(host.cancelled.len(), 1);
    }

    #[test]
    fn test_multi_subscriber_fan_in() {
        let config = StrategyConfig::default().with_subscriber_mode(SubscriberMode::Multi);
        let mut host = MockForwarder::new().with_next_hops(&[UPSTREAM]);
        let mut strategy = TraceForwardingStrategy::new(config);

        let p1 = arrive(&mut strategy, &mut host, F1, &announce("/mobile/A", 1));
        // Another consumer tracks the same mobile under a different name.
        let other = Interest::new(name("/server/other"), 2)
            .with_trace(name("/mobile/A"), TraceFlag::Announce);
        arrive(&mut strategy, &mut host, F2, &other);

        assert_eq!(strategy.interest_trace_table().len(), 1);
        assert_eq!(host.in_faces(p1), vec![F1, F2]);
        assert!(host
            .events
            .iter()
            .any(|e| matches!(e, DebugEvent::SubscriberAdded { face, .. } if *face == F2)));

        // Redirects now reach both subscribers.
        let p3 = arrive(&mut strategy, &mut host, F3, &redirected("/mobile/A", 3));
        assert_eq!(sent_on(&host, p3), vec![F1, F2]);
    }

    #[test]
    fn test_name_and_trace_names() {
        let strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        assert_eq!(strategy.name().to_string(), TRACE_FORWARDING_STRATEGY);
        assert!(strategy.trace_names().is_empty());
    }
}
