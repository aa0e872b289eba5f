//! SimNode: a forwarder, the strategy it hosts, and an optional application.

use kitetrace::{
    Data, DebugEvent, FaceId, Forwarder, Interest, Name, Strategy, Timestamp,
};
use tracing::{debug, trace};

use crate::app::{AppStats, Application};
use crate::event::Packet;
use crate::forwarder::SimForwarder;
use crate::topology::{NodeId, APP_FACE};

/// A simulated forwarding node.
///
/// Packets sent toward [`APP_FACE`] are handed to the application
/// synchronously; anything the application answers re-enters the forwarder
/// on the same face. Packets for other faces queue until the simulator
/// collects them with [`take_outgoing`](Self::take_outgoing).
pub struct SimNode {
    id: NodeId,
    forwarder: SimForwarder,
    strategy: Box<dyn Strategy>,
    app: Option<Box<dyn Application>>,
    outgoing: Vec<(FaceId, Packet)>,
}

impl SimNode {
    pub fn new(id: NodeId, strategy: Box<dyn Strategy>) -> Self {
        Self {
            id,
            forwarder: SimForwarder::new(),
            strategy,
            app: None,
            outgoing: Vec::new(),
        }
    }

    pub fn with_app(mut self, app: Box<dyn Application>) -> Self {
        self.app = Some(app);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn forwarder(&self) -> &SimForwarder {
        &self.forwarder
    }

    pub fn forwarder_mut(&mut self) -> &mut SimForwarder {
        &mut self.forwarder
    }

    pub fn strategy_name(&self) -> &Name {
        self.strategy.name()
    }

    /// Trace names the hosted strategy currently holds.
    pub fn trace_names(&self) -> Vec<Name> {
        self.strategy.trace_names()
    }

    pub fn app_stats(&self) -> Option<AppStats> {
        self.app.as_ref().map(|app| app.stats())
    }

    pub fn debug_events(&self) -> &[(Timestamp, DebugEvent)] {
        self.forwarder.events()
    }

    pub fn add_route(&mut self, prefix: Name, face: FaceId, cost: u32) {
        self.forwarder.add_route(prefix, face, cost);
    }

    pub fn set_face_up(&mut self, face: FaceId, up: bool) {
        self.forwarder.set_face_up(face, up);
    }

    /// Start the application, if any.
    pub fn start(&mut self, now: Timestamp) {
        self.forwarder.set_now(now);
        let packets = match &mut self.app {
            Some(app) => app.start(now),
            None => Vec::new(),
        };
        for packet in packets {
            self.receive(APP_FACE, packet);
        }
        self.flush();
    }

    /// Handle a packet arriving on `face`.
    pub fn handle_packet(&mut self, face: FaceId, packet: Packet, now: Timestamp) {
        self.forwarder.set_now(now);
        self.receive(face, packet);
        self.flush();
    }

    /// Fire due strategy timers, expire pending records and run the
    /// application's periodic work.
    pub fn handle_wakeup(&mut self, now: Timestamp) {
        self.forwarder.set_now(now);

        for timer in self.forwarder.take_due_timers() {
            self.strategy.on_timer(&mut self.forwarder, timer);
        }
        for pit in self.forwarder.expired_pits() {
            self.strategy
                .before_expire_pending_interest(&mut self.forwarder, pit);
            self.forwarder.remove_pit(pit);
            self.forwarder.counters_mut().pit_expired += 1;
        }
        self.forwarder.purge_dead_nonces();

        let packets = match &mut self.app {
            Some(app) if app.next_wakeup().is_some_and(|at| at <= now) => app.on_wakeup(now),
            _ => Vec::new(),
        };
        for packet in packets {
            self.receive(APP_FACE, packet);
        }
        self.flush();
    }

    /// Earliest time this node needs a wakeup.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        let app = self.app.as_ref().and_then(|app| app.next_wakeup());
        match (self.forwarder.next_deadline(), app) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Take packets queued for network faces.
    pub fn take_outgoing(&mut self) -> Vec<(FaceId, Packet)> {
        std::mem::take(&mut self.outgoing)
    }

    fn receive(&mut self, face: FaceId, packet: Packet) {
        match packet {
            Packet::Interest(interest) => self.on_interest(face, &interest),
            Packet::Data(data) => self.on_data(face, &data),
        }
    }

    fn on_interest(&mut self, in_face: FaceId, interest: &Interest) {
        if self.forwarder.is_loop(in_face, interest) {
            self.forwarder.counters_mut().loops_dropped += 1;
            trace!(
                node = self.id,
                name = %interest.name,
                nonce = interest.nonce,
                "dropping looped interest"
            );
            return;
        }

        let (pit, _) = self.forwarder.find_or_insert_pit(interest);
        self.forwarder
            .insert_or_update_in_record(pit, in_face, interest);
        self.forwarder.remember_nonce(interest);
        self.strategy
            .after_receive_interest(&mut self.forwarder, in_face, interest, pit);
    }

    fn on_data(&mut self, in_face: FaceId, data: &Data) {
        let pits = self.forwarder.matching_pits(in_face, data);
        if pits.is_empty() {
            self.forwarder.counters_mut().unsolicited_data += 1;
            debug!(node = self.id, name = %data.name, face = %in_face, "unsolicited data");
            return;
        }

        let mut sent: Vec<FaceId> = Vec::new();
        for pit in pits {
            self.strategy
                .before_satisfy_interest(&mut self.forwarder, pit, in_face, data);
            for record in self.forwarder.in_records(pit) {
                if record.face == in_face || sent.contains(&record.face) {
                    continue;
                }
                self.forwarder.push_data(record.face, data.clone());
                sent.push(record.face);
            }
            self.forwarder.remove_pit(pit);
        }
    }

    /// Deliver everything the forwarder queued, looping application replies
    /// back in until the forwarder goes quiet.
    fn flush(&mut self) {
        loop {
            let batch = self.forwarder.take_outbox();
            if batch.is_empty() {
                return;
            }
            for (face, packet) in batch {
                if face != APP_FACE {
                    self.outgoing.push((face, packet));
                    continue;
                }
                let now = self.forwarder.now();
                let replies = match (&mut self.app, &packet) {
                    (Some(app), Packet::Interest(interest)) => app.on_interest(interest, now),
                    (Some(app), Packet::Data(data)) => app.on_data(data, now),
                    (None, _) => Vec::new(),
                };
                for reply in replies {
                    self.receive(APP_FACE, reply);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kitetrace::{
        Duration, MulticastStrategy, StrategyConfig, TraceFlag, TraceForwardingStrategy,
    };

    use super::*;
    use crate::app::KiteMobile;

    const UPLINK: FaceId = FaceId(1);

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    fn mobile_node() -> SimNode {
        let strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        let mut node = SimNode::new(2, Box::new(strategy))
            .with_app(Box::new(KiteMobile::new(name("/server"), name("/mobile/A"), 7)));
        node.set_face_up(UPLINK, true);
        node.add_route(Name::root(), UPLINK, 0);
        node.add_route(name("/mobile/A"), APP_FACE, 0);
        node
    }

    fn redirect(seq: u64, nonce: u32) -> Interest {
        Interest::new(name("/mobile/A").append(seq.to_string()), nonce)
            .with_trace(name("/mobile/A"), TraceFlag::Redirected)
    }

    #[test]
    fn test_start_announces_and_records_trace() {
        let mut node = mobile_node();
        node.start(Timestamp::ZERO);

        let out = node.take_outgoing();
        assert_eq!(out.len(), 1);
        let (face, Packet::Interest(announce)) = &out[0] else {
            panic!("expected interest");
        };
        assert_eq!(*face, UPLINK);
        assert_eq!(announce.trace_flag, TraceFlag::Announce);
        assert_eq!(node.trace_names(), vec![name("/mobile/A")]);
    }

    #[test]
    fn test_redirect_reaches_app_and_data_returns() {
        let mut node = mobile_node();
        node.start(Timestamp::ZERO);
        node.take_outgoing();

        node.handle_packet(UPLINK, Packet::Interest(redirect(0, 99)), Timestamp::from_millis(100));

        let out = node.take_outgoing();
        assert_eq!(out.len(), 1);
        let (face, Packet::Data(data)) = &out[0] else {
            panic!("expected data");
        };
        assert_eq!(*face, UPLINK);
        assert_eq!(data.name, name("/mobile/A/0"));
        // Only the announcement is still pending.
        assert_eq!(node.forwarder().pit_len(), 1);
        assert_eq!(node.app_stats().map(|s| s.data_sent), Some(1));
    }

    #[test]
    fn test_duplicate_nonce_dropped() {
        let mut node = mobile_node();
        node.start(Timestamp::ZERO);
        node.handle_packet(UPLINK, Packet::Interest(redirect(0, 99)), Timestamp::from_millis(100));
        node.take_outgoing();

        node.handle_packet(UPLINK, Packet::Interest(redirect(0, 99)), Timestamp::from_millis(200));
        assert!(node.take_outgoing().is_empty());
        assert_eq!(node.forwarder().counters().loops_dropped, 1);
    }

    #[test]
    fn test_wakeup_runs_app_schedule() {
        let mut node = mobile_node();
        node.start(Timestamp::ZERO);
        node.take_outgoing();
        assert_eq!(node.next_deadline(), Some(Timestamp::from_secs(3)));

        node.handle_wakeup(Timestamp::from_secs(3));
        let out = node.take_outgoing();
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], (UPLINK, Packet::Interest(i)) if i.trace_flag == TraceFlag::Announce));
        // Re-announcing refreshes the same pending record.
        assert_eq!(node.forwarder().pit_len(), 1);
    }

    #[test]
    fn test_rejected_interest_expires_on_wakeup() {
        let strategy = MulticastStrategy::new(&StrategyConfig::default());
        let mut node = SimNode::new(1, Box::new(strategy));
        node.set_face_up(UPLINK, true);

        node.handle_packet(
            UPLINK,
            Packet::Interest(Interest::new(name("/nowhere"), 1)),
            Timestamp::ZERO,
        );
        assert_eq!(node.forwarder().counters().interests_rejected, 1);
        assert_eq!(node.next_deadline(), Some(Timestamp::ZERO));

        node.handle_wakeup(Timestamp::ZERO);
        assert_eq!(node.forwarder().pit_len(), 0);
        assert_eq!(node.forwarder().counters().pit_expired, 1);
        assert_eq!(node.next_deadline(), None);
    }

    #[test]
    fn test_trace_released_when_announcement_expires() {
        let strategy = TraceForwardingStrategy::new(StrategyConfig::default());
        let mut node = SimNode::new(1, Box::new(strategy));
        node.set_face_up(UPLINK, true);
        node.set_face_up(FaceId(2), true);
        node.add_route(Name::root(), FaceId(2), 0);

        let announce = Interest::new(name("/server"), 5)
            .with_trace(name("/mobile/A"), TraceFlag::Announce)
            .with_lifetime(Duration::from_secs(2));
        node.handle_packet(UPLINK, Packet::Interest(announce), Timestamp::ZERO);
        assert_eq!(node.trace_names(), vec![name("/mobile/A")]);

        node.handle_wakeup(Timestamp::from_secs(2));
        assert!(node.trace_names().is_empty());
        assert!(node
            .debug_events()
            .iter()
            .any(|(_, e)| matches!(e, DebugEvent::TraceErased { .. })));
    }

    #[test]
    fn test_unsolicited_data_counted() {
        let mut node = mobile_node();
        node.handle_packet(
            UPLINK,
            Packet::Data(Data::new(name("/mobile/A/9"), Vec::new())),
            Timestamp::ZERO,
        );
        assert_eq!(node.forwarder().counters().unsolicited_data, 1);
        assert!(node.take_outgoing().is_empty());
    }
}
