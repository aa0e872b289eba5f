//! Discrete event simulator for trace-forwarding networks.

use std::collections::BinaryHeap;

use hashbrown::HashMap;
use kitetrace::{Duration, FaceId, Timestamp};
use tracing::{debug, trace, warn};

use crate::event::{Event, Packet, ScenarioAction, ScheduledEvent, SequenceNumber};
use crate::metrics::{SimMetrics, SimulationResult, TraceSnapshot};
use crate::node::SimNode;
use crate::topology::{NodeId, Topology};

/// Discrete event simulator over a set of [`SimNode`]s.
pub struct Simulator {
    nodes: HashMap<NodeId, SimNode>,
    topology: Topology,
    current_time: Timestamp,
    event_queue: BinaryHeap<ScheduledEvent>,
    metrics: SimMetrics,
    /// Tie-breaker for events scheduled at the same time.
    next_seq: u64,
    /// LCG state driving link loss.
    rng_state: u64,
    /// Earliest wakeup already queued per node.
    wakeups: HashMap<NodeId, Timestamp>,
    snapshot_interval: Option<Duration>,
    next_snapshot: Option<Timestamp>,
}

impl Simulator {
    /// Empty simulator; `seed` drives link loss.
    pub fn new(seed: u64) -> Self {
        Self {
            nodes: HashMap::new(),
            topology: Topology::new(),
            current_time: Timestamp::ZERO,
            event_queue: BinaryHeap::new(),
            metrics: SimMetrics::new(),
            next_seq: 0,
            rng_state: seed,
            wakeups: HashMap::new(),
            snapshot_interval: None,
            next_snapshot: None,
        }
    }

    /// Set the network topology. Call before adding nodes.
    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Set the snapshot interval for automatic trace state recording.
    pub fn with_snapshot_interval(mut self, interval: Duration) -> Self {
        if interval == Duration::ZERO {
            return self;
        }
        self.snapshot_interval = Some(interval);
        self.next_snapshot = Some(self.current_time + interval);
        self
    }

    /// Add a node, bring its faces in line with the topology and start its
    /// application.
    pub fn add_node(&mut self, mut node: SimNode) -> NodeId {
        let id = node.id();
        for (face, up) in self.topology.faces(id) {
            node.set_face_up(face, up);
        }
        node.start(self.current_time);
        self.nodes.insert(id, node);

        self.collect_outgoing(id);
        self.schedule_wakeup(id);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SimNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SimNode> {
        self.nodes.get_mut(&id)
    }

    /// All node IDs, ascending.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn current_time(&self) -> Timestamp {
        self.current_time
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn metrics(&self) -> &SimMetrics {
        &self.metrics
    }

    /// Schedule an event.
    pub fn schedule(&mut self, time: Timestamp, event: Event) {
        let seq = SequenceNumber::new(self.next_seq);
        self.next_seq += 1;
        self.event_queue.push(ScheduledEvent::new(time, seq, event));
    }

    pub fn schedule_action(&mut self, time: Timestamp, action: ScenarioAction) {
        self.schedule(time, Event::ScenarioAction(action));
    }

    /// Process every event up to and including `end_time`.
    pub fn run_until(&mut self, end_time: Timestamp) -> SimulationResult {
        while self
            .event_queue
            .peek()
            .is_some_and(|event| event.time <= end_time)
        {
            let Some(event) = self.event_queue.pop() else {
                break;
            };
            self.take_snapshots_before(event.time);
            self.advance_time(event.time);
            self.process_event(event.event);
        }

        self.take_snapshots_before(end_time);
        self.advance_time(end_time);

        // Final snapshot
        self.take_snapshot();

        self.result()
    }

    pub fn run_for(&mut self, duration: Duration) -> SimulationResult {
        self.run_until(self.current_time + duration)
    }

    /// Process at most `max_events` events, ignoring time limits.
    pub fn run_events(&mut self, max_events: usize) -> SimulationResult {
        let mut processed = 0;

        while let Some(event) = self.event_queue.pop() {
            self.take_snapshots_before(event.time);
            self.advance_time(event.time);
            self.process_event(event.event);

            processed += 1;
            if processed >= max_events {
                break;
            }
        }

        self.take_snapshot();

        self.result()
    }

    fn result(&self) -> SimulationResult {
        let app_stats = self
            .nodes
            .iter()
            .filter_map(|(&id, node)| node.app_stats().map(|stats| (id, stats)))
            .collect();
        SimulationResult {
            end_time: self.current_time,
            metrics: self.metrics.clone(),
            queue_exhausted: self.event_queue.is_empty(),
            app_stats,
        }
    }

    fn advance_time(&mut self, time: Timestamp) {
        if time > self.current_time {
            self.current_time = time;
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::PacketDelivery {
                to,
                face,
                from: _,
                packet,
            } => {
                self.deliver_packet(to, face, packet);
            }
            Event::Wakeup { node } => {
                self.wake(node);
            }
            Event::ScenarioAction(action) => {
                self.execute_action(action);
            }
        }
    }

    /// Deliver a packet to a node.
    fn deliver_packet(&mut self, to: NodeId, face: FaceId, packet: Packet) {
        let now = self.current_time;
        let Some(node) = self.nodes.get_mut(&to) else {
            return;
        };
        if !node.forwarder().face_is_up(face) {
            self.metrics.packets_dropped += 1;
            return;
        }
        node.handle_packet(face, packet, now);
        self.metrics.packets_delivered += 1;

        // Collect and route outgoing packets (separate borrow)
        self.collect_outgoing(to);
        self.schedule_wakeup(to);
    }

    fn wake(&mut self, node_id: NodeId) {
        let now = self.current_time;
        if self.wakeups.get(&node_id) == Some(&now) {
            self.wakeups.remove(&node_id);
        }
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.handle_wakeup(now);
        }
        self.collect_outgoing(node_id);
        self.schedule_wakeup(node_id);
    }

    /// Queue a wakeup for the node's next deadline unless one at or before
    /// it is already queued.
    fn schedule_wakeup(&mut self, node_id: NodeId) {
        let Some(deadline) = self.nodes.get(&node_id).and_then(SimNode::next_deadline) else {
            return;
        };
        let at = deadline.max(self.current_time);
        if self.wakeups.get(&node_id).is_some_and(|&queued| queued <= at) {
            return;
        }
        self.wakeups.insert(node_id, at);
        self.schedule(at, Event::Wakeup { node: node_id });
    }

    /// Collect outgoing packets from a node and route them.
    fn collect_outgoing(&mut self, sender: NodeId) {
        let packets = match self.nodes.get_mut(&sender) {
            Some(node) => node.take_outgoing(),
            None => return,
        };

        for (face, packet) in packets {
            self.route_packet(sender, face, packet);
        }
    }

    /// Put a packet on the link behind `face`.
    fn route_packet(&mut self, sender: NodeId, face: FaceId, packet: Packet) {
        self.metrics.packets_sent += 1;

        // Extract link properties before the random check
        let (peer, peer_face, active, loss_rate, delay) = match self.topology.neighbor_on(sender, face) {
            Some((peer, peer_face, link)) => (peer, peer_face, link.active, link.loss_rate, link.delay),
            None => {
                warn!(node = sender, face = %face, "no link behind face");
                self.metrics.packets_dropped += 1;
                return;
            }
        };

        if !active || (loss_rate > 0.0 && self.random_f64() < loss_rate) {
            trace!(from = sender, to = peer, "packet dropped");
            self.metrics.packets_dropped += 1;
            return;
        }

        self.schedule(
            self.current_time + delay,
            Event::PacketDelivery {
                to: peer,
                face: peer_face,
                from: sender,
                packet,
            },
        );
    }

    /// Bring a link up or down on the topology and both attached faces.
    fn set_link(&mut self, a: NodeId, b: NodeId, active: bool) {
        if !self.topology.set_active(a, b, active) {
            warn!(a, b, "no such link");
            return;
        }
        for (node, peer) in [(a, b), (b, a)] {
            let Some(face) = self.topology.face_toward(node, peer) else {
                continue;
            };
            if let Some(sim_node) = self.nodes.get_mut(&node) {
                sim_node.set_face_up(face, active);
            }
        }
    }

    fn execute_action(&mut self, action: ScenarioAction) {
        match action {
            ScenarioAction::DisableLink { a, b } => {
                self.set_link(a, b, false);
            }
            ScenarioAction::EnableLink { a, b } => {
                self.set_link(a, b, true);
            }
            ScenarioAction::Handover { mobile, from, to } => {
                debug!(mobile, from, to, now = %self.current_time, "handover");
                self.set_link(mobile, from, false);
                self.set_link(mobile, to, true);
            }
            ScenarioAction::SetLossRate { a, b, rate } => {
                if let Some(link) = self.topology.get_link_mut(a, b) {
                    link.loss_rate = rate.clamp(0.0, 1.0);
                }
            }
            ScenarioAction::TakeSnapshot => {
                self.take_snapshot();
            }
        }
    }

    /// Take the interval snapshots due strictly before `time`.
    fn take_snapshots_before(&mut self, time: Timestamp) {
        while let Some(next) = self.next_snapshot.filter(|&next| next < time) {
            self.advance_time(next);
            self.take_snapshot();
            self.next_snapshot = self.snapshot_interval.map(|interval| next + interval);
        }
    }

    /// Record every node's trace names and pending record count.
    pub fn take_snapshot(&mut self) {
        let mut snapshot = TraceSnapshot::new(self.current_time);

        for (&id, node) in &self.nodes {
            snapshot.record_node(id, node.trace_names(), node.forwarder().pit_len());
        }

        self.metrics.add_snapshot(snapshot);
    }

    /// Uniform sample in [0, 1).
    fn random_f64(&mut self) -> f64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        // Top 53 bits: exact in an f64 and strictly below 1.0.
        (self.rng_state >> 11) as f64 / (1u64 << 53) as f64
    }
}
