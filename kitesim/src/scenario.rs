//! Scenario builder for setting up and running simulations.
//!
//! Two layouts are provided:
//!
//! - [`simple_kite`]: server, one router, mobile in a chain.
//! - [`upload`]: a server behind a core router with two access routers; the
//!   mobile starts on access A and can be handed over to access B.

use kitetrace::{
    Duration, Name, RegistryError, StrategyConfig, StrategyRegistry, Timestamp,
    TRACE_FORWARDING_STRATEGY,
};

use tracing::warn;

use crate::app::{Application, KiteMobile, KitePuller, KiteServer, DEFAULT_ANNOUNCE_INTERVAL};
use crate::event::ScenarioAction;
use crate::metrics::SimulationResult;
use crate::node::SimNode;
use crate::sim::Simulator;
use crate::topology::{Link, NodeId, Topology, APP_FACE};

/// Prefix served by the server application.
pub const SERVER_PREFIX: &str = "/server";
/// Prefix and trace name of the mobile producer.
pub const MOBILE_PREFIX: &str = "/mobile/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    SimpleKite,
    Upload,
}

/// Roles in a built scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioNodes {
    pub server: NodeId,
    /// Router next to the server.
    pub core: NodeId,
    /// Access routers, in handover order. Empty for the simple layout.
    pub access: Vec<NodeId>,
    pub mobile: NodeId,
    /// Node running the puller, if configured.
    pub puller: Option<NodeId>,
}

/// Builder for simulation scenarios.
pub struct ScenarioBuilder {
    layout: Layout,
    /// RNG seed for determinism.
    seed: u64,
    /// Strategy every forwarder runs.
    strategy: Name,
    config: StrategyConfig,
    /// Global packet loss rate.
    loss_rate: f64,
    /// Link delay.
    delay: Duration,
    announce_interval: Duration,
    handover: Option<Timestamp>,
    /// Puller start time and round interval.
    puller: Option<(Timestamp, Duration)>,
    /// Scheduled actions.
    actions: Vec<(Timestamp, ScenarioAction)>,
    /// Snapshot interval.
    snapshot_interval: Option<Duration>,
}

impl ScenarioBuilder {
    fn new(layout: Layout) -> Self {
        Self {
            layout,
            seed: 42,
            strategy: Name::from_components(TRACE_FORWARDING_STRATEGY.split('/')),
            config: StrategyConfig::default(),
            loss_rate: 0.0,
            delay: Duration::from_millis(10),
            announce_interval: DEFAULT_ANNOUNCE_INTERVAL,
            handover: None,
            puller: None,
            actions: Vec::new(),
            snapshot_interval: None,
        }
    }

    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run `strategy` on every forwarder, resolved through the built-in
    /// registry at build time.
    pub fn with_strategy(mut self, strategy: Name) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_strategy_config(mut self, config: StrategyConfig) -> Self {
        self.config = config;
        self
    }

    /// Set global packet loss rate.
    pub fn with_loss_rate(mut self, rate: f64) -> Self {
        self.loss_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Set link delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_announce_interval(mut self, interval: Duration) -> Self {
        self.announce_interval = interval;
        self
    }

    /// Move the mobile from access A to access B at `time`. Upload layout
    /// only.
    pub fn handover_at(mut self, time: Timestamp) -> Self {
        self.handover = Some(time);
        self
    }

    /// Run a puller on the core router, first round at `start`.
    pub fn with_puller(mut self, start: Timestamp, interval: Duration) -> Self {
        self.puller = Some((start, interval));
        self
    }

    /// Set snapshot interval for metrics collection.
    pub fn with_snapshot_interval(mut self, interval: Duration) -> Self {
        self.snapshot_interval = Some(interval);
        self
    }

    /// Schedule a snapshot at the specified time.
    pub fn snapshot_at(mut self, time: Timestamp) -> Self {
        self.actions.push((time, ScenarioAction::TakeSnapshot));
        self
    }

    /// Schedule an arbitrary action.
    pub fn action_at(mut self, time: Timestamp, action: ScenarioAction) -> Self {
        self.actions.push((time, action));
        self
    }

    /// Build the simulator with all nodes and topology.
    ///
    /// Fails if the configured strategy is not registered.
    pub fn build(self) -> Result<(Simulator, ScenarioNodes), RegistryError> {
        let registry = StrategyRegistry::with_builtin();
        let forwarder = |id: NodeId| -> Result<SimNode, RegistryError> {
            Ok(SimNode::new(id, registry.create(&self.strategy, &self.config)?))
        };
        let server_prefix = Name::from_components(SERVER_PREFIX.split('/'));
        let mobile_prefix = Name::from_components(MOBILE_PREFIX.split('/'));
        let link = Link::new()
            .with_delay(self.delay)
            .with_loss_rate(self.loss_rate);
        let mut topo = Topology::new().with_default_link(link.clone());

        let (nodes, mut roles) = match self.layout {
            Layout::SimpleKite => {
                let (server, core, mobile) = (0, 1, 2);
                let (s_c, c_s) = topo.connect(server, core);
                let (c_m, m_c) = topo.connect(core, mobile);

                let mut server_node = forwarder(server)?;
                server_node.add_route(server_prefix, APP_FACE, 0);
                server_node.add_route(Name::from_components(["mobile"]), s_c, 0);

                let mut core_node = forwarder(core)?;
                core_node.add_route(Name::root(), c_s, 0);
                core_node.add_route(Name::from_components(["mobile"]), c_m, 0);

                let mut mobile_node = forwarder(mobile)?;
                mobile_node.add_route(Name::root(), m_c, 0);
                mobile_node.add_route(mobile_prefix, APP_FACE, 0);

                let roles = ScenarioNodes {
                    server,
                    core,
                    access: Vec::new(),
                    mobile,
                    puller: None,
                };
                (vec![server_node, core_node, mobile_node], roles)
            }
            Layout::Upload => {
                let (server, core, access_a, access_b, mobile) = (0, 1, 2, 3, 4);
                let (s_c, c_s) = topo.connect(server, core);
                let (c_a, a_c) = topo.connect(core, access_a);
                let (_, b_c) = topo.connect(core, access_b);
                let (a_m, m_a) = topo.connect(access_a, mobile);
                let (b_m, m_b) = topo.add_link(access_b, mobile, link.with_active(false));

                let mut server_node = forwarder(server)?;
                server_node.add_route(server_prefix, APP_FACE, 0);
                server_node.add_route(Name::from_components(["mobile"]), s_c, 0);

                let mut core_node = forwarder(core)?;
                core_node.add_route(Name::root(), c_s, 0);
                core_node.add_route(Name::from_components(["mobile"]), c_a, 0);

                let mut a_node = forwarder(access_a)?;
                a_node.add_route(Name::root(), a_c, 0);
                a_node.add_route(Name::from_components(["mobile"]), a_m, 0);

                let mut b_node = forwarder(access_b)?;
                b_node.add_route(Name::root(), b_c, 0);
                b_node.add_route(Name::from_components(["mobile"]), b_m, 0);

                let mut mobile_node = forwarder(mobile)?;
                mobile_node.add_route(Name::root(), m_a, 0);
                mobile_node.add_route(Name::root(), m_b, 0);
                mobile_node.add_route(mobile_prefix, APP_FACE, 0);

                let roles = ScenarioNodes {
                    server,
                    core,
                    access: vec![access_a, access_b],
                    mobile,
                    puller: None,
                };
                (vec![server_node, core_node, a_node, b_node, mobile_node], roles)
            }
        };
        if self.puller.is_some() {
            roles.puller = Some(roles.core);
        }
        let nodes: Vec<SimNode> = nodes
            .into_iter()
            .map(|node| match self.app_for(node.id(), &roles) {
                Some(app) => node.with_app(app),
                None => node,
            })
            .collect();

        let mut sim = Simulator::new(self.seed).with_topology(topo);
        if let Some(interval) = self.snapshot_interval {
            sim = sim.with_snapshot_interval(interval);
        }
        for node in nodes {
            sim.add_node(node);
        }

        if let Some(at) = self.handover {
            match roles.access.as_slice() {
                [from, to, ..] => sim.schedule_action(
                    at,
                    ScenarioAction::Handover {
                        mobile: roles.mobile,
                        from: *from,
                        to: *to,
                    },
                ),
                _ => warn!("handover needs two access routers, ignoring"),
            }
        }
        for (time, action) in self.actions {
            sim.schedule_action(time, action);
        }

        Ok((sim, roles))
    }

    /// Application for the node playing `id`'s role.
    fn app_for(&self, id: NodeId, roles: &ScenarioNodes) -> Option<Box<dyn Application>> {
        let server_prefix = Name::from_components(SERVER_PREFIX.split('/'));
        let mobile_prefix = Name::from_components(MOBILE_PREFIX.split('/'));
        if id == roles.server {
            return Some(Box::new(KiteServer::new(server_prefix, self.seed.wrapping_add(1))));
        }
        if id == roles.mobile {
            let mobile = KiteMobile::new(server_prefix, mobile_prefix, self.seed.wrapping_add(2))
                .with_interval(self.announce_interval);
            return Some(Box::new(mobile));
        }
        if roles.puller == Some(id) {
            let (start, interval) = self.puller?;
            let puller = KitePuller::new(mobile_prefix, start, interval, self.seed.wrapping_add(3));
            return Some(Box::new(puller));
        }
        None
    }

    /// Build and run the simulation for the specified duration.
    pub fn run_for(self, duration: Duration) -> Result<SimulationResult, RegistryError> {
        let (mut sim, _) = self.build()?;
        Ok(sim.run_for(duration))
    }
}

/// Server, router and mobile in a chain.
pub fn simple_kite() -> ScenarioBuilder {
    ScenarioBuilder::new(Layout::SimpleKite)
}

/// Server, core router, two access routers and a mobile attached to the
/// first.
pub fn upload() -> ScenarioBuilder {
    ScenarioBuilder::new(Layout::Upload)
}

#[cfg(test)]
mod tests {
    use kitetrace::{SubscriberMode, MULTICAST_STRATEGY};

    use super::*;

    const HANDOVER: Timestamp = Timestamp::from_secs(10);

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    fn trace_name() -> Name {
        MOBILE_PREFIX.parse().unwrap()
    }

    #[test]
    fn test_simple_kite_uploads() {
        init_tracing();
        let (mut sim, nodes) = simple_kite().with_seed(7).build().unwrap();
        assert_eq!(sim.node_ids(), vec![0, 1, 2]);

        let result = sim.run_for(Duration::from_secs(10));

        // Announcements at 0, 3, 6 and 9 seconds.
        assert_eq!(result.app(nodes.server).data_received, 4);
        assert_eq!(result.app(nodes.mobile).data_sent, 4);
        let latest = result.metrics.latest_snapshot().unwrap();
        assert_eq!(latest.nodes_holding(&trace_name()), vec![0, 1, 2]);
    }

    #[test]
    fn test_trace_follows_handover() {
        init_tracing();
        let (mut sim, nodes) = upload()
            .handover_at(HANDOVER)
            .with_snapshot_interval(Duration::from_secs(1))
            .build()
            .unwrap();
        let result = sim.run_for(Duration::from_secs(30));

        let server = result.app(nodes.server);
        assert!(server.first_data_at.is_some_and(|t| t < HANDOVER));
        assert!(server.last_data_at.is_some_and(|t| t > HANDOVER));

        // Access B learns the trace once the mobile announces through it.
        let access_b = nodes.access[1];
        let seen = result.metrics.first_seen(access_b, &trace_name());
        assert!(seen.is_some_and(|t| t > HANDOVER));
        assert!(sim
            .node(nodes.core)
            .unwrap()
            .debug_events()
            .iter()
            .any(|(_, e)| matches!(e, kitetrace::DebugEvent::TraceFaceUpdated { .. })));
    }

    #[test]
    fn test_multicast_loses_mobile_after_handover() {
        let multicast = Name::from_components(MULTICAST_STRATEGY.split('/'));
        let (mut sim, nodes) = upload()
            .with_strategy(multicast)
            .handover_at(HANDOVER)
            .build()
            .unwrap();
        let result = sim.run_for(Duration::from_secs(30));

        let server = result.app(nodes.server);
        assert!(server.data_received > 0);
        assert!(server.last_data_at.is_some_and(|t| t < HANDOVER));
        assert!(sim.node(nodes.core).unwrap().trace_names().is_empty());
    }

    #[test]
    fn test_multi_subscriber_mode_follows_handover() {
        let (mut sim, nodes) = upload()
            .with_strategy_config(StrategyConfig::default().with_subscriber_mode(SubscriberMode::Multi))
            .handover_at(HANDOVER)
            .build()
            .unwrap();
        let result = sim.run_for(Duration::from_secs(30));

        assert!(result.app(nodes.server).last_data_at.is_some_and(|t| t > HANDOVER));
    }

    #[test]
    fn test_puller_is_pulled_and_served() {
        init_tracing();
        let (mut sim, nodes) = upload()
            .with_puller(Timestamp::from_secs(4), Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(nodes.puller, Some(nodes.core));

        let result = sim.run_for(Duration::from_secs(20));
        let puller = result.app(nodes.core);
        assert!(puller.pulled > 0);
        assert!(puller.data_received > 0);
        assert!(sim
            .node(nodes.core)
            .unwrap()
            .debug_events()
            .iter()
            .any(|(_, e)| matches!(e, kitetrace::DebugEvent::Pulled { .. })));
    }

    #[test]
    fn test_unknown_strategy_fails_build() {
        let unknown: Name = "/localhost/nfd/strategy/nope".parse().unwrap();
        let err = upload().with_strategy(unknown.clone()).build().err();
        assert_eq!(err, Some(RegistryError::Unknown(unknown)));
    }

    #[test]
    fn test_builder_link_settings() {
        let (sim, nodes) = upload()
            .with_loss_rate(0.25)
            .with_delay(Duration::from_millis(5))
            .build()
            .unwrap();

        let link = sim.topology().get_link(nodes.server, nodes.core).unwrap();
        assert_eq!(link.loss_rate, 0.25);
        assert_eq!(link.delay, Duration::from_millis(5));
        assert!(sim.topology().is_connected(nodes.mobile, nodes.access[0]));
        assert!(!sim.topology().is_connected(nodes.mobile, nodes.access[1]));
    }

    #[test]
    fn test_scheduled_snapshot() {
        let result = simple_kite()
            .snapshot_at(Timestamp::from_secs(2))
            .run_for(Duration::from_secs(4))
            .unwrap();

        // The scheduled snapshot plus the final one.
        assert_eq!(result.metrics.snapshots.len(), 2);
        assert_eq!(result.metrics.snapshots[0].time, Timestamp::from_secs(2));
        assert!(result.metrics.snapshots[0].holds_trace(1, &trace_name()));
    }
}
