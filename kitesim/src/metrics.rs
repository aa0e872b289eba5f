//! Metrics collection for simulation analysis.

use hashbrown::HashMap;
use kitetrace::{Name, Timestamp};

use crate::app::AppStats;
use crate::topology::NodeId;

/// Trace table state across the network at a point in time.
#[derive(Debug, Clone)]
pub struct TraceSnapshot {
    /// When this snapshot was taken.
    pub time: Timestamp,
    /// Trace names each node's strategy holds.
    pub trace_names: HashMap<NodeId, Vec<Name>>,
    /// Pending interest count per node.
    pub pit_sizes: HashMap<NodeId, usize>,
}

impl TraceSnapshot {
    pub fn new(time: Timestamp) -> Self {
        Self {
            time,
            trace_names: HashMap::new(),
            pit_sizes: HashMap::new(),
        }
    }

    pub fn record_node(&mut self, node: NodeId, trace_names: Vec<Name>, pit_size: usize) {
        self.trace_names.insert(node, trace_names);
        self.pit_sizes.insert(node, pit_size);
    }

    pub fn holds_trace(&self, node: NodeId, trace_name: &Name) -> bool {
        self.trace_names
            .get(&node)
            .is_some_and(|names| names.contains(trace_name))
    }

    /// Nodes holding `trace_name`, ascending.
    pub fn nodes_holding(&self, trace_name: &Name) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .trace_names
            .iter()
            .filter(|(_, names)| names.contains(trace_name))
            .map(|(&id, _)| id)
            .collect();
        nodes.sort_unstable();
        nodes
    }

    pub fn total_traces(&self) -> usize {
        self.trace_names.values().map(Vec::len).sum()
    }

    pub fn total_pending(&self) -> usize {
        self.pit_sizes.values().sum()
    }
}

/// Simulation metrics collected over time.
#[derive(Debug, Clone, Default)]
pub struct SimMetrics {
    /// Packets handed to a link.
    pub packets_sent: u64,
    /// Packets lost to link loss or an inactive link.
    pub packets_dropped: u64,
    pub packets_delivered: u64,
    pub snapshots: Vec<TraceSnapshot>,
}

impl SimMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_snapshot(&mut self, snapshot: TraceSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn latest_snapshot(&self) -> Option<&TraceSnapshot> {
        self.snapshots.last()
    }

    /// Latest snapshot taken at or before `time`.
    pub fn snapshot_at(&self, time: Timestamp) -> Option<&TraceSnapshot> {
        self.snapshots.iter().rev().find(|s| s.time <= time)
    }

    /// First time `node` was seen holding `trace_name`.
    pub fn first_seen(&self, node: NodeId, trace_name: &Name) -> Option<Timestamp> {
        self.snapshots
            .iter()
            .find(|s| s.holds_trace(node, trace_name))
            .map(|s| s.time)
    }
}

/// Result of running a simulation.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Final simulation time.
    pub end_time: Timestamp,
    pub metrics: SimMetrics,
    /// Whether simulation ended due to event queue exhaustion (vs time limit).
    pub queue_exhausted: bool,
    /// Application counters per node that runs one.
    pub app_stats: HashMap<NodeId, AppStats>,
}

impl SimulationResult {
    pub fn app(&self, node: NodeId) -> AppStats {
        self.app_stats.get(&node).copied().unwrap_or_default()
    }

    /// Fraction of sent packets that arrived.
    pub fn delivery_ratio(&self) -> f64 {
        if self.metrics.packets_sent == 0 {
            return 1.0;
        }
        self.metrics.packets_delivered as f64 / self.metrics.packets_sent as f64
    }
}
