//! kitesim - Discrete event simulator for trace forwarding.
//!
//! Runs small named-data networks in a single process, with every forwarder
//! hosting a strategy from [`kitetrace`], to compare how interests reach a
//! moving producer.
//!
//! # Features
//!
//! - **Discrete event simulation**: No real-time delays, deterministic ordering
//! - **Minimal forwarder**: PIT aggregation, longest-prefix FIB, nonce loop detection
//! - **Applications**: Announcing mobile, following server, trace puller
//! - **Scenario builder**: Chain and handover layouts with scheduled link changes
//! - **Metrics collection**: Trace table snapshots and per-application counters
//!
//! # Example
//!
//! ```
//! use kitesim::{upload, Duration, Timestamp};
//!
//! // Hand the mobile over to the second access router after 10 seconds.
//! let handover = Timestamp::from_secs(10);
//! let (mut sim, nodes) = upload().handover_at(handover).build().unwrap();
//! let result = sim.run_for(Duration::from_secs(20));
//!
//! // Uploads keep arriving after the move.
//! let server = result.app(nodes.server);
//! assert!(server.last_data_at.is_some_and(|t| t > handover));
//! ```
//!
//! # Architecture
//!
//! The simulator uses a priority queue of events ordered by (time, sequence_number).
//! The main loop:
//! 1. Pop next event from queue
//! 2. Advance simulation time
//! 3. Process event (deliver a packet, wake a node, apply a scenario action)
//! 4. Collect outgoing packets
//! 5. Route through topology, schedule deliveries and the node's next wakeup

pub mod app;
pub mod event;
pub mod forwarder;
pub mod metrics;
pub mod node;
pub mod scenario;
pub mod sim;
pub mod topology;

pub use app::{AppStats, Application, KiteMobile, KitePuller, KiteServer};
pub use event::{Event, Packet, ScenarioAction, ScheduledEvent};
pub use forwarder::{ForwarderCounters, SimForwarder};
pub use kitetrace::{Duration, Timestamp};
pub use metrics::{SimMetrics, SimulationResult, TraceSnapshot};
pub use node::SimNode;
pub use scenario::{simple_kite, upload, ScenarioBuilder, ScenarioNodes};
pub use sim::Simulator;
pub use topology::{Link, NodeId, Topology, APP_FACE};
