#![forbid(unsafe_code)]
//! kitetrace - Trace tables and trace-aware forwarding for named-data mobility
//!
//! A mobile producer periodically sends an *announcement*: an interest that
//! carries a trace name identifying the mobile. Every forwarder on the way
//! records where it came from. Consumers then send *redirected* interests
//! naming that trace, and forwarders send them back along the most recent
//! reverse path instead of relying on name-based routes alone.
//!
//! # Key Properties
//!
//! - One trace entry per trace name per strategy instance
//! - Trace entries hold face and pending-record handles, never ownership
//! - Redirects that find no usable trace fall back to FIB forwarding
//! - The inbound face is never part of a fan-out
//! - Entry lifetime follows the pending record, optionally capped by a timer
//!
//! # Example
//!
//! ```
//! use kitetrace::traits::test_impls::MockForwarder;
//! use kitetrace::{FaceId, Interest, Strategy, StrategyConfig, TraceFlag, TraceForwardingStrategy};
//!
//! let mut host = MockForwarder::new().with_next_hops(&[FaceId(9)]);
//! let mut strategy = TraceForwardingStrategy::new(StrategyConfig::default());
//!
//! // The mobile announces itself on face 1.
//! let announce = Interest::new("/server".parse().unwrap(), 1)
//!     .with_trace("/mobile/A".parse().unwrap(), TraceFlag::Announce);
//! let pit = host.receive(FaceId(1), &announce);
//! strategy.after_receive_interest(&mut host, FaceId(1), &announce, pit);
//! assert_eq!(strategy.trace_table().len(), 1);
//!
//! // A redirected interest from face 2 follows the trace back to face 1.
//! let redirect = Interest::new("/mobile/A/0".parse().unwrap(), 2)
//!     .with_trace("/mobile/A".parse().unwrap(), TraceFlag::Redirected);
//! let pit = host.receive(FaceId(2), &redirect);
//! strategy.after_receive_interest(&mut host, FaceId(2), &redirect, pit);
//! assert_eq!(host.sent.last().map(|(_, face, _)| *face), Some(FaceId(1)));
//! ```
//!
//! # Module Structure
//!
//! - [`types`] - Interests, data, handles, trace flags
//! - [`name`] - Hierarchical names
//! - [`traits`] - Forwarder (host) and Strategy traits
//! - [`trace_table`] / [`interest_trace_table`] - Trace storage
//! - [`strategy`] - Trace forwarding decisions
//! - [`algorithm`] - Eligibility checks and FIB fan-out
//! - [`registry`] - Strategy lookup by name

pub mod algorithm;
pub mod collections;
pub mod config;
pub mod debug;
pub mod error;
pub mod interest_trace_table;
pub mod multicast;
pub mod name;
pub mod registry;
pub mod strategy;
pub mod time;
pub mod trace_entry;
pub mod trace_table;
pub mod traits;
pub mod types;

pub use config::{StrategyConfig, SubscriberMode};
pub use debug::{DebugEvent, TableKind};
pub use error::{NameError, RegistryError, TraceFlagError};
pub use interest_trace_table::{InterestTraceEntry, InterestTraceTable};
pub use multicast::MulticastStrategy;
pub use name::Name;
pub use registry::{StrategyFactory, StrategyRegistry};
pub use strategy::TraceForwardingStrategy;
pub use time::{Duration, Timestamp};
pub use trace_entry::TraceEntry;
pub use trace_table::TraceTable;
pub use traits::{Forwarder, Strategy};
pub use types::{
    Data, EntryId, FaceId, InRecord, Interest, MatchMode, NextHop, PitToken, TimerId, TraceFlag,
    DEFAULT_INTEREST_LIFETIME, MULTICAST_STRATEGY, TRACE_FORWARDING_STRATEGY,
};
