//! Debug events for tracing strategy decisions.
//!
//! Strategies push these to the host through
//! [`Forwarder::emit`](crate::traits::Forwarder::emit). The simulator keeps
//! them per node so tests can assert on the decision sequence.

use crate::name::Name;
use crate::types::{EntryId, FaceId, PitToken};

/// Table a trace entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Trace,
    InterestTrace,
}

/// Decisions taken by a forwarding strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugEvent {
    /// New trace entry recorded.
    TraceRecorded {
        table: TableKind,
        entry: EntryId,
        trace_name: Name,
        face: FaceId,
        pit: PitToken,
    },
    /// Re-announcement moved an entry to a new face.
    TraceFaceUpdated {
        entry: EntryId,
        trace_name: Name,
        from: FaceId,
        to: FaceId,
    },
    /// A known trace gained a subscriber on another face.
    SubscriberAdded {
        entry: EntryId,
        trace_name: Name,
        face: FaceId,
    },
    /// Announced interest pulled toward a recorded trace.
    Pulled {
        trace_name: Name,
        out_face: FaceId,
    },
    /// No trace recorded for an announced name.
    PullMissed { name: Name },
    /// Redirected interest sent along a trace.
    RedirectedForwarded {
        trace_name: Name,
        faces: Vec<FaceId>,
    },
    /// Redirected interest found no usable trace and fell back to the FIB.
    RedirectFellBack { trace_name: Option<Name> },
    /// FIB-based fan-out.
    MulticastForwarded { name: Name, faces: Vec<FaceId> },
    /// No eligible next hop, pending interest rejected.
    Rejected { name: Name, pit: PitToken },
    /// Trace entry removed.
    TraceErased {
        table: TableKind,
        entry: EntryId,
        trace_name: Name,
        reason: &'static str,
    },
}
