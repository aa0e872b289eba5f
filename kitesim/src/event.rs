//! Event types and priority queue ordering for discrete event simulation.

use std::cmp::Ordering;

use kitetrace::{Data, FaceId, Interest, Timestamp};

use crate::topology::NodeId;

/// Unique sequence number for deterministic event ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A packet on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Interest(Interest),
    Data(Data),
}

/// Scenario actions that can be scheduled during simulation.
#[derive(Debug, Clone)]
pub enum ScenarioAction {
    DisableLink { a: NodeId, b: NodeId },
    EnableLink { a: NodeId, b: NodeId },
    /// Move `mobile` from access router `from` to `to`.
    Handover { mobile: NodeId, from: NodeId, to: NodeId },
    SetLossRate { a: NodeId, b: NodeId, rate: f64 },
    /// Record trace table state for metrics.
    TakeSnapshot,
}

/// Events in the discrete event simulation.
#[derive(Debug, Clone)]
pub enum Event {
    /// Hand a packet to `to`, arriving on its face `face`.
    PacketDelivery {
        to: NodeId,
        face: FaceId,
        from: NodeId,
        packet: Packet,
    },
    /// Run due timers, expiries and application work on a node.
    Wakeup { node: NodeId },
    ScenarioAction(ScenarioAction),
}

/// A scheduled event with timestamp and sequence number for ordering.
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub time: Timestamp,
    pub seq: SequenceNumber,
    pub event: Event,
}

impl ScheduledEvent {
    pub fn new(time: Timestamp, seq: SequenceNumber, event: Event) -> Self {
        Self { time, seq, event }
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap and we pop the earliest event.
        match other.time.cmp(&self.time) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            ord => ord,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BinaryHeap;

    use super::*;

    fn wakeup(ms: u64, seq: u64) -> ScheduledEvent {
        ScheduledEvent::new(
            Timestamp::from_millis(ms),
            SequenceNumber::new(seq),
            Event::Wakeup { node: 0 },
        )
    }

    #[test]
    fn test_event_ordering() {
        // Earlier time is "greater" in min-heap terms.
        assert!(wakeup(5, 2) > wakeup(10, 1));
        // Same time: lower sequence first.
        assert!(wakeup(10, 1) > wakeup(10, 2));
    }

    #[test]
    fn test_heap_pops_in_time_order() {
        let mut heap = BinaryHeap::new();
        heap.push(wakeup(30, 0));
        heap.push(wakeup(10, 1));
        heap.push(wakeup(10, 2));
        heap.push(wakeup(20, 3));

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop()).map(|e| e.seq.value()).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
    }
}
