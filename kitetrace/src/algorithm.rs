//! Eligibility checks and FIB fan-out shared by strategies.

use tracing::debug;

use crate::debug::DebugEvent;
use crate::traits::Forwarder;
use crate::types::{FaceId, Interest, NextHop, PitToken};

/// Scope and legacy checks for sending the pending interest on `out_face`.
pub fn can_forward_to_face(
    host: &dyn Forwarder,
    pit: PitToken,
    in_face: FaceId,
    interest: &Interest,
    out_face: FaceId,
) -> bool {
    !host.would_violate_scope(in_face, interest, out_face) && host.can_forward_to_legacy(pit, out_face)
}

/// Like [`can_forward_to_face`], and never back out the inbound face.
pub fn can_forward_to_next_hop(
    host: &dyn Forwarder,
    pit: PitToken,
    in_face: FaceId,
    interest: &Interest,
    hop: &NextHop,
) -> bool {
    hop.face != in_face && can_forward_to_face(host, pit, in_face, interest, hop.face)
}

pub fn has_face_for_forwarding(
    host: &dyn Forwarder,
    pit: PitToken,
    in_face: FaceId,
    interest: &Interest,
    hops: &[NextHop],
) -> bool {
    hops.iter()
        .any(|hop| can_forward_to_next_hop(host, pit, in_face, interest, hop))
}

/// Standard forwarding: send to every eligible FIB next hop.
///
/// Rejects the pending interest when no next hop is eligible. Returns the
/// faces the interest went out on, empty after a rejection.
pub fn forward_multicast(
    host: &mut dyn Forwarder,
    pit: PitToken,
    in_face: FaceId,
    interest: &Interest,
) -> Vec<FaceId> {
    let hops = host.lookup_fib(pit);
    if !has_face_for_forwarding(&*host, pit, in_face, interest, &hops) {
        debug!(
            name = %interest.name,
            in_face = %in_face,
            pit = %pit,
            next_hops = hops.len(),
            "no eligible next hop, rejecting"
        );
        host.emit(DebugEvent::Rejected {
            name: interest.name.clone(),
            pit,
        });
        host.reject_pending_interest(pit);
        return Vec::new();
    }

    let mut sent = Vec::with_capacity(hops.len());
    for hop in &hops {
        if can_forward_to_next_hop(&*host, pit, in_face, interest, hop) {
            host.send_interest(pit, hop.face, interest);
            sent.push(hop.face);
        }
    }
    host.emit(DebugEvent::MulticastForwarded {
        name: interest.name.clone(),
        faces: sent.clone(),
    });
    sent
}
