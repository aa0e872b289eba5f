//! Baseline strategy: FIB fan-out only, trace fields ignored.

use crate::algorithm::forward_multicast;
use crate::config::StrategyConfig;
use crate::name::Name;
use crate::traits::{Forwarder, Strategy};
use crate::types::{FaceId, Interest, PitToken, MULTICAST_STRATEGY};

pub struct MulticastStrategy {
    name: Name,
}

impl MulticastStrategy {
    pub fn new(_config: &StrategyConfig) -> Self {
        Self {
            name: Name::from_components(MULTICAST_STRATEGY.split('/')),
        }
    }
}

impl Strategy for MulticastStrategy {
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
        forward_multicast(host, pit, in_face, interest);
    }

    fn before_expire_pending_interest(&mut self, _host: &mut dyn Forwarder, _pit: PitToken) {}
}
