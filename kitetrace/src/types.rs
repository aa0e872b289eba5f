//! Core types and constants for trace forwarding.

use core::fmt;

use crate::error::TraceFlagError;
use crate::name::Name;
use crate::time::{Duration, Timestamp};

// Strategy identifiers under which the host selects a strategy per prefix.
pub const TRACE_FORWARDING_STRATEGY: &str = "/localhost/nfd/strategy/trace-forwarding";
pub const MULTICAST_STRATEGY: &str = "/localhost/nfd/strategy/multicast";

/// Interest lifetime when the sender does not set one.
pub const DEFAULT_INTEREST_LIFETIME: Duration = Duration::from_secs(4);

/// Host face handle. Entries hold the handle, the host owns the face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceId(pub u32);

/// Handle to a host pending-interest record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PitToken(pub u64);

/// Identity of a trace entry within its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u64);

/// Handle to a host-scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face{}", self.0)
    }
}

impl fmt::Display for PitToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pit{}", self.0)
    }
}

/// How an interest takes part in trace forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TraceFlag {
    /// Ordinary interest.
    #[default]
    None = 0,
    /// "I am reachable here", or a request to be pulled toward a recorded trace.
    Announce = 1,
    /// Forward along a previously recorded trace.
    Redirected = 2,
}

impl TryFrom<u8> for TraceFlag {
    type Error = TraceFlagError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TraceFlag::None),
            1 => Ok(TraceFlag::Announce),
            2 => Ok(TraceFlag::Redirected),
            other => Err(TraceFlagError(other)),
        }
    }
}

impl From<TraceFlag> for u8 {
    fn from(flag: TraceFlag) -> u8 {
        flag as u8
    }
}

/// Which name of an interest is compared against a stored trace name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    ByName,
    ByTraceName,
}

/// A request for named content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interest {
    pub name: Name,
    pub trace_name: Option<Name>,
    pub trace_flag: TraceFlag,
    pub nonce: u32,
    pub lifetime: Duration,
}

impl Interest {
    pub fn new(name: Name, nonce: u32) -> Self {
        Self {
            name,
            trace_name: None,
            trace_flag: TraceFlag::None,
            nonce,
            lifetime: DEFAULT_INTEREST_LIFETIME,
        }
    }

    pub fn with_trace(mut self, trace_name: Name, flag: TraceFlag) -> Self {
        self.trace_name = Some(trace_name);
        self.trace_flag = flag;
        self
    }

    pub fn with_flag(mut self, flag: TraceFlag) -> Self {
        self.trace_flag = flag;
        self
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn has_trace_name(&self) -> bool {
        self.trace_name.is_some()
    }
}

/// A named response satisfying pending interests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    pub name: Name,
    pub payload: Vec<u8>,
}

impl Data {
    pub fn new(name: Name, payload: Vec<u8>) -> Self {
        Self { name, payload }
    }
}

/// FIB next hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextHop {
    pub face: FaceId,
    pub cost: u32,
}

/// A downstream face waiting on a pending interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InRecord {
    pub face: FaceId,
    pub nonce: u32,
    pub expiry: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_flag_conversion() {
        assert_eq!(TraceFlag::try_from(0), Ok(TraceFlag::None));
        assert_eq!(TraceFlag::try_from(1), Ok(TraceFlag::Announce));
        assert_eq!(TraceFlag::try_from(2), Ok(TraceFlag::Redirected));
        assert_eq!(TraceFlag::try_from(3), Err(TraceFlagError(3)));
        assert_eq!(u8::from(TraceFlag::Redirected), 2);
    }

    #[test]
    fn test_interest_builder() {
        let interest = Interest::new("/server".parse().unwrap(), 7)
            .with_trace("/mobile/A".parse().unwrap(), TraceFlag::Announce)
            .with_lifetime(Duration::from_secs(10));

        assert!(interest.has_trace_name());
        assert_eq!(interest.trace_flag, TraceFlag::Announce);
        assert_eq!(interest.lifetime, Duration::from_secs(10));
        assert_eq!(Interest::new(Name::root(), 1).lifetime, DEFAULT_INTEREST_LIFETIME);
    }
}
