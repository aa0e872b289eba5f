//! Applications attached to a node's application face.
//!
//! - [`KiteMobile`] announces its trace toward the server and answers
//!   redirected interests under its own prefix.
//! - [`KiteServer`] answers each announcement with a redirected interest
//!   along the announced trace, uploading toward the mobile.
//! - [`KitePuller`] asks a forwarder to pull it toward a mobile's trace, then
//!   sends redirected interests along it.

use kitetrace::{Data, Duration, Interest, Name, Timestamp, TraceFlag};
use tracing::debug;

use crate::event::Packet;

/// Announcement period of a mobile.
pub const DEFAULT_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(3);
/// Lifetime of announcements, and so of the traces they leave.
pub const DEFAULT_TRACE_LIFETIME: Duration = Duration::from_secs(10);
/// Lifetime of redirected interests.
pub const DEFAULT_TRACING_INTEREST_LIFETIME: Duration = Duration::from_secs(4);

/// Per-application packet counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppStats {
    pub interests_sent: u64,
    pub interests_received: u64,
    pub data_sent: u64,
    pub data_received: u64,
    /// Announcements pulled back to this application.
    pub pulled: u64,
    pub first_data_at: Option<Timestamp>,
    pub last_data_at: Option<Timestamp>,
}

impl AppStats {
    fn record_data(&mut self, now: Timestamp) {
        self.data_received += 1;
        self.first_data_at.get_or_insert(now);
        self.last_data_at = Some(now);
    }
}

/// Application logic behind a node's application face.
pub trait Application {
    /// Called once when the node joins the simulation.
    fn start(&mut self, now: Timestamp) -> Vec<Packet>;

    fn on_interest(&mut self, interest: &Interest, now: Timestamp) -> Vec<Packet>;

    fn on_data(&mut self, data: &Data, now: Timestamp) -> Vec<Packet>;

    /// Called at or after [`next_wakeup`](Self::next_wakeup).
    fn on_wakeup(&mut self, _now: Timestamp) -> Vec<Packet> {
        Vec::new()
    }

    fn next_wakeup(&self) -> Option<Timestamp> {
        None
    }

    fn stats(&self) -> AppStats;
}

/// Deterministic nonce source (64-bit LCG).
#[derive(Debug, Clone)]
pub struct NonceGen(u64);

impl NonceGen {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_nonce(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 32) as u32
    }
}

/// Mobile producer.
pub struct KiteMobile {
    server_prefix: Name,
    mobile_prefix: Name,
    interval: Duration,
    trace_lifetime: Duration,
    next_announce: Option<Timestamp>,
    nonces: NonceGen,
    stats: AppStats,
}

impl KiteMobile {
    pub fn new(server_prefix: Name, mobile_prefix: Name, seed: u64) -> Self {
        Self {
            server_prefix,
            mobile_prefix,
            interval: DEFAULT_ANNOUNCE_INTERVAL,
            trace_lifetime: DEFAULT_TRACE_LIFETIME,
            next_announce: None,
            nonces: NonceGen::new(seed),
            stats: AppStats::default(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_trace_lifetime(mut self, lifetime: Duration) -> Self {
        self.trace_lifetime = lifetime;
        self
    }

    fn announce(&mut self, now: Timestamp) -> Packet {
        self.next_announce = Some(now + self.interval);
        self.stats.interests_sent += 1;
        let interest = Interest::new(self.server_prefix.clone(), self.nonces.next_nonce())
            .with_trace(self.mobile_prefix.clone(), TraceFlag::Announce)
            .with_lifetime(self.trace_lifetime);
        debug!(trace_name = %self.mobile_prefix, now = %now, "announcing");
        Packet::Interest(interest)
    }
}

impl Application for KiteMobile {
    fn start(&mut self, now: Timestamp) -> Vec<Packet> {
        vec![self.announce(now)]
    }

    fn on_interest(&mut self, interest: &Interest, _now: Timestamp) -> Vec<Packet> {
        self.stats.interests_received += 1;
        if interest.trace_flag == TraceFlag::Announce || !self.mobile_prefix.is_prefix_of(&interest.name) {
            return Vec::new();
        }
        self.stats.data_sent += 1;
        vec![Packet::Data(Data::new(interest.name.clone(), b"upload".to_vec()))]
    }

    fn on_data(&mut self, _data: &Data, now: Timestamp) -> Vec<Packet> {
        self.stats.record_data(now);
        Vec::new()
    }

    fn on_wakeup(&mut self, now: Timestamp) -> Vec<Packet> {
        match self.next_announce {
            Some(at) if at <= now => vec![self.announce(now)],
            _ => Vec::new(),
        }
    }

    fn next_wakeup(&self) -> Option<Timestamp> {
        self.next_announce
    }

    fn stats(&self) -> AppStats {
        self.stats
    }
}

/// Server that follows each announcement back to the announcing mobile.
pub struct KiteServer {
    prefix: Name,
    lifetime: Duration,
    seq: u64,
    nonces: NonceGen,
    stats: AppStats,
}

impl KiteServer {
    pub fn new(prefix: Name, seed: u64) -> Self {
        Self {
            prefix,
            lifetime: DEFAULT_TRACING_INTEREST_LIFETIME,
            seq: 0,
            nonces: NonceGen::new(seed),
            stats: AppStats::default(),
        }
    }
}

impl Application for KiteServer {
    fn start(&mut self, _now: Timestamp) -> Vec<Packet> {
        Vec::new()
    }

    fn on_interest(&mut self, interest: &Interest, _now: Timestamp) -> Vec<Packet> {
        self.stats.interests_received += 1;
        let Some(trace_name) = &interest.trace_name else {
            return Vec::new();
        };
        if interest.trace_flag != TraceFlag::Announce || !self.prefix.is_prefix_of(&interest.name) {
            return Vec::new();
        }

        let name = trace_name.clone().append(self.seq.to_string());
        self.seq += 1;
        self.stats.interests_sent += 1;
        debug!(name = %name, "following announcement");
        vec![Packet::Interest(
            Interest::new(name, self.nonces.next_nonce())
                .with_trace(trace_name.clone(), TraceFlag::Redirected)
                .with_lifetime(self.lifetime),
        )]
    }

    fn on_data(&mut self, _data: &Data, now: Timestamp) -> Vec<Packet> {
        self.stats.record_data(now);
        Vec::new()
    }

    fn stats(&self) -> AppStats {
        self.stats
    }
}

/// Consumer that pulls itself toward a mobile's trace.
///
/// Each round sends an announcement named after the target, which forwarders
/// holding the target's trace answer by pulling, then a redirected interest
/// along the trace.
pub struct KitePuller {
    target: Name,
    interval: Duration,
    next_round: Option<Timestamp>,
    seq: u64,
    nonces: NonceGen,
    stats: AppStats,
}

impl KitePuller {
    pub fn new(target: Name, start_at: Timestamp, interval: Duration, seed: u64) -> Self {
        Self {
            target,
            interval,
            next_round: Some(start_at),
            seq: 0,
            nonces: NonceGen::new(seed),
            stats: AppStats::default(),
        }
    }

    fn round(&mut self, now: Timestamp) -> Vec<Packet> {
        self.next_round = Some(now + self.interval);
        let pull = Interest::new(self.target.clone(), self.nonces.next_nonce())
            .with_flag(TraceFlag::Announce)
            .with_lifetime(DEFAULT_TRACING_INTEREST_LIFETIME);
        let name = self.target.clone().append("pull").append(self.seq.to_string());
        self.seq += 1;
        let redirect = Interest::new(name, self.nonces.next_nonce())
            .with_trace(self.target.clone(), TraceFlag::Redirected)
            .with_lifetime(DEFAULT_TRACING_INTEREST_LIFETIME);
        self.stats.interests_sent += 2;
        vec![Packet::Interest(pull), Packet::Interest(redirect)]
    }
}

impl Application for KitePuller {
    fn start(&mut self, _now: Timestamp) -> Vec<Packet> {
        Vec::new()
    }

    fn on_interest(&mut self, interest: &Interest, _now: Timestamp) -> Vec<Packet> {
        self.stats.interests_received += 1;
        if interest.trace_flag == TraceFlag::Announce && interest.trace_name.as_ref() == Some(&self.target) {
            self.stats.pulled += 1;
        }
        Vec::new()
    }

    fn on_data(&mut self, _data: &Data, now: Timestamp) -> Vec<Packet> {
        self.stats.record_data(now);
        Vec::new()
    }

    fn on_wakeup(&mut self, now: Timestamp) -> Vec<Packet> {
        match self.next_round {
            Some(at) if at <= now => self.round(now),
            _ => Vec::new(),
        }
    }

    fn next_wakeup(&self) -> Option<Timestamp> {
        self.next_round
    }

    fn stats(&self) -> AppStats {
        self.stats
    }
}
