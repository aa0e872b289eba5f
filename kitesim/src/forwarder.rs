//! Minimal forwarding daemon hosting a strategy.
//!
//! Provides the pending interest table, FIB, face state, nonce loop
//! detection and timers a strategy expects from its host.

use hashbrown::HashMap;
use kitetrace::{
    Data, DebugEvent, Duration, FaceId, Forwarder, InRecord, Interest, Name, NextHop, PitToken,
    TimerId, Timestamp,
};

use crate::event::Packet;
use crate::topology::APP_FACE;

/// Upstream face an interest was sent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutRecord {
    pub face: FaceId,
    pub nonce: u32,
    pub expiry: Timestamp,
}

/// Pending interest record.
#[derive(Debug, Clone)]
pub struct PitEntry {
    /// Interest that created the record.
    pub interest: Interest,
    /// Nonce of the most recent arrival.
    pub last_nonce: u32,
    pub in_records: Vec<InRecord>,
    pub out_records: Vec<OutRecord>,
    pub expiry: Timestamp,
}

#[derive(Debug, Clone)]
struct FibEntry {
    prefix: Name,
    next_hops: Vec<NextHop>,
}

/// Packet and decision counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwarderCounters {
    pub interests_sent: u64,
    pub interests_rejected: u64,
    pub loops_dropped: u64,
    pub data_sent: u64,
    pub unsolicited_data: u64,
    pub pit_expired: u64,
}

type PitKey = (Name, Option<Name>);

pub struct SimForwarder {
    now: Timestamp,
    pit: HashMap<PitToken, PitEntry>,
    pit_index: HashMap<PitKey, PitToken>,
    next_pit: u64,
    fib: Vec<FibEntry>,
    faces: HashMap<FaceId, bool>,
    /// Recently seen (name, nonce) pairs and when they may be forgotten.
    dead_nonces: HashMap<(Name, u32), Timestamp>,
    timers: Vec<(TimerId, Timestamp)>,
    next_timer: u64,
    outbox: Vec<(FaceId, Packet)>,
    events: Vec<(Timestamp, DebugEvent)>,
    counters: ForwarderCounters,
}

impl Default for SimForwarder {
    fn default() -> Self {
        Self::new()
    }
}

impl SimForwarder {
    pub fn new() -> Self {
        let mut faces = HashMap::new();
        faces.insert(APP_FACE, true);
        Self {
            now: Timestamp::ZERO,
            pit: HashMap::new(),
            pit_index: HashMap::new(),
            next_pit: 0,
            fib: Vec::new(),
            faces,
            dead_nonces: HashMap::new(),
            timers: Vec::new(),
            next_timer: 0,
            outbox: Vec::new(),
            events: Vec::new(),
            counters: ForwarderCounters::default(),
        }
    }

    pub fn set_now(&mut self, now: Timestamp) {
        if now > self.now {
            self.now = now;
        }
    }

    pub fn set_face_up(&mut self, face: FaceId, up: bool) {
        self.faces.insert(face, up);
    }

    pub fn face_is_up(&self, face: FaceId) -> bool {
        self.faces.get(&face).copied().unwrap_or(false)
    }

    /// Add a next hop for `prefix`.
    pub fn add_route(&mut self, prefix: Name, face: FaceId, cost: u32) {
        let hop = NextHop { face, cost };
        match self.fib.iter_mut().find(|e| e.prefix == prefix) {
            Some(entry) => {
                entry.next_hops.retain(|h| h.face != face);
                entry.next_hops.push(hop);
                entry.next_hops.sort_by_key(|h| h.cost);
            }
            None => self.fib.push(FibEntry {
                prefix,
                next_hops: vec![hop],
            }),
        }
    }

    /// True if `interest` was seen recently, or is already pending from
    /// another face with the same nonce.
    pub fn is_loop(&self, in_face: FaceId, interest: &Interest) -> bool {
        let key = (interest.name.clone(), interest.nonce);
        if self.dead_nonces.get(&key).is_some_and(|&until| until > self.now) {
            return true;
        }
        let Some(entry) = self
            .pit_index
            .get(&(interest.name.clone(), interest.trace_name.clone()))
            .and_then(|token| self.pit.get(token))
        else {
            return false;
        };
        entry
            .in_records
            .iter()
            .any(|r| r.nonce == interest.nonce && r.face != in_face)
            || entry.out_records.iter().any(|r| r.nonce == interest.nonce)
    }

    /// Find the pending record for `interest` or create one.
    pub fn find_or_insert_pit(&mut self, interest: &Interest) -> (PitToken, bool) {
        let key = (interest.name.clone(), interest.trace_name.clone());
        if let Some(&token) = self.pit_index.get(&key) {
            if let Some(entry) = self.pit.get_mut(&token) {
                entry.last_nonce = interest.nonce;
            }
            return (token, false);
        }
        let token = PitToken(self.next_pit);
        self.next_pit += 1;
        self.pit.insert(
            token,
            PitEntry {
                interest: interest.clone(),
                last_nonce: interest.nonce,
                in_records: Vec::new(),
                out_records: Vec::new(),
                expiry: self.now,
            },
        );
        self.pit_index.insert(key, token);
        (token, true)
    }

    /// Remember a nonce so later copies are treated as loops.
    pub fn remember_nonce(&mut self, interest: &Interest) {
        let until = self.now + interest.lifetime;
        self.dead_nonces
            .insert((interest.name.clone(), interest.nonce), until);
    }

    pub fn pit_entry(&self, pit: PitToken) -> Option<&PitEntry> {
        self.pit.get(&pit)
    }

    pub fn pit_len(&self) -> usize {
        self.pit.len()
    }

    /// Pending records `data` satisfies, with an out-record on `in_face`.
    pub fn matching_pits(&self, in_face: FaceId, data: &Data) -> Vec<PitToken> {
        let mut tokens: Vec<PitToken> = self
            .pit
            .iter()
            .filter(|(_, e)| {
                e.interest.name == data.name
                    && (in_face == APP_FACE || e.out_records.iter().any(|r| r.face == in_face))
            })
            .map(|(&token, _)| token)
            .collect();
        tokens.sort();
        tokens
    }

    pub fn remove_pit(&mut self, pit: PitToken) -> Option<PitEntry> {
        let entry = self.pit.remove(&pit)?;
        self.pit_index
            .remove(&(entry.interest.name.clone(), entry.interest.trace_name.clone()));
        Some(entry)
    }

    /// Records whose every in-record has expired.
    pub fn expired_pits(&self) -> Vec<PitToken> {
        let mut tokens: Vec<PitToken> = self
            .pit
            .iter()
            .filter(|(_, e)| e.expiry <= self.now)
            .map(|(&token, _)| token)
            .collect();
        tokens.sort();
        tokens
    }

    pub fn take_due_timers(&mut self) -> Vec<TimerId> {
        let now = self.now;
        let (due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|(_, at)| *at <= now);
        self.timers = pending;
        let mut due: Vec<(TimerId, Timestamp)> = due;
        due.sort_by_key(|&(id, at)| (at, id));
        due.into_iter().map(|(id, _)| id).collect()
    }

    pub fn purge_dead_nonces(&mut self) {
        let now = self.now;
        self.dead_nonces.retain(|_, until| *until > now);
    }

    /// Earliest timer or pending-record expiry.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        let timers = self.timers.iter().map(|&(_, at)| at);
        let expiries = self.pit.values().map(|e| e.expiry);
        timers.chain(expiries).min()
    }

    pub fn push_data(&mut self, face: FaceId, data: Data) {
        self.counters.data_sent += 1;
        self.outbox.push((face, Packet::Data(data)));
    }

    pub fn take_outbox(&mut self) -> Vec<(FaceId, Packet)> {
        std::mem::take(&mut self.outbox)
    }

    pub fn events(&self) -> &[(Timestamp, DebugEvent)] {
        &self.events
    }

    pub fn counters(&self) -> &ForwarderCounters {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut ForwarderCounters {
        &mut self.counters
    }
}

impl Forwarder for SimForwarder {
    fn now(&self) -> Timestamp {
        self.now
    }

    fn pit_interest(&self, pit: PitToken) -> Option<&Interest> {
        self.pit.get(&pit).map(|e| &e.interest)
    }

    fn in_records(&self, pit: PitToken) -> Vec<InRecord> {
        let now = self.now;
        self.pit
            .get(&pit)
            .map(|e| {
                e.in_records
                    .iter()
                    .filter(|r| r.expiry > now)
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn in_record(&self, pit: PitToken, face: FaceId) -> Option<InRecord> {
        let now = self.now;
        self.pit
            .get(&pit)?
            .in_records
            .iter()
            .find(|r| r.face == face && r.expiry > now)
            .copied()
    }

    fn insert_or_update_in_record(&mut self, pit: PitToken, face: FaceId, interest: &Interest) {
        let expiry = self.now + interest.lifetime;
        let Some(entry) = self.pit.get_mut(&pit) else {
            return;
        };
        let record = InRecord {
            face,
            nonce: interest.nonce,
            expiry,
        };
        match entry.in_records.iter_mut().find(|r| r.face == face) {
            Some(existing) => *existing = record,
            None => entry.in_records.push(record),
        }
        if expiry > entry.expiry {
            entry.expiry = expiry;
        }
    }

    fn lookup_fib(&self, pit: PitToken) -> Vec<NextHop> {
        let Some(entry) = self.pit.get(&pit) else {
            return Vec::new();
        };
        self.fib
            .iter()
            .filter(|e| e.prefix.is_prefix_of(&entry.interest.name))
            .max_by_key(|e| e.prefix.len())
            .map(|e| {
                e.next_hops
                    .iter()
                    .filter(|h| self.face_is_up(h.face))
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn would_violate_scope(&self, _in_face: FaceId, interest: &Interest, out_face: FaceId) -> bool {
        interest.name.get(0) == Some("localhost") && out_face != APP_FACE
    }

    fn can_forward_to_legacy(&self, pit: PitToken, out_face: FaceId) -> bool {
        let Some(entry) = self.pit.get(&pit) else {
            return false;
        };
        let now = self.now;
        let already_sent = entry
            .out_records
            .iter()
            .any(|r| r.face == out_face && r.nonce == entry.last_nonce && r.expiry > now);
        let someone_else_waiting = entry
            .in_records
            .iter()
            .any(|r| r.face != out_face && r.expiry > now);
        !already_sent && someone_else_waiting
    }

    fn send_interest(&mut self, pit: PitToken, out_face: FaceId, interest: &Interest) {
        let record = OutRecord {
            face: out_face,
            nonce: interest.nonce,
            expiry: self.now + interest.lifetime,
        };
        if let Some(entry) = self.pit.get_mut(&pit) {
            match entry.out_records.iter_mut().find(|r| r.face == out_face) {
                Some(existing) => *existing = record,
                None => entry.out_records.push(record),
            }
        }
        self.counters.interests_sent += 1;
        self.outbox.push((out_face, Packet::Interest(interest.clone())));
    }

    fn reject_pending_interest(&mut self, pit: PitToken) {
        self.counters.interests_rejected += 1;
        if let Some(entry) = self.pit.get_mut(&pit) {
            entry.expiry = self.now;
        }
    }

    fn schedule(&mut self, after: Duration) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.push((id, self.now + after));
        id
    }

    fn cancel(&mut self, timer: TimerId) {
        self.timers.retain(|(id, _)| *id != timer);
    }

    fn emit(&mut self, event: DebugEvent) {
        self.events.push((self.now, event));
    }
}
