//! Per-peer input log and connection bookkeeping.
//!
//! Generalizes the original `ClientManager`/`Client` (`pending_inputs`,
//! `add_input`, `get_chronological_inputs`, sequence-keyed ordering) to carry
//! `client_sim_tick`-keyed entries and the drift-controller handshake state
//! per peer (`last_sent_iteration`/`last_acked_iteration`) instead.

use log::info;
use shared::{Input, PlayerId, VALID_TICK_WINDOW};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// One client update, scheduled for the tick it claims to apply to.
#[derive(Debug, Clone, Copy)]
pub struct PendingInput {
    pub client_sim_tick: u64,
    pub input: Input,
}

/// Everything the server tracks about one connected peer.
#[derive(Debug)]
pub struct Peer {
    pub id: PlayerId,
    pub addr: SocketAddr,
    last_seen: Instant,

    /// Inputs received but not yet consumed by the authority loop, kept in
    /// ascending `client_sim_tick` order.
    pending_inputs: VecDeque<PendingInput>,

    /// The iteration the server last stamped on an outgoing adjustment for
    /// this peer; a new correction is only stamped once the client has
    /// acknowledged the previous one (see the drift handshake in `drift.rs`).
    pub last_sent_iteration: u8,
    pub last_acked_iteration: u8,

    /// `client_sim_tick` from the most recently received batch, fed into
    /// the drift controller each network tick.
    pub last_client_sim_tick: Option<u64>,
}

impl Peer {
    pub fn new(id: PlayerId, addr: SocketAddr) -> Self {
        Peer {
            id,
            addr,
            last_seen: Instant::now(),
            pending_inputs: VecDeque::new(),
            last_sent_iteration: 0,
            last_acked_iteration: 0,
            last_client_sim_tick: None,
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }

    /// Records the tick a batch claimed, independent of whether the input
    /// inside it was accepted - the drift controller needs this even for
    /// rejected (too-old) batches.
    pub fn note_client_sim_tick(&mut self, client_sim_tick: u64) {
        self.touch();
        self.last_client_sim_tick = Some(
            self.last_client_sim_tick
                .map_or(client_sim_tick, |prev| prev.max(client_sim_tick)),
        );
    }

    /// Queues one update, overwriting a prior entry for the same tick rather
    /// than duplicating it (a peer may only have one input per tick).
    pub fn queue_input(&mut self, client_sim_tick: u64, input: Input) {
        self.touch();
        if let Some(existing) = self
            .pending_inputs
            .iter_mut()
            .find(|p| p.client_sim_tick == client_sim_tick)
        {
            existing.input = input;
            return;
        }
        let pos = self
            .pending_inputs
            .iter()
            .position(|p| p.client_sim_tick > client_sim_tick)
            .unwrap_or(self.pending_inputs.len());
        self.pending_inputs
            .insert(pos, PendingInput { client_sim_tick, input });
    }

    /// Pops the next input if it is due, consuming at most one entry per
    /// call so at most one input per tick per peer ever reaches the sim.
    pub fn pop_due_input(&mut self, current_sim_tick: u64) -> Option<PendingInput> {
        match self.pending_inputs.front() {
            Some(p) if p.client_sim_tick <= current_sim_tick => self.pending_inputs.pop_front(),
            _ => None,
        }
    }
}

/// Whether a batch claiming `client_sim_tick` falls inside the server's
/// accept window relative to `server_sim_tick` (too-old batches get a
/// `Dropped` reply instead).
pub fn within_valid_window(client_sim_tick: u64, server_sim_tick: u64) -> bool {
    client_sim_tick + VALID_TICK_WINDOW - 1 >= server_sim_tick
}

/// Connection table keyed by `PlayerId`, with a reverse address index for
/// routing incoming datagrams to the right peer.
pub struct PeerTable {
    peers: HashMap<PlayerId, Peer>,
    addr_to_id: HashMap<SocketAddr, PlayerId>,
    max_peers: usize,
}

impl PeerTable {
    pub fn new(max_peers: usize) -> Self {
        PeerTable {
            peers: HashMap::new(),
            addr_to_id: HashMap::new(),
            max_peers,
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn find_by_addr(&self, addr: SocketAddr) -> Option<PlayerId> {
        self.addr_to_id.get(&addr).copied()
    }

    pub fn add(&mut self, id: PlayerId, addr: SocketAddr) -> bool {
        if self.peers.len() >= self.max_peers {
            return false;
        }
        info!("peer {id} connected from {addr}");
        self.peers.insert(id, Peer::new(id, addr));
        self.addr_to_id.insert(addr, id);
        true
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<Peer> {
        let peer = self.peers.remove(&id)?;
        self.addr_to_id.remove(&peer.addr);
        info!("peer {id} disconnected");
        Some(peer)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Peer> {
        self.peers.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Peer> {
        self.peers.get_mut(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.peers.keys().copied()
    }

    pub fn addrs(&self) -> impl Iterator<Item = (PlayerId, SocketAddr)> + '_ {
        self.peers.values().map(|p| (p.id, p.addr))
    }

    /// Removes and returns every peer whose `last_seen` exceeds `timeout`.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<PlayerId> {
        let timed_out: Vec<PlayerId> = self
            .peers
            .values()
            .filter(|p| p.is_timed_out(timeout))
            .map(|p| p.id)
            .collect();
        for id in &timed_out {
            self.remove(*id);
        }
        timed_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Vec2;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    fn pid(n: u64) -> PlayerId {
        PlayerId::new(n).unwrap()
    }

    fn input_at(look_x: f32) -> Input {
        Input { look: Vec2::new(look_x, 0.0), ..Default::default() }
    }

    #[test]
    fn peer_table_enforces_capacity() {
        let mut table = PeerTable::new(1);
        assert!(table.add(pid(1), addr(1)));
        assert!(!table.add(pid(2), addr(2)));
    }

    #[test]
    fn peer_table_finds_by_address() {
        let mut table = PeerTable::new(4);
        table.add(pid(1), addr(1));
        assert_eq!(table.find_by_addr(addr(1)), Some(pid(1)));
        assert_eq!(table.find_by_addr(addr(2)), None);
    }

    #[test]
    fn removed_peer_address_is_freed() {
        let mut table = PeerTable::new(4);
        table.add(pid(1), addr(1));
        table.remove(pid(1));
        assert!(table.find_by_addr(addr(1)).is_none());
    }

    #[test]
    fn pending_inputs_drain_in_ascending_tick_order() {
        let mut peer = Peer::new(pid(1), addr(1));
        peer.queue_input(5, input_at(1.0));
        peer.queue_input(3, input_at(2.0));
        peer.queue_input(4, input_at(3.0));

        assert_eq!(peer.pop_due_input(10).unwrap().client_sim_tick, 3);
        assert_eq!(peer.pop_due_input(10).unwrap().client_sim_tick, 4);
        assert_eq!(peer.pop_due_input(10).unwrap().client_sim_tick, 5);
        assert!(peer.pop_due_input(10).is_none());
    }

    #[test]
    fn pending_input_does_not_pop_before_its_tick() {
        let mut peer = Peer::new(pid(1), addr(1));
        peer.queue_input(7, input_at(1.0));
        assert!(peer.pop_due_input(6).is_none());
        assert!(peer.pop_due_input(7).is_some());
    }

    #[test]
    fn requeueing_the_same_tick_overwrites_rather_than_duplicates() {
        let mut peer = Peer::new(pid(1), addr(1));
        peer.queue_input(5, input_at(1.0));
        peer.queue_input(5, input_at(9.0));
        let popped = peer.pop_due_input(5).unwrap();
        assert_eq!(popped.input.look.x, 9.0);
        assert!(peer.pop_due_input(5).is_none());
    }

    #[test]
    fn valid_window_accepts_boundary_and_rejects_one_past_it() {
        assert!(within_valid_window(95, 100)); // server_sim_tick - (W-1)
        assert!(!within_valid_window(94, 100)); // one tick too old
    }

    #[test]
    fn timed_out_peers_are_removed() {
        let mut table = PeerTable::new(4);
        table.add(pid(1), addr(1));
        table.add(pid(2), addr(2));
        table.get_mut(pid(1)).unwrap().touch();
        std::thread::sleep(Duration::from_millis(5));
        let timed_out = table.check_timeouts(Duration::from_millis(1));
        assert_eq!(timed_out.len(), 2);
        assert!(table.is_empty());
    }
}
