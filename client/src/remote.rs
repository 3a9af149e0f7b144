//! Remote-peer snapshot buffering.
//!
//! Remote players are never predicted or rolled back - the client just
//! queues each authoritative snapshot it receives for them and releases it
//! once its own (bounded) render clock catches up, trading a couple of
//! ticks of latency for motion that never needs correcting.

use shared::{Player, PlayerId, RENDER_DELAY_TICKS};
use std::collections::{HashMap, VecDeque};

/// Bounded render-delay clock a peer snapshot must reach before it is
/// applied. Unlike the base `sim_tick + 2 * sum(adjustment)` formula, this
/// can never run unboundedly far behind the live simulation.
pub fn active_tick(sim_tick: u64) -> u64 {
    sim_tick.saturating_sub(RENDER_DELAY_TICKS)
}

struct PeerBuffer {
    snapshots: VecDeque<(u64, Player)>,
}

impl PeerBuffer {
    fn new() -> Self {
        PeerBuffer { snapshots: VecDeque::new() }
    }

    fn push(&mut self, sim_tick: u64, player: Player) {
        if let Some(&(last_tick, _)) = self.snapshots.back() {
            if sim_tick <= last_tick {
                return; // stale or duplicate, server ticks only move forward
            }
        }
        self.snapshots.push_back((sim_tick, player));
    }

    /// Pops every snapshot whose tick has come due, keeping only the
    /// newest - the rest are superseded before they were ever shown.
    fn drain_due(&mut self, active_tick: u64) -> Option<Player> {
        let mut latest = None;
        while let Some(&(tick, player)) = self.snapshots.front() {
            if tick > active_tick {
                break;
            }
            self.snapshots.pop_front();
            latest = Some(player);
        }
        latest
    }
}

/// Per-remote-peer FIFOs of authoritative snapshots.
pub struct RemotePeers {
    buffers: HashMap<PlayerId, PeerBuffer>,
}

impl RemotePeers {
    pub fn new() -> Self {
        RemotePeers { buffers: HashMap::new() }
    }

    pub fn push(&mut self, id: PlayerId, sim_tick: u64, player: Player) {
        self.buffers.entry(id).or_insert_with(PeerBuffer::new).push(sim_tick, player);
    }

    pub fn remove(&mut self, id: PlayerId) {
        self.buffers.remove(&id);
    }

    /// Drains every peer's buffer up to `active_tick`, returning the
    /// `(id, player)` pairs that are now due for display.
    pub fn drain_due(&mut self, active_tick: u64) -> Vec<(PlayerId, Player)> {
        let mut out = Vec::new();
        for (&id, buf) in self.buffers.iter_mut() {
            if let Some(player) = buf.drain_due(active_tick) {
                out.push((id, player));
            }
        }
        out
    }
}

impl Default for RemotePeers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Vec2;

    fn pid(n: u64) -> PlayerId {
        PlayerId::new(n).unwrap()
    }

    #[test]
    fn active_tick_is_bounded_and_saturating() {
        assert_eq!(active_tick(100), 100 - RENDER_DELAY_TICKS);
        assert_eq!(active_tick(0), 0);
    }

    #[test]
    fn snapshot_is_withheld_until_its_tick_is_due() {
        let mut peers = RemotePeers::new();
        peers.push(pid(1), 10, Player::new(pid(1), Vec2::ZERO, 0.0));

        assert!(peers.drain_due(9).is_empty());
        let due = peers.drain_due(10);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].0, pid(1));
    }

    #[test]
    fn superseded_snapshots_collapse_to_the_newest() {
        let mut peers = RemotePeers::new();
        peers.push(pid(1), 1, Player::new(pid(1), Vec2::new(1.0, 0.0), 0.0));
        peers.push(pid(1), 2, Player::new(pid(1), Vec2::new(2.0, 0.0), 0.0));
        peers.push(pid(1), 3, Player::new(pid(1), Vec2::new(3.0, 0.0), 0.0));

        let due = peers.drain_due(3);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1.pos, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn out_of_order_snapshot_is_dropped() {
        let mut peers = RemotePeers::new();
        peers.push(pid(1), 5, Player::new(pid(1), Vec2::new(5.0, 0.0), 0.0));
        peers.push(pid(1), 3, Player::new(pid(1), Vec2::new(3.0, 0.0), 0.0));

        let due = peers.drain_due(10);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1.pos, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn removed_peer_stops_producing_snapshots() {
        let mut peers = RemotePeers::new();
        peers.push(pid(1), 1, Player::new(pid(1), Vec2::ZERO, 0.0));
        peers.remove(pid(1));
        assert!(peers.drain_due(100).is_empty());
    }

    #[test]
    fn independent_peers_drain_independently() {
        let mut peers = RemotePeers::new();
        peers.push(pid(1), 1, Player::new(pid(1), Vec2::ZERO, 0.0));
        peers.push(pid(2), 100, Player::new(pid(2), Vec2::ZERO, 0.0));

        let due = peers.drain_due(5);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].0, pid(1));
    }
}
