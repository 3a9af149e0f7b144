//! Client-side simulation: the local copy of the arena, predicted ahead of
//! the server and reconciled against authoritative snapshots as they arrive.
//!
//! The local player's position is always a prediction; remote players are
//! whatever [`crate::remote::RemotePeers`] last wrote into them. Both share
//! the one `Game`, since collisions and static geometry need every player
//! present regardless of who drives their movement.

use log::{debug, warn};
use shared::collections::PlayerMap;
use shared::{Game, Input, Map, Player, PlayerId, Vec2, INPUT_RING_CAPACITY, MAX_CLIENTS};

/// How far a replayed position may drift from what was already predicted
/// before the whole record is overwritten rather than kept as-is.
const RECONCILE_EPSILON: f32 = 0.02;

/// Fixed-size input log indexed by `sim_tick mod capacity`: a direct-mapped
/// cache rather than a FIFO, since reconciliation needs random access to
/// "the input that was live at tick N", not just push/pop order.
struct InputRing {
    slots: Vec<Option<(u64, Input)>>,
}

impl InputRing {
    fn new(capacity: usize) -> Self {
        InputRing { slots: vec![None; capacity] }
    }

    fn capacity(&self) -> u64 {
        self.slots.len() as u64
    }

    fn record(&mut self, sim_tick: u64, input: Input) {
        let idx = (sim_tick % self.capacity()) as usize;
        self.slots[idx] = Some((sim_tick, input));
    }

    /// Returns the input recorded for `sim_tick`, or `None` if that slot has
    /// since been overwritten by a later tick (the ring wrapped past it).
    fn get(&self, sim_tick: u64) -> Option<Input> {
        let idx = (sim_tick % self.capacity()) as usize;
        match self.slots[idx] {
            Some((tick, input)) if tick == sim_tick => Some(input),
            _ => None,
        }
    }
}

/// Local copy of the arena, predicted one round-trip ahead of the server.
pub struct ClientGame {
    pub game: Game,
    pub sim_tick: u64,
    local_player_id: PlayerId,
    input_ring: InputRing,
}

impl ClientGame {
    pub fn new(map: Map, local_player_id: PlayerId, initial_sim_tick: u64) -> Self {
        let mut game = Game::new(map);
        game.spawn_player(local_player_id, Vec2::ZERO, 0.0);
        ClientGame {
            game,
            sim_tick: initial_sim_tick,
            local_player_id,
            input_ring: InputRing::new(INPUT_RING_CAPACITY as usize),
        }
    }

    pub fn local_player_id(&self) -> PlayerId {
        self.local_player_id
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.game.players.get(self.local_player_id)
    }

    /// Inserts or overwrites a player's record directly - used for the
    /// initial spawn snapshot and whenever a peer joins mid-session.
    pub fn set_player(&mut self, player: Player) {
        self.game.players.insert(player.id, player);
    }

    pub fn remove_player(&mut self, id: PlayerId) {
        self.game.players.remove(id);
    }

    /// Applies one tick of local input immediately, without waiting for the
    /// server - the whole point of prediction.
    pub fn predict(&mut self, input: Input, dt: f32) {
        self.input_ring.record(self.sim_tick, input);
        let mut inputs = PlayerMap::with_capacity(MAX_CLIENTS);
        inputs.insert(self.local_player_id, input);
        self.game.step(&inputs, dt);
        self.sim_tick += 1;
    }

    /// Reconciles the local player against an authoritative snapshot taken
    /// at `server_sim_tick`: rolls back to the snapshot, replays every
    /// recorded input since, and keeps the replayed outcome only if it
    /// disagrees with what was already predicted beyond [`RECONCILE_EPSILON`].
    pub fn reconcile(&mut self, snapshot: Player, server_sim_tick: u64, dt: f32) {
        if server_sim_tick >= self.sim_tick {
            // Server is level with or ahead of our prediction clock - there
            // is nothing to replay against, take the snapshot verbatim.
            self.set_player(snapshot);
            return;
        }

        let diff = self.sim_tick - server_sim_tick - 1;
        if diff >= self.input_ring.capacity() {
            warn!(
                "auth snapshot for tick {server_sim_tick} sits outside the {}-tick replay window (diff {diff}); accepting verbatim",
                self.input_ring.capacity()
            );
            self.set_player(snapshot);
            return;
        }

        let predicted_before = self.local_player().copied();

        self.set_player(snapshot);
        for tick in (server_sim_tick + 1)..self.sim_tick {
            let Some(input) = self.input_ring.get(tick) else { continue };
            let mut inputs = PlayerMap::with_capacity(MAX_CLIENTS);
            inputs.insert(self.local_player_id, input);
            self.game.step(&inputs, dt);
        }

        let replayed = self.local_player().copied();
        if let (Some(before), Some(after)) = (predicted_before, replayed) {
            let drift = before.pos.sub(after.pos).len();
            if drift <= RECONCILE_EPSILON {
                debug!("reconciliation drift {drift:.4} within epsilon, keeping prediction");
                self.set_player(before);
            } else {
                debug!("reconciliation drift {drift:.4} beyond epsilon, snapping to replay");
            }
        }
    }
}
