//! Authoritative wrapper around the shared simulation: id allocation,
//! spawn placement and respawn bookkeeping around `shared::Game::step`.

use log::info;
use shared::collections::PlayerMap;
use shared::{Game, Input, Map, Player, PlayerId, PlayerIdAllocator, Vec2};

use crate::respawn::RespawnQueue;

/// Everything the server owns about the arena: the replicated `Game` plus
/// the bookkeeping that never crosses the wire (id allocation, respawn
/// timers). Lives solely in the main loop, never behind a lock.
pub struct ServerGame {
    pub game: Game,
    pub sim_tick: u64,
    allocator: PlayerIdAllocator,
    respawn: RespawnQueue,
}

impl ServerGame {
    pub fn new(map: Map, seed: u64) -> Self {
        ServerGame {
            game: Game::new(map),
            sim_tick: 0,
            allocator: PlayerIdAllocator::new(),
            respawn: RespawnQueue::seeded(seed),
        }
    }

    /// Allocates a fresh id, places the new player dead at the origin, and
    /// immediately schedules their first respawn - joining is just another
    /// kind of death, so it reuses the same timer/spawn-draw path.
    pub fn add_player(&mut self) -> PlayerId {
        let id = self.allocator.allocate();
        self.game.spawn_player(id, Vec2::ZERO, 0.0);
        if let Some(p) = self.game.players.get_mut(id) {
            p.health = 0.0;
        }
        self.respawn.schedule(id);
        info!("allocated player {id}");
        id
    }

    pub fn remove_player(&mut self, id: PlayerId) {
        self.game.remove_player(id);
    }

    /// Advances the arena by one tick, then resolves expired respawns.
    /// Returns the players that respawned this tick so the caller can emit
    /// `PlayerSpawn` packets for them.
    pub fn tick(&mut self, inputs: &PlayerMap<Input>, dt: f32) -> Vec<Player> {
        self.game.step(inputs, dt);
        self.sim_tick += 1;

        let expired = self.respawn.tick(dt, &self.game.map);
        let mut respawned = Vec::with_capacity(expired.len());
        for (id, pos) in expired {
            let hue = self.respawn.draw_hue();
            let player = Player::new(id, pos, hue);
            self.game.players.insert(id, player);
            respawned.push(player);
        }
        respawned
    }

    /// Schedules a respawn for a player whose health just hit zero, unless
    /// one is already pending (e.g. they died again before respawning -
    /// cannot happen once health clamps at zero, but guards against double
    /// scheduling from replayed damage).
    pub fn schedule_respawn(&mut self, id: PlayerId) {
        self.respawn.schedule(id);
    }

    pub fn is_respawn_pending(&self, id: PlayerId) -> bool {
        self.respawn.is_pending(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_player_starts_dead_and_respawn_pending() {
        let mut server_game = ServerGame::new(Map::default_arena(), 1);
        let id = server_game.add_player();
        assert_eq!(server_game.game.players.get(id).unwrap().health, 0.0);
        assert!(server_game.is_respawn_pending(id));
    }

    #[test]
    fn player_respawns_alive_after_the_delay_elapses() {
        let mut server_game = ServerGame::new(Map::default_arena(), 1);
        let id = server_game.add_player();

        let inputs = PlayerMap::with_capacity(4);
        let mut respawned_at_some_tick = false;
        for _ in 0..200 {
            let respawned = server_game.tick(&inputs, 1.0 / 60.0);
            if !respawned.is_empty() {
                respawned_at_some_tick = true;
                assert_eq!(respawned[0].id, id);
                break;
            }
        }
        assert!(respawned_at_some_tick);
        assert!(server_game.game.players.get(id).unwrap().is_alive());
        assert!(!server_game.is_respawn_pending(id));
    }

    #[test]
    fn sim_tick_advances_once_per_call() {
        let mut server_game = ServerGame::new(Map::default_arena(), 1);
        let inputs = PlayerMap::with_capacity(4);
        server_game.tick(&inputs, 1.0 / 60.0);
        server_game.tick(&inputs, 1.0 / 60.0);
        assert_eq!(server_game.sim_tick, 2);
    }

    #[test]
    fn ids_are_never_reused_after_removal() {
        let mut server_game = ServerGame::new(Map::default_arena(), 1);
        let first = server_game.add_player();
        server_game.remove_player(first);
        let second = server_game.add_player();
        assert_ne!(first, second);
    }
}
