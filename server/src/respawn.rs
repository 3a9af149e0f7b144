//! Death-to-respawn timers and spawn tile/hue selection.
//!
//! A dead player sits out for [`RESPAWN_DELAY_SECONDS`] before the
//! authority loop drops them back in at a grass tile drawn from the seeded
//! PCG — the same generator the server uses nowhere else, so spawn
//! selection never perturbs the deterministic simulation step.

use shared::{Map, PlayerId, Vec2, rng::Pcg32};

pub const RESPAWN_DELAY_SECONDS: f32 = 2.0;

struct Timer {
    player_id: PlayerId,
    time_left: f32,
}

pub struct RespawnQueue {
    timers: Vec<Timer>,
    rng: Pcg32,
}

impl RespawnQueue {
    pub fn seeded(seed: u64) -> Self {
        RespawnQueue {
            timers: Vec::new(),
            rng: Pcg32::seeded(seed, 0),
        }
    }

    pub fn schedule(&mut self, player_id: PlayerId) {
        if self.is_pending(player_id) {
            return;
        }
        self.timers.push(Timer {
            player_id,
            time_left: RESPAWN_DELAY_SECONDS,
        });
    }

    pub fn is_pending(&self, player_id: PlayerId) -> bool {
        self.timers.iter().any(|t| t.player_id == player_id)
    }

    /// Advances every timer by `dt`, returning `(player_id, spawn_pos)` for
    /// each one that expired this call. Iterates by index rather than
    /// `retain`/`retain_mut` because an expiring entry needs its freshly
    /// drawn spawn tile reported, not just dropped.
    pub fn tick(&mut self, dt: f32, map: &Map) -> Vec<(PlayerId, Vec2)> {
        let mut expired = Vec::new();
        let mut i = 0;
        while i < self.timers.len() {
            self.timers[i].time_left -= dt;
            if self.timers[i].time_left <= 0.0 {
                let timer = self.timers.swap_remove(i);
                let spawn = self.draw_spawn_tile(map);
                expired.push((timer.player_id, spawn));
            } else {
                i += 1;
            }
        }
        expired
    }

    fn draw_spawn_tile(&mut self, map: &Map) -> Vec2 {
        let tiles = map.grass_tile_centers();
        if tiles.is_empty() {
            return Vec2::ZERO;
        }
        let index = self.rng.next_index(tiles.len());
        tiles[index]
    }

    /// Draws a hue in `[0, 1)` for a respawning (or newly joining) player.
    pub fn draw_hue(&mut self) -> f32 {
        self.rng.next_unilateral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u64) -> PlayerId {
        PlayerId::new(n).unwrap()
    }

    #[test]
    fn timer_does_not_expire_before_delay_elapses() {
        let mut queue = RespawnQueue::seeded(1);
        let map = Map::default_arena();
        queue.schedule(pid(1));
        let expired = queue.tick(RESPAWN_DELAY_SECONDS - 0.01, &map);
        assert!(expired.is_empty());
        assert!(queue.is_pending(pid(1)));
    }

    #[test]
    fn timer_expires_and_reports_a_grass_spawn() {
        let mut queue = RespawnQueue::seeded(1);
        let map = Map::default_arena();
        queue.schedule(pid(1));
        let expired = queue.tick(RESPAWN_DELAY_SECONDS + 0.01, &map);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, pid(1));
        assert_eq!(map.tile_at(expired[0].1), shared::Tile::Grass);
        assert!(!queue.is_pending(pid(1)));
    }

    #[test]
    fn scheduling_twice_does_not_duplicate_the_timer() {
        let mut queue = RespawnQueue::seeded(1);
        let map = Map::default_arena();
        queue.schedule(pid(1));
        queue.schedule(pid(1));
        let expired = queue.tick(RESPAWN_DELAY_SECONDS + 0.01, &map);
        assert_eq!(expired.len(), 1);
    }

    #[test]
    fn independent_timers_expire_independently() {
        let mut queue = RespawnQueue::seeded(7);
        let map = Map::default_arena();
        queue.schedule(pid(1));
        queue.tick(1.0, &map);
        queue.schedule(pid(2));
        let expired = queue.tick(RESPAWN_DELAY_SECONDS, &map);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, pid(1));
        assert!(queue.is_pending(pid(2)));
    }

    #[test]
    fn drawn_hues_stay_in_unit_range() {
        let mut queue = RespawnQueue::seeded(42);
        for _ in 0..20 {
            let hue = queue.draw_hue();
            assert!((0.0..1.0).contains(&hue));
        }
    }
}
