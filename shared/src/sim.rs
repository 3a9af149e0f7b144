//! The deterministic simulation step: per-tick player movement, weapon
//! firing, projectile evolution and static collision resolution.
//!
//! `Game::step` is the single entry point both the server's authority loop
//! and the client's prediction/replay loop call; it must never read the
//! wall clock or any other non-deterministic source. The one exception,
//! [`crate::rng::Pcg32`]-seeded respawn tile selection, lives outside this
//! module entirely and is applied by the caller between ticks.

use crate::collections::{PlayerMap, TaggedList};
use crate::collision::{self, Aabb, Circle};
use crate::constants::*;
use crate::ids::PlayerId;
use crate::input::Input;
use crate::map::Map;
use crate::player::{MovementState, Player, Weapon};
use crate::projectile::{
    DamageEntry, Explosion, GrenadeProjectile, HitscanProjectile, SpatialSound, Sound, StepEvent,
};
use crate::vec2::Vec2;

/// The full authoritative simulation state for one arena.
pub struct Game {
    pub map: Map,
    pub players: PlayerMap<Player>,

    hitscans: TaggedList<HitscanProjectile>,
    nades: TaggedList<GrenadeProjectile>,
    explosions: TaggedList<Explosion>,
    steps: TaggedList<StepEvent>,

    /// Emitted this tick, cleared at the start of the next. Callers drain
    /// these to build outgoing batches; they are not part of replayed state.
    pub damages: Vec<DamageEntry>,
    pub sounds: Vec<SpatialSound>,
    pub new_hitscans: Vec<HitscanProjectile>,
    pub new_nades: Vec<GrenadeProjectile>,
    pub new_steps: Vec<StepEvent>,
}

impl Game {
    pub fn new(map: Map) -> Self {
        Game {
            map,
            players: PlayerMap::with_capacity(MAX_CLIENTS),
            hitscans: TaggedList::with_capacity(MAX_PROJECTILES),
            nades: TaggedList::with_capacity(MAX_PROJECTILES),
            explosions: TaggedList::with_capacity(MAX_EXPLOSIONS),
            steps: TaggedList::with_capacity(MAX_STEPS),
            damages: Vec::new(),
            sounds: Vec::new(),
            new_hitscans: Vec::new(),
            new_nades: Vec::new(),
            new_steps: Vec::new(),
        }
    }

    pub fn spawn_player(&mut self, id: PlayerId, pos: Vec2, hue: f32) {
        self.players.insert(id, Player::new(id, pos, hue));
    }

    pub fn remove_player(&mut self, id: PlayerId) {
        self.players.remove(id);
    }

    pub fn hitscans(&self) -> impl Iterator<Item = &HitscanProjectile> {
        self.hitscans.iter()
    }

    pub fn nades(&self) -> impl Iterator<Item = &GrenadeProjectile> {
        self.nades.iter()
    }

    pub fn explosions(&self) -> impl Iterator<Item = &Explosion> {
        self.explosions.iter()
    }

    pub fn steps(&self) -> impl Iterator<Item = &StepEvent> {
        self.steps.iter()
    }

    /// Advance the whole arena by one tick of length `dt`, given each
    /// connected player's input for this tick (missing entries default to
    /// no input, matching a dropped/late packet).
    pub fn step(&mut self, inputs: &PlayerMap<Input>, dt: f32) {
        self.damages.clear();
        self.sounds.clear();
        self.new_hitscans.clear();
        self.new_nades.clear();
        self.new_steps.clear();

        let mut ids: Vec<PlayerId> = self.players.iter().map(|(id, _)| id).collect();
        ids.sort_by_key(|id| id.get());

        for id in ids.iter().copied() {
            let input = inputs.get(id).copied().unwrap_or_default();
            self.update_player(id, input, dt);
        }

        self.update_projectiles(dt);
        self.collect_and_resolve_static_collisions(&ids);

        for damage in std::mem::take(&mut self.damages) {
            if let Some(p) = self.players.get_mut(damage.player_id) {
                p.health = (p.health - damage.damage).max(0.0);
            }
            self.damages.push(damage);
        }
    }

    fn update_player(&mut self, id: PlayerId, input: Input, dt: f32) {
        let mut p = match self.players.get(id) {
            Some(p) => *p,
            None => return,
        };

        p.look = input.look.normalize_or_unit_x();

        if p.time_left_in_dodge_delay > 0.0 {
            p.time_left_in_dodge_delay = (p.time_left_in_dodge_delay - dt).max(0.0);
        }

        for cooldown in p.weapon_cooldowns.iter_mut() {
            if *cooldown > 0.0 {
                *cooldown = (*cooldown - dt).max(0.0);
            }
        }

        let in_dodge = p.state == MovementState::Sliding;
        let in_dodge_delay = p.time_left_in_dodge_delay > 0.0;
        if !in_dodge_delay && !in_dodge && input.dodge {
            p.dodge = p.look;
            p.time_left_in_dodge = DODGE_TIME;
            p.state = MovementState::Sliding;
            self.sounds.push(SpatialSound {
                player_id: id,
                sound: Sound::PlayerSlide,
                pos: p.pos,
            });
            let speed = p.velocity.len();
            p.velocity = p.dodge.scale(speed);
        }

        if input.switch_weapon {
            p.current_weapon = (p.current_weapon + 1) % p.weapons.len();
            self.sounds.push(SpatialSound {
                player_id: id,
                sound: Sound::WeaponSwitch,
                pos: p.pos,
            });
        }

        if p.current_weapon() == Weapon::Sniper && input.zoom {
            if p.sniper_zoom < MAX_SNIPER_ZOOM {
                p.sniper_zoom += SNIPER_ZOOM_RATE;
            }
        } else if p.sniper_zoom > 0.0 {
            p.sniper_zoom = (p.sniper_zoom - SNIPER_ZOOM_RATE).max(0.0);
        }

        if p.current_weapon() != Weapon::Nade && p.nade_distance > 0.0 {
            p.nade_distance = 0.0;
        }

        let can_fire = p.can_fire();

        if can_fire && p.current_weapon() == Weapon::Sniper && input.shoot_pressed {
            p.set_weapon_cooldown(Player::weapon_cooldown_for(Weapon::Sniper));
            self.fire_hitscan(&p);
        }

        if can_fire && p.current_weapon() == Weapon::Nade && input.shoot_held {
            if p.nade_distance < NADE_MAX_DISTANCE {
                p.nade_distance += NADE_CHARGE_RATE;
            }
        }

        if can_fire && p.current_weapon() == Weapon::Nade && input.shoot_released {
            p.set_weapon_cooldown(Player::weapon_cooldown_for(Weapon::Nade));
            self.fire_nade(&p);
            p.nade_distance = 0.0;
        }

        let active_max_move_speed = p.active_max_move_speed(MAX_MOVE_SPEED);
        let dv = input.move_vector();
        let len_sq = dv.len_sq();

        if p.state == MovementState::Sliding {
            if p.time_left_in_dodge > 0.0 {
                p.velocity = p.velocity.add(p.dodge.scale(dt * DODGE_ACCELERATION));
                let speed = p.velocity.len();
                if speed > MAX_DODGE_SPEED {
                    p.velocity = p.velocity.normalize_or_zero().scale(MAX_DODGE_SPEED);
                }
                p.time_left_in_dodge = (p.time_left_in_dodge - dt).max(0.0);
            } else {
                let slowdown_dir = p.velocity.normalize_or_zero().neg();
                let speed = p.velocity.len();

                if len_sq > 0.0 {
                    let len = len_sq.sqrt();
                    p.velocity = p
                        .velocity
                        .add(dv.scale(dt * MOVE_ACCELERATION / len));
                }
                let new_speed = p.velocity.len();
                if new_speed > speed {
                    p.velocity = p.velocity.normalize_or_zero().scale(speed);
                }

                if speed > 0.0 {
                    let slowdown = speed.min(dt * DODGE_DECELERATION);
                    if speed < dt * DODGE_DECELERATION {
                        p.state = MovementState::Default;
                        p.time_left_in_dodge_delay = DODGE_DELAY_TIME;
                    }
                    p.velocity = p.velocity.add(slowdown_dir.scale(slowdown));
                }
            }
        }

        if p.state == MovementState::Sliding && p.time_left_in_dodge == 0.0 {
            let speed = p.velocity.len();
            if speed <= active_max_move_speed && len_sq > 0.0 {
                p.state = MovementState::Default;
                p.time_left_in_dodge_delay = DODGE_DELAY_TIME;
            }
        }

        if p.state != MovementState::Sliding {
            if len_sq > 0.0 {
                let len = len_sq.sqrt();
                p.velocity = p.velocity.add(dv.scale(dt * MOVE_ACCELERATION / len));
                let speed = p.velocity.len();
                if speed > active_max_move_speed {
                    p.velocity = p.velocity.normalize_or_zero().scale(active_max_move_speed);
                }

                p.step_delay -= dt;
                let new_step_delay = (STEP_DELAY / speed).min(STEP_DELAY);
                if new_step_delay < p.step_delay {
                    p.step_delay = new_step_delay;
                }
                if p.step_delay < 0.0 {
                    p.step_delay = new_step_delay;

                    let step_offset = if p.step_left_side { 0.25 } else { -0.25 };
                    let orthogonal = Vec2::new(-p.look.y, p.look.x);
                    let step_pos = p.pos.add(orthogonal.scale(step_offset));
                    self.sounds.push(SpatialSound {
                        player_id: id,
                        sound: Sound::Step,
                        pos: step_pos,
                    });
                    let step_event = StepEvent {
                        player_id: id,
                        pos: step_pos,
                        time_left: STEP_VISUAL_FADE_TIME,
                    };
                    self.steps.push(step_event);
                    self.new_steps.push(step_event);
                    p.step_left_side = !p.step_left_side;
                }
            } else {
                let slowdown_dir = p.velocity.normalize_or_zero().neg();
                let speed = p.velocity.len();
                if speed > 0.0 {
                    let slowdown = speed.min(dt * MOVE_ACCELERATION);
                    p.velocity = p.velocity.add(slowdown_dir.scale(slowdown));
                } else {
                    p.step_delay = 0.0;
                }
            }
        }

        if !p.velocity.is_zero() {
            p.pos = p.pos.add(p.velocity.scale(dt));
        }

        self.players.insert(id, p);
    }

    fn fire_hitscan(&mut self, shooter: &Player) {
        let map_res = raycast_map(&self.map, shooter.pos, shooter.look);
        let (player_res, hit_player) = raycast_players(&self.players, shooter.pos, shooter.look);

        let impact = if hit_player.is_some() {
            player_res.impact
        } else {
            map_res.impact
        };

        let hitscan = HitscanProjectile {
            source: shooter.id,
            target: hit_player,
            dir: shooter.look,
            pos: shooter.pos,
            impact,
            time_left: SNIPER_TRAIL_TIME,
        };
        self.hitscans.push(hitscan);
        self.new_hitscans.push(hitscan);

        let player_hit_is_closer = player_res.hit && (!map_res.hit || player_res.distance < map_res.distance);
        if player_hit_is_closer {
            if let Some(target) = hit_player {
                self.damages.push(DamageEntry {
                    player_id: target,
                    damage: SNIPER_DAMAGE,
                });
            }
        }
    }

    fn fire_nade(&mut self, shooter: &Player) {
        let res = raycast_map(&self.map, shooter.pos, shooter.look);

        let nade = GrenadeProjectile {
            source: shooter.id,
            dir: shooter.look,
            start_pos: shooter.pos,
            pos: shooter.pos,
            speed: NADE_SPEED_PER_DISTANCE * shooter.nade_distance,
            impact: res.impact,
            impact_normal: res.normal,
            impact_distance: res.distance,
            time_left: NADE_EXPLODE_TIME,
        };
        self.nades.push(nade);
        self.new_nades.push(nade);
    }

    fn update_projectiles(&mut self, dt: f32) {
        for hitscan in self.hitscans.iter_mut() {
            if hitscan.time_left == SNIPER_TRAIL_TIME {
                self.sounds.push(SpatialSound {
                    player_id: hitscan.source,
                    sound: Sound::SniperFire,
                    pos: hitscan.pos,
                });
            }
            hitscan.time_left = (hitscan.time_left - dt).max(0.0);
        }
        for i in 0..self.hitscans.len() {
            if self.hitscans.get(i).map(|h| h.time_left <= 0.0).unwrap_or(false) {
                self.hitscans.tag_remove(i);
            }
        }
        self.hitscans.compact();

        let mut exploded = Vec::new();
        for i in 0..self.nades.len() {
            let Some(nade) = self.nades.get_mut(i) else { continue };

            let mut vel = nade.dir.scale(nade.speed);
            let slowdown_dir = vel.normalize_or_zero().neg();
            let speed = nade.speed;
            if speed > 0.0 {
                let slowdown = speed.min(dt * NADE_DECELERATION);
                vel = vel.add(slowdown_dir.scale(slowdown));
                nade.speed = vel.len();
            }
            nade.pos = nade.pos.add(vel.scale(dt));

            let dist_sq = nade.pos.sub(nade.start_pos).len_sq();
            if dist_sq > nade.impact_distance * nade.impact_distance {
                nade.dir = nade.dir.reflect(nade.impact_normal);
                nade.start_pos = nade.impact.add(nade.impact_normal.scale(0.1));

                let res = raycast_map(&self.map, nade.start_pos, nade.dir);
                nade.pos = nade.start_pos;
                nade.impact = res.impact;
                nade.impact_distance = res.distance;

                self.sounds.push(SpatialSound {
                    player_id: nade.source,
                    sound: Sound::NadeDoink,
                    pos: nade.pos,
                });
            }

            nade.time_left -= dt;
            if dt > 0.0 && (nade.time_left / dt) as u32 % 64 == 0 {
                self.sounds.push(SpatialSound {
                    player_id: nade.source,
                    sound: Sound::NadeBeep,
                    pos: nade.pos,
                });
            }

            if nade.time_left < 0.0 {
                nade.time_left = 0.0;
                self.sounds.push(SpatialSound {
                    player_id: nade.source,
                    sound: Sound::NadeExplosion,
                    pos: nade.pos,
                });
                exploded.push((i, Explosion {
                    source: nade.source,
                    pos: nade.pos,
                    radius: NADE_EXPLOSION_RADIUS,
                    time_left: NADE_EXPLOSION_FADE_TIME,
                }));
            }
        }

        for (index, explosion) in exploded {
            self.resolve_explosion_damage(&explosion);
            self.explosions.push(explosion);
            self.nades.tag_remove(index);
        }
        self.nades.compact();

        for i in 0..self.explosions.len() {
            let Some(e) = self.explosions.get_mut(i) else { continue };
            e.time_left -= dt;
            if e.time_left < 0.0 {
                e.time_left = 0.0;
                self.explosions.tag_remove(i);
            }
        }
        self.explosions.compact();

        for i in 0..self.steps.len() {
            let Some(s) = self.steps.get_mut(i) else { continue };
            s.time_left -= dt;
            if s.time_left < 0.0 {
                s.time_left = 0.0;
                self.steps.tag_remove(i);
            }
        }
        self.steps.compact();
    }

    fn resolve_explosion_damage(&mut self, explosion: &Explosion) {
        let ids: Vec<PlayerId> = self.players.iter().map(|(id, _)| id).collect();
        for id in ids {
            let p = *self.players.get(id).expect("id from iter always present");
            let result = collision::circle_vs_circle(
                Circle { pos: p.pos, radius: PLAYER_RADIUS },
                Circle { pos: explosion.pos, radius: explosion.radius },
            );
            if !result.colliding {
                continue;
            }
            let diff = p.pos.sub(explosion.pos);
            let dist_to_player = diff.len();
            if dist_to_player <= f32::EPSILON {
                self.damages.push(DamageEntry { player_id: id, damage: NADE_DAMAGE });
                continue;
            }
            let dir = diff.div(dist_to_player);
            let res = raycast_map(&self.map, explosion.pos, dir);
            if res.distance >= dist_to_player {
                self.damages.push(DamageEntry { player_id: id, damage: NADE_DAMAGE });
            }
        }
    }

    fn collect_and_resolve_static_collisions(&mut self, ids: &[PlayerId]) {
        const TILE_OFFSETS: [(f32, f32); 8] = [
            (1.0, 0.0),
            (1.0, -1.0),
            (0.0, -1.0),
            (-1.0, -1.0),
            (-1.0, 0.0),
            (-1.0, 1.0),
            (0.0, 1.0),
            (1.0, 1.0),
        ];

        for &id in ids {
            let mut p = match self.players.get(id) {
                Some(p) => *p,
                None => continue,
            };

            for (ox, oy) in TILE_OFFSETS {
                let at = p.pos.add(Vec2::new(ox, oy).scale(self.map.tile_size));
                if self.map.tile_at(at) != crate::map::Tile::Stone {
                    continue;
                }

                let aabb = Aabb {
                    pos: Vec2::new(at.x.floor(), at.y.floor()),
                    width: self.map.tile_size,
                    height: self.map.tile_size,
                };
                let result = collision::aabb_vs_circle(
                    aabb,
                    Circle { pos: p.pos, radius: PLAYER_RADIUS },
                );
                if !result.colliding || result.resolve.is_zero() {
                    continue;
                }

                p.pos = p.pos.add(result.resolve);

                if p.state == MovementState::Sliding {
                    let dot = p.dodge.dot(result.resolve.normalize_or_zero());
                    if dot <= WALL_CANCEL_DOT_THRESHOLD {
                        p.state = MovementState::Default;
                        p.time_left_in_dodge = 0.0;
                        p.time_left_in_dodge_delay = DODGE_DELAY_TIME;
                    }
                }
            }

            self.players.insert(id, p);
        }
    }
}

/// `dir` must be a unit vector.
pub fn raycast_map(map: &Map, pos: Vec2, dir: Vec2) -> collision::RaycastResult {
    let mut best = collision::RaycastResult {
        distance: f32::MAX,
        ..Default::default()
    };

    for (i, j) in map.iter_stone_tiles() {
        let origin = map.tile_origin(i, j);
        let aabb = Aabb {
            pos: origin,
            width: map.tile_size,
            height: map.tile_size,
        };
        let res = collision::ray_vs_aabb(pos, dir, aabb);
        if res.hit && res.distance < best.distance {
            best = res;
        }
    }

    best.hit = best.distance != f32::MAX;
    best
}

/// `dir` must be a unit vector. Returns the hit result plus the id of the
/// nearest player struck, if any.
pub fn raycast_players(
    players: &PlayerMap<Player>,
    pos: Vec2,
    dir: Vec2,
) -> (collision::RaycastResult, Option<PlayerId>) {
    let mut best = collision::RaycastResult {
        distance: f32::MAX,
        ..Default::default()
    };
    let mut hit_id = None;

    for (id, p) in players.iter() {
        let res = collision::ray_vs_circle(pos, dir, Circle { pos: p.pos, radius: PLAYER_RADIUS });
        if res.hit && res.distance < best.distance {
            best = res;
            hit_id = Some(id);
        }
    }

    best.hit = best.distance != f32::MAX;
    (best, hit_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u64) -> PlayerId {
        PlayerId::new(n).unwrap()
    }

    fn test_game() -> Game {
        Game::new(Map::default_arena())
    }

    #[test]
    fn player_accelerates_toward_move_direction() {
        let mut game = test_game();
        game.spawn_player(pid(1), Vec2::new(5.0, 5.0), 0.0);

        let mut inputs = PlayerMap::with_capacity(4);
        inputs.insert(pid(1), Input { move_right: true, ..Default::default() });

        let before = game.players.get(pid(1)).unwrap().pos;
        game.step(&inputs, 1.0 / 60.0);
        let after = game.players.get(pid(1)).unwrap().pos;
        assert!(after.x > before.x);
    }

    #[test]
    fn dodge_enters_sliding_state_and_boosts_speed() {
        let mut game = test_game();
        game.spawn_player(pid(1), Vec2::new(5.0, 5.0), 0.0);

        let mut inputs = PlayerMap::with_capacity(4);
        inputs.insert(pid(1), Input { dodge: true, look: Vec2::new(1.0, 0.0), ..Default::default() });
        game.step(&inputs, 1.0 / 60.0);

        let p = game.players.get(pid(1)).unwrap();
        assert_eq!(p.state, MovementState::Sliding);
        assert!(p.time_left_in_dodge > 0.0);
    }

    #[test]
    fn sniper_shot_damages_player_in_line_of_sight() {
        let mut game = test_game();
        game.spawn_player(pid(1), Vec2::new(2.5, 2.5), 0.0);
        game.spawn_player(pid(2), Vec2::new(10.5, 2.5), 0.3);

        let mut inputs = PlayerMap::with_capacity(4);
        inputs.insert(
            pid(1),
            Input { look: Vec2::new(1.0, 0.0), shoot_pressed: true, ..Default::default() },
        );
        game.step(&inputs, 1.0 / 60.0);

        let target = game.players.get(pid(2)).unwrap();
        assert!(target.health < 100.0);
    }

    #[test]
    fn wall_cancels_dodge_on_near_head_on_impact() {
        let mut game = test_game();
        // Arena border is stone at x=0; place the player one step inside,
        // sliding due west so it slams directly into the wall.
        game.spawn_player(pid(1), Vec2::new(1.1, 5.5), 0.0);

        let mut inputs = PlayerMap::with_capacity(4);
        inputs.insert(
            pid(1),
            Input { look: Vec2::new(-1.0, 0.0), dodge: true, ..Default::default() },
        );
        for _ in 0..30 {
            game.step(&inputs, 1.0 / 60.0);
        }

        let p = game.players.get(pid(1)).unwrap();
        assert!(p.pos.x >= 1.0);
    }

    #[test]
    fn hitscan_projectile_fades_out_after_trail_time() {
        let mut game = test_game();
        game.spawn_player(pid(1), Vec2::new(2.5, 2.5), 0.0);

        let mut inputs = PlayerMap::with_capacity(4);
        inputs.insert(
            pid(1),
            Input { look: Vec2::new(1.0, 0.0), shoot_pressed: true, ..Default::default() },
        );
        game.step(&inputs, 1.0 / 60.0);
        assert_eq!(game.hitscans().count(), 1);

        inputs.get_mut(pid(1)).unwrap().shoot_pressed = false;
        for _ in 0..(SNIPER_TRAIL_TIME / (1.0 / 60.0)) as u32 + 2 {
            game.step(&inputs, 1.0 / 60.0);
        }
        assert_eq!(game.hitscans().count(), 0);
    }
}
