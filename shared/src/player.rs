//! The replicated per-player record.

use crate::constants::{MAX_SNIPER_ZOOM, WEAPON_NADE_COOLDOWN, WEAPON_SNIPER_COOLDOWN};
use crate::ids::PlayerId;
use crate::vec2::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementState {
    Default,
    Sliding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weapon {
    Sniper,
    Nade,
}

/// The full simulation record for a player.
///
/// This is the exact payload carried on the wire for `Auth`/`PeerAuth`/`PlayerSpawn`
/// (see the wire protocol): every field here is part of the stable, packed layout,
/// serialized field-by-field by `serde`/`bincode` rather than relying on any
/// host-specific struct layout.
///
/// Invariants: `health >= 0`; `|look| == 1`; `state == Sliding` implies
/// `time_left_in_dodge >= 0` or the player is decelerating out of the slide;
/// `time_left_in_dodge_delay > 0` implies `state == Default`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,

    pub pos: Vec2,
    pub velocity: Vec2,

    pub dodge: Vec2,
    pub look: Vec2,

    pub step_delay: f32,
    pub step_left_side: bool,

    pub time_left_in_dodge: f32,
    pub time_left_in_dodge_delay: f32,

    pub hue: f32,
    pub health: f32,

    pub weapon_cooldowns: [f32; 2],
    pub weapons: [Weapon; 2],
    pub current_weapon: usize,

    pub nade_distance: f32,
    pub sniper_zoom: f32,

    pub state: MovementState,
}

impl Player {
    pub fn new(id: PlayerId, pos: Vec2, hue: f32) -> Self {
        Player {
            id,
            pos,
            velocity: Vec2::ZERO,
            dodge: Vec2::ZERO,
            look: Vec2::new(1.0, 0.0),
            step_delay: 0.0,
            step_left_side: false,
            time_left_in_dodge: 0.0,
            time_left_in_dodge_delay: 0.0,
            hue,
            health: 100.0,
            weapon_cooldowns: [0.0, 0.0],
            weapons: [Weapon::Sniper, Weapon::Nade],
            current_weapon: 0,
            nade_distance: 0.0,
            sniper_zoom: 0.0,
            state: MovementState::Default,
        }
    }

    pub fn current_weapon(&self) -> Weapon {
        self.weapons[self.current_weapon]
    }

    pub fn weapon_cooldown(&self) -> f32 {
        self.weapon_cooldowns[self.current_weapon]
    }

    pub fn set_weapon_cooldown(&mut self, value: f32) {
        self.weapon_cooldowns[self.current_weapon] = value;
    }

    pub fn can_fire(&self) -> bool {
        self.weapon_cooldown() <= 0.0
    }

    pub fn weapon_cooldown_for(weapon: Weapon) -> f32 {
        match weapon {
            Weapon::Sniper => WEAPON_SNIPER_COOLDOWN,
            Weapon::Nade => WEAPON_NADE_COOLDOWN,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Max move speed, reduced while zoomed in with the sniper.
    pub fn active_max_move_speed(&self, base_max_move_speed: f32) -> f32 {
        if self.sniper_zoom > 0.0 {
            base_max_move_speed
                - crate::constants::SNIPER_MOVE_SPEED_PENALTY * self.sniper_zoom.min(MAX_SNIPER_ZOOM)
        } else {
            base_max_move_speed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u64) -> PlayerId {
        PlayerId::new(n).unwrap()
    }

    #[test]
    fn new_player_has_full_health_and_unit_look() {
        let p = Player::new(pid(1), Vec2::ZERO, 0.3);
        assert_eq!(p.health, 100.0);
        assert_eq!(p.look.len_sq(), 1.0);
    }

    #[test]
    fn sniper_zoom_reduces_move_speed() {
        let mut p = Player::new(pid(1), Vec2::ZERO, 0.0);
        p.sniper_zoom = 1.0;
        assert!(p.active_max_move_speed(5.0) < 5.0);
    }

    #[test]
    fn roundtrips_through_bincode() {
        let p = Player::new(pid(7), Vec2::new(1.0, 2.0), 0.5);
        let bytes = bincode::serialize(&p).unwrap();
        let decoded: Player = bincode::deserialize(&bytes).unwrap();
        assert_eq!(p, decoded);
    }
}
