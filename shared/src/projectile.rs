//! Projectiles, explosions, damage and the ambient audio/footstep events that
//! accompany them.

use crate::ids::PlayerId;
use crate::vec2::Vec2;
use serde::{Deserialize, Serialize};

/// A sniper shot. Purely visual after the tick it was fired on: damage is
/// resolved immediately at fire time, the projectile only carries a fading
/// trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitscanProjectile {
    pub source: PlayerId,
    pub target: Option<PlayerId>,
    pub dir: Vec2,
    pub pos: Vec2,
    pub impact: Vec2,
    pub time_left: f32,
}

/// A grenade in flight. `impact`/`impact_normal`/`impact_distance` are
/// precomputed at fire time (and recomputed on every bounce) from a single
/// map raycast, so per-tick evolution never has to raycast more than once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrenadeProjectile {
    pub source: PlayerId,
    pub dir: Vec2,
    pub start_pos: Vec2,
    pub pos: Vec2,
    pub speed: f32,
    pub impact: Vec2,
    pub impact_normal: Vec2,
    pub impact_distance: f32,
    pub time_left: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub source: PlayerId,
    pub pos: Vec2,
    pub radius: f32,
    pub time_left: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageEntry {
    pub player_id: PlayerId,
    pub damage: f32,
}

/// A single alternating-side footstep, purely visual/audible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    pub player_id: PlayerId,
    pub pos: Vec2,
    pub time_left: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sound {
    PlayerSlide,
    WeaponSwitch,
    SniperFire,
    NadeDoink,
    NadeBeep,
    NadeExplosion,
    Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialSound {
    pub player_id: PlayerId,
    pub sound: Sound,
    pub pos: Vec2,
}
