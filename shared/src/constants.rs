//! Tuning constants for the simulation step and the tick clock.
//!
//! Carried over from the reference implementation's tuning values so that
//! prediction and authority stay numerically identical across client and server.

/// Simulation frames per second; `dt = 1.0 / FPS`.
pub const FPS: u32 = 60;
/// Number of sim-ticks per network tick.
pub const NET_PER_SIM: u64 = 1;
/// Maximum number of simultaneously connected clients.
pub const MAX_CLIENTS: usize = 128;
/// Valid tick window: how far behind the server's scheduling horizon a
/// client's batch may be before it is dropped.
pub const VALID_TICK_WINDOW: u64 = 5;
/// Capacity of the client-side input ring buffer.
pub const INPUT_RING_CAPACITY: usize = 512;
/// Bounded render delay used for the remote-peer snapshot buffer's `active_tick`.
pub const RENDER_DELAY_TICKS: u64 = 2 * NET_PER_SIM;

/// Collision radius used for all players.
pub const PLAYER_RADIUS: f32 = 0.25;

pub const MOVE_ACCELERATION: f32 = 50.0;
pub const MAX_MOVE_SPEED: f32 = 5.0;
pub const STEP_DELAY: f32 = 1.0;

pub const DODGE_ACCELERATION: f32 = 100.0;
pub const DODGE_DECELERATION: f32 = 10.0;
pub const MAX_DODGE_SPEED: f32 = 10.0;
pub const DODGE_TIME: f32 = 0.20;
pub const DODGE_DELAY_TIME: f32 = 1.0;

pub const WEAPON_SNIPER_COOLDOWN: f32 = 1.0;
pub const WEAPON_NADE_COOLDOWN: f32 = 3.0;

pub const SNIPER_TRAIL_TIME: f32 = 1.0;
pub const SNIPER_DAMAGE: f32 = 100.0;
pub const MAX_SNIPER_ZOOM: f32 = 1.0;
pub const SNIPER_ZOOM_RATE: f32 = 0.01;
pub const SNIPER_MOVE_SPEED_PENALTY: f32 = 2.5;

pub const NADE_DECELERATION: f32 = 10.0;
pub const NADE_EXPLODE_TIME: f32 = 2.0;
pub const NADE_MAX_DISTANCE: f32 = 3.0;
pub const NADE_CHARGE_RATE: f32 = 0.1;
pub const NADE_SPEED_PER_DISTANCE: f32 = 4.0;
pub const NADE_EXPLOSION_RADIUS: f32 = 2.0;
pub const NADE_EXPLOSION_FADE_TIME: f32 = 1.0;
pub const NADE_DAMAGE: f32 = 100.0;

/// Dot-product threshold below which a wall resolve vector is considered
/// "opposed" to the current slide/move direction (cancels the slide).
pub const WALL_CANCEL_DOT_THRESHOLD: f32 = -0.6;

pub const MAX_PROJECTILES: usize = 64;
pub const MAX_EXPLOSIONS: usize = 64;
pub const MAX_SOUNDS_PER_TICK: usize = 64;
pub const MAX_STEPS: usize = 128;
pub const STEP_VISUAL_FADE_TIME: f32 = 5.0;
