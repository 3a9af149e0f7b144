//! Shared data structures, constants and pure logic used by both the server
//! and the client: the replicated game record, the deterministic simulation
//! step, collision primitives, the wire protocol and the fixed-capacity
//! collections it all runs on.
//!
//! Everything in this crate must stay platform-independent and
//! non-allocating-per-tick where the reference implementation was: no
//! rendering, no sockets, no wall-clock reads inside [`sim::Game::step`].

pub mod collections;
pub mod collision;
pub mod constants;
pub mod ids;
pub mod input;
pub mod map;
pub mod packet;
pub mod player;
pub mod projectile;
pub mod rng;
pub mod sim;
pub mod vec2;

pub use constants::*;
pub use ids::{PlayerId, PlayerIdAllocator};
pub use input::Input;
pub use map::{Map, Tile};
pub use player::{MovementState, Player, Weapon};
pub use sim::Game;
pub use vec2::Vec2;
