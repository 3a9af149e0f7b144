//! Per-tick player input: a look direction plus a bitset of discrete actions.

use crate::vec2::Vec2;
use serde::{Deserialize, Serialize};

/// One tick's worth of captured input.
///
/// The loop is responsible for sampling and timestamping this; the input
/// source itself only fills in `look` and the action bits (see the boundary
/// contract for the external input-capture collaborator).
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub look: Vec2,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub dodge: bool,
    pub shoot_pressed: bool,
    pub shoot_held: bool,
    pub shoot_released: bool,
    pub switch_weapon: bool,
    pub zoom: bool,
    pub quit: bool,
    pub mute: bool,
    pub fullscreen: bool,
}

impl Input {
    /// The WASD movement vector (not yet normalized).
    pub fn move_vector(&self) -> Vec2 {
        let dx = (self.move_right as i32 - self.move_left as i32) as f32;
        let dy = (self.move_down as i32 - self.move_up as i32) as f32;
        Vec2::new(dx, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_vector_cancels_opposing_keys() {
        let input = Input {
            move_left: true,
            move_right: true,
            ..Default::default()
        };
        let v = input.move_vector();
        assert_eq!(v.x, 0.0);
    }

    #[test]
    fn move_vector_reflects_single_direction() {
        let input = Input {
            move_up: true,
            ..Default::default()
        };
        assert_eq!(input.move_vector(), Vec2::new(0.0, -1.0));
    }
}
