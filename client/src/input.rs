//! Player input capture.
//!
//! Samples the full `shared::Input` bitset every tick - unlike the previous
//! change-detected scheme, the current input is sent unconditionally each
//! network tick, so the server always has exactly one update per client per
//! tick to apply.

use macroquad::prelude::*;
use shared::{Input, Vec2};

pub struct InputManager;

impl InputManager {
    pub fn new() -> Self {
        InputManager
    }

    /// Samples keyboard and mouse state into one `Input` record. `look` is
    /// the direction from screen center to the cursor; the simulation
    /// re-normalizes it, so a zero vector (cursor dead center) is safe.
    pub fn sample(&self) -> Input {
        let move_left = is_key_down(KeyCode::A) || is_key_down(KeyCode::Left);
        let move_right = is_key_down(KeyCode::D) || is_key_down(KeyCode::Right);
        let move_up = is_key_down(KeyCode::W) || is_key_down(KeyCode::Up);
        let move_down = is_key_down(KeyCode::S) || is_key_down(KeyCode::Down);

        let dodge = is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift);
        let switch_weapon = is_key_pressed(KeyCode::Tab) || is_key_pressed(KeyCode::Q);
        let zoom = is_mouse_button_down(MouseButton::Right);

        let shoot_pressed = is_mouse_button_pressed(MouseButton::Left);
        let shoot_held = is_mouse_button_down(MouseButton::Left);
        let shoot_released = is_mouse_button_released(MouseButton::Left);

        let quit = is_key_pressed(KeyCode::Escape);
        let mute = is_key_pressed(KeyCode::M);
        let fullscreen = is_key_pressed(KeyCode::F11);

        let (mouse_x, mouse_y) = mouse_position();
        let look = Vec2::new(mouse_x - screen_width() / 2.0, mouse_y - screen_height() / 2.0);

        Input {
            look,
            move_left,
            move_right,
            move_up,
            move_down,
            dodge,
            shoot_pressed,
            shoot_held,
            shoot_released,
            switch_weapon,
            zoom,
            quit,
            mute,
            fullscreen,
        }
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
