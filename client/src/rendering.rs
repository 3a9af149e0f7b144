//! Client rendering: the tile arena, players, fading event markers and the
//! netcode status overlay.
//!
//! The renderer stays stateless (no persistent state between frames) except
//! for [`VisualEffects`], which the network layer feeds from server packets
//! that have no persistent representation in [`shared::Game`] - trails,
//! explosions, footsteps. Those just need a local fade timer, not a replay
//! buffer, so they live here rather than in `ClientGame`.

use macroquad::prelude::*;
use shared::player::Weapon;
use shared::{
    Map, Player, PlayerId, Vec2, NADE_EXPLOSION_FADE_TIME, NADE_EXPLOSION_RADIUS, PLAYER_RADIUS,
    SNIPER_TRAIL_TIME, STEP_VISUAL_FADE_TIME,
};

/// World units to screen pixels.
const TILE_PIXELS: f32 = 32.0;

fn world_to_screen(pos: Vec2) -> (f32, f32) {
    (pos.x * TILE_PIXELS, pos.y * TILE_PIXELS)
}

/// Fading visual markers triggered by server events with no persistent game
/// state of their own - hitscan trails, grenade explosions, footsteps. Each
/// entry carries its own remaining lifetime and ages out on [`Self::tick`].
#[derive(Default)]
pub struct VisualEffects {
    hitscans: Vec<(Vec2, Vec2, f32)>,
    nade_launches: Vec<(Vec2, f32)>,
    explosions: Vec<(Vec2, f32)>,
    steps: Vec<(Vec2, f32)>,
}

impl VisualEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hitscan(&mut self, pos: Vec2, impact: Vec2) {
        self.hitscans.push((pos, impact, SNIPER_TRAIL_TIME));
    }

    pub fn add_nade_launch(&mut self, pos: Vec2) {
        self.nade_launches.push((pos, SNIPER_TRAIL_TIME * 0.5));
    }

    pub fn add_explosion(&mut self, pos: Vec2) {
        self.explosions.push((pos, NADE_EXPLOSION_FADE_TIME));
    }

    pub fn add_step(&mut self, pos: Vec2) {
        self.steps.push((pos, STEP_VISUAL_FADE_TIME));
    }

    /// Ages every marker by `dt`, dropping the ones that have faded out.
    pub fn tick(&mut self, dt: f32) {
        for h in self.hitscans.iter_mut() {
            h.2 -= dt;
        }
        self.hitscans.retain(|h| h.2 > 0.0);

        for n in self.nade_launches.iter_mut() {
            n.1 -= dt;
        }
        self.nade_launches.retain(|n| n.1 > 0.0);

        for e in self.explosions.iter_mut() {
            e.1 -= dt;
        }
        self.explosions.retain(|e| e.1 > 0.0);

        for s in self.steps.iter_mut() {
            s.1 -= dt;
        }
        self.steps.retain(|s| s.1 > 0.0);
    }
}

/// Configuration for rendering a single frame: netcode status indicators that
/// don't belong on [`Player`] itself.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub local_player_id: Option<PlayerId>,
    pub connected: bool,
    pub ping_ms: u64,
    pub fake_ping_ms: u64,
}

/// Extends [`RenderConfig`] with the player count, known only once the
/// player slice is in hand.
#[derive(Debug, Clone)]
struct UiConfig {
    local_player_id: Option<PlayerId>,
    connected: bool,
    ping_ms: u64,
    fake_ping_ms: u64,
    player_count: usize,
}

/// Converts rendering into visual elements. Holds no state between frames
/// beyond what's passed in - [`VisualEffects`] lives in the caller.
pub struct Renderer {}

impl Renderer {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Renderer {})
    }

    pub fn render(
        &mut self,
        map: &Map,
        players: &[Player],
        effects: &VisualEffects,
        config: RenderConfig,
    ) {
        clear_background(Color::from_rgba(22, 24, 28, 255));

        self.draw_map(map);
        self.draw_effects(effects);

        for player in players {
            let is_local = Some(player.id) == config.local_player_id;
            self.draw_player(player, is_local);
        }

        let ui_config = UiConfig {
            local_player_id: config.local_player_id,
            connected: config.connected,
            ping_ms: config.ping_ms,
            fake_ping_ms: config.fake_ping_ms,
            player_count: players.len(),
        };
        self.draw_ui(ui_config);
    }

    fn draw_map(&mut self, map: &Map) {
        for (i, j) in map.iter_stone_tiles() {
            let origin = map.tile_origin(i, j);
            let (x, y) = world_to_screen(origin);
            let size = map.tile_size * TILE_PIXELS;
            draw_rectangle(x, y, size, size, Color::from_rgba(92, 92, 102, 255));
            draw_rectangle_lines(x, y, size, size, 1.0, Color::from_rgba(48, 48, 56, 255));
        }
        for center in map.grass_tile_centers() {
            let (x, y) = world_to_screen(center);
            draw_circle(x, y, 1.5, Color::from_rgba(58, 128, 68, 120));
        }
    }

    fn draw_player(&mut self, player: &Player, is_local: bool) {
        let (x, y) = world_to_screen(player.pos);
        let radius = PLAYER_RADIUS * TILE_PIXELS;
        let color = hue_to_color(player.hue);

        draw_circle(x, y, radius, color);
        if is_local {
            draw_circle_lines(x, y, radius, 2.0, WHITE);
        }
        if !player.is_alive() {
            draw_line(x - radius, y - radius, x + radius, y + radius, 2.0, RED);
            draw_line(x - radius, y + radius, x + radius, y - radius, 2.0, RED);
        }

        let look_end = player.pos.add(player.look.scale(PLAYER_RADIUS * 1.6));
        let (lx, ly) = world_to_screen(look_end);
        draw_line(x, y, lx, ly, 2.0, WHITE);

        if is_local && player.sniper_zoom > 0.0 {
            draw_circle_lines(x, y, radius + player.sniper_zoom * 40.0, 1.0, YELLOW);
        }

        let weapon_label = match player.current_weapon() {
            Weapon::Sniper => "S",
            Weapon::Nade => "N",
        };
        draw_text(weapon_label, x - 4.0, y - radius - 6.0, 14.0, WHITE);

        let bar_w = radius * 2.0;
        let health_frac = (player.health / 100.0).clamp(0.0, 1.0);
        draw_rectangle(x - radius, y + radius + 3.0, bar_w, 3.0, Color::from_rgba(60, 20, 20, 200));
        draw_rectangle(x - radius, y + radius + 3.0, bar_w * health_frac, 3.0, GREEN);
    }

    fn draw_effects(&mut self, effects: &VisualEffects) {
        for &(pos, impact, time_left) in &effects.hitscans {
            let alpha = (time_left / SNIPER_TRAIL_TIME).clamp(0.0, 1.0);
            let (x1, y1) = world_to_screen(pos);
            let (x2, y2) = world_to_screen(impact);
            draw_line(x1, y1, x2, y2, 1.5, Color::new(1.0, 0.95, 0.6, alpha));
        }
        for &(pos, time_left) in &effects.nade_launches {
            let alpha = (time_left / (SNIPER_TRAIL_TIME * 0.5)).clamp(0.0, 1.0);
            let (x, y) = world_to_screen(pos);
            draw_circle(x, y, 4.0, Color::new(0.3, 0.8, 0.3, alpha));
        }
        for &(pos, time_left) in &effects.explosions {
            let alpha = (time_left / NADE_EXPLOSION_FADE_TIME).clamp(0.0, 1.0);
            let (x, y) = world_to_screen(pos);
            let radius = NADE_EXPLOSION_RADIUS * TILE_PIXELS * (1.2 - alpha * 0.2);
            draw_circle(x, y, radius, Color::new(1.0, 0.5, 0.1, alpha * 0.5));
        }
        for &(pos, time_left) in &effects.steps {
            let alpha = (time_left / STEP_VISUAL_FADE_TIME).clamp(0.0, 1.0);
            let (x, y) = world_to_screen(pos);
            draw_circle(x, y, 2.0, Color::new(0.85, 0.85, 0.85, alpha * 0.4));
        }
    }

    fn draw_ui(&mut self, config: UiConfig) {
        let y_start = 10.0;

        let connection_color = if config.connected { GREEN } else { RED };
        draw_rectangle(10.0, y_start, 8.0, 8.0, connection_color);
        let connection_text = if config.connected { "CON" } else { "DIS" };
        draw_text(connection_text, 22.0, y_start + 8.0, 12.0, WHITE);

        if !config.connected {
            draw_text("Press R to reconnect", 10.0, y_start + 22.0, 12.0, YELLOW);
        }

        let ping_y = if config.connected { y_start + 18.0 } else { y_start + 36.0 };
        let total_ping = if config.fake_ping_ms > 0 { config.fake_ping_ms } else { config.ping_ms };
        let ping_bars = ((total_ping / 20).min(10)) as i32;

        for i in 0..10i32 {
            let bar_color = if i < ping_bars {
                if total_ping < 50 {
                    GREEN
                } else if total_ping < 100 {
                    YELLOW
                } else {
                    RED
                }
            } else {
                Color::from_rgba(51, 51, 51, 255)
            };
            draw_rectangle(10.0 + (i as f32) * 3.0, ping_y, 2.0, 8.0, bar_color);
        }
        draw_text(&format!("{total_ping}ms"), 45.0, ping_y + 8.0, 12.0, WHITE);

        let player_y = ping_y + 15.0;
        for i in 0..config.player_count.min(8) {
            draw_rectangle(10.0 + (i as f32) * 4.0, player_y, 3.0, 3.0, Color::from_rgba(0, 170, 255, 255));
        }
        draw_text(&format!("{} players", config.player_count), 45.0, player_y + 3.0, 12.0, WHITE);

        if let Some(id) = config.local_player_id {
            draw_text(&format!("you: {id}"), 10.0, player_y + 18.0, 12.0, Color::from_rgba(136, 136, 136, 255));
        }
    }
}

/// Cheap HSV(hue, 1, 1) to RGB conversion for the per-player color each peer
/// already carries as `Player::hue`.
fn hue_to_color(hue: f32) -> Color {
    let h = hue.rem_euclid(1.0) * 6.0;
    let i = h.floor() as i32;
    let f = h - h.floor();
    let (r, g, b) = match i {
        0 => (1.0, f, 0.0),
        1 => (1.0 - f, 1.0, 0.0),
        2 => (0.0, 1.0, f),
        3 => (0.0, 1.0 - f, 1.0),
        4 => (f, 0.0, 1.0),
        _ => (1.0, 0.0, 1.0 - f),
    };
    Color::new(r, g, b, 1.0)
}
