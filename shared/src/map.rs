//! The static tile arena.

use crate::vec2::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Invalid,
    Grass,
    Stone,
}

/// Row-major grid of tiles. Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Map {
    tiles: Vec<Tile>,
    pub width: u32,
    pub height: u32,
    pub tile_size: f32,
    pub origin: Vec2,
}

impl Map {
    pub fn from_ascii(rows: &[&str], tile_size: f32, origin: Vec2) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.len()).unwrap_or(0) as u32;
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for row in rows {
            for ch in row.chars() {
                tiles.push(match ch {
                    '#' => Tile::Stone,
                    ' ' => Tile::Grass,
                    _ => Tile::Invalid,
                });
            }
        }
        Map {
            tiles,
            width,
            height,
            tile_size,
            origin,
        }
    }

    /// The default 30x30 arena, ported from the reference implementation.
    pub fn default_arena() -> Self {
        Map::from_ascii(
            &[
                "##############################",
                "#                            #",
                "#                            #",
                "#    ####################    #",
                "#    #                  #    #",
                "#    ####            ####    #",
                "#                            #",
                "#                            #",
                "########              ########",
                "#                            #",
                "#  #                      #  #",
                "#  #                      #  #",
                "#                            #",
                "#####  ################  #####",
                "#                            #",
                "#                            #",
                "#                            #",
                "#                            #",
                "#  ##                    ##  #",
                "#                            #",
                "#                            #",
                "#                            #",
                "#            ####            #",
                "#                            #",
                "#            ####            #",
                "#                            #",
                "#                            #",
                "#                            #",
                "#                            #",
                "##############################",
            ],
            1.0,
            Vec2::ZERO,
        )
    }

    fn coord_in_bounds(&self, i: i32, j: i32) -> bool {
        i >= 0 && (i as u32) < self.width && j >= 0 && (j as u32) < self.height
    }

    fn coord_at(&self, at: Vec2) -> (i32, i32) {
        let i = ((at.x - self.origin.x) / self.tile_size).floor() as i32;
        let j = ((at.y - self.origin.y) / self.tile_size).floor() as i32;
        (i, j)
    }

    pub fn tile_at(&self, at: Vec2) -> Tile {
        let (i, j) = self.coord_at(at);
        if !self.coord_in_bounds(i, j) {
            return Tile::Invalid;
        }
        self.tiles[(j as u32 * self.width + i as u32) as usize]
    }

    pub fn tile_at_coord(&self, i: i32, j: i32) -> Tile {
        if !self.coord_in_bounds(i, j) {
            return Tile::Invalid;
        }
        self.tiles[(j as u32 * self.width + i as u32) as usize]
    }

    /// World-space origin of tile `(i, j)`.
    pub fn tile_origin(&self, i: i32, j: i32) -> Vec2 {
        Vec2::new(
            self.origin.x + i as f32 * self.tile_size,
            self.origin.y + j as f32 * self.tile_size,
        )
    }

    pub fn iter_stone_tiles(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..self.height as i32).flat_map(move |j| {
            (0..self.width as i32).filter_map(move |i| {
                if self.tile_at_coord(i, j) == Tile::Stone {
                    Some((i, j))
                } else {
                    None
                }
            })
        })
    }

    /// A deterministic iterator over grass tile world-centers, used for
    /// respawn selection by the seeded PCG (never by any unseeded RNG).
    pub fn grass_tile_centers(&self) -> Vec<Vec2> {
        let mut out = Vec::new();
        for j in 0..self.height as i32 {
            for i in 0..self.width as i32 {
                if self.tile_at_coord(i, j) == Tile::Grass {
                    let o = self.tile_origin(i, j);
                    out.push(Vec2::new(
                        o.x + self.tile_size * 0.5,
                        o.y + self.tile_size * 0.5,
                    ));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stone_and_grass() {
        let map = Map::from_ascii(&["# #", "   "], 1.0, Vec2::ZERO);
        assert_eq!(map.tile_at_coord(0, 0), Tile::Stone);
        assert_eq!(map.tile_at_coord(1, 0), Tile::Grass);
        assert_eq!(map.tile_at_coord(2, 0), Tile::Stone);
    }

    #[test]
    fn out_of_bounds_is_invalid() {
        let map = Map::from_ascii(&["# #"], 1.0, Vec2::ZERO);
        assert_eq!(map.tile_at_coord(-1, 0), Tile::Invalid);
        assert_eq!(map.tile_at_coord(99, 0), Tile::Invalid);
    }

    #[test]
    fn default_arena_is_well_formed() {
        let map = Map::default_arena();
        assert_eq!(map.width, 30);
        assert_eq!(map.height, 30);
        assert!(!map.grass_tile_centers().is_empty());
    }
}
