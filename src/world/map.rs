//! Map data structure
//!
//! The 2D tile grid the game takes place on.

use rand::Rng;

use super::tile::{Tile, TileType};
use crate::ecs::Position;

/// How far from the centre the spawn search looks before falling back to random sampling
const SPAWN_SEARCH_RADIUS: i32 = 5;
/// Attempts for random spawn sampling
const SPAWN_RANDOM_ATTEMPTS: usize = 10_000;

/// A world map
#[derive(Debug, Clone)]
pub struct Map {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<Tile>,
    /// Seed the map was generated from (for saves)
    pub seed: u64,
}

impl Map {
    /// Create a new map filled with grass
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            tiles: vec![Tile::default(); (width * height) as usize],
            seed: 0,
        }
    }

    /// Convert 2D coordinates to 1D index
    #[inline]
    pub fn xy_to_idx(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Convert 1D index to 2D coordinates
    #[inline]
    pub fn idx_to_xy(&self, idx: usize) -> (i32, i32) {
        let idx = idx as i32;
        (idx % self.width, idx / self.width)
    }

    /// Check if coordinates are within bounds
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Get tile at position
    pub fn get_tile(&self, x: i32, y: i32) -> Option<&Tile> {
        if self.in_bounds(x, y) {
            Some(&self.tiles[self.xy_to_idx(x, y)])
        } else {
            None
        }
    }

    /// Get mutable tile at position
    pub fn get_tile_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        if self.in_bounds(x, y) {
            let idx = self.xy_to_idx(x, y);
            Some(&mut self.tiles[idx])
        } else {
            None
        }
    }

    /// Set tile type at position
    pub fn set_tile(&mut self, x: i32, y: i32, tile_type: TileType) {
        if let Some(tile) = self.get_tile_mut(x, y) {
            tile.tile_type = tile_type;
        }
    }

    /// Check if a position is walkable (out of bounds is not)
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.get_tile(x, y).map_or(false, |t| t.is_walkable())
    }

    /// Check if a position holds a wall or obstacle (out of bounds counts as wall)
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.get_tile(x, y).map_or(true, |t| !t.is_walkable())
    }

    /// Mark the tiles around a position as explored
    pub fn reveal_around(&mut self, center: Position, radius: i32) {
        for y in (center.y - radius)..=(center.y + radius) {
            for x in (center.x - radius)..=(center.x + radius) {
                if let Some(tile) = self.get_tile_mut(x, y) {
                    tile.explored = true;
                }
            }
        }
    }

    /// Iterate over every walkable position
    pub fn walkable_tiles(&self) -> impl Iterator<Item = Position> + '_ {
        self.tiles.iter().enumerate().filter_map(move |(idx, tile)| {
            if tile.is_walkable() {
                let (x, y) = self.idx_to_xy(idx);
                Some(Position::new(x, y))
            } else {
                None
            }
        })
    }

    /// Find a valid spawn position: near the centre first, then anywhere
    pub fn spawn_position(&self, rng: &mut impl Rng) -> Option<Position> {
        let cx = self.width / 2;
        let cy = self.height / 2;

        for radius in 0..SPAWN_SEARCH_RADIUS {
            for dx in -radius..=radius {
                for dy in -radius..=radius {
                    if self.is_walkable(cx + dx, cy + dy) {
                        return Some(Position::new(cx + dx, cy + dy));
                    }
                }
            }
        }

        if self.width > 2 && self.height > 2 {
            for _ in 0..SPAWN_RANDOM_ATTEMPTS {
                let x = rng.gen_range(1..self.width - 1);
                let y = rng.gen_range(1..self.height - 1);
                if self.is_walkable(x, y) {
                    return Some(Position::new(x, y));
                }
            }
        }

        // Sampling can miss on a nearly solid map; fall back to a scan
        self.walkable_tiles().next()
    }

    /// Random walkable tile, optionally keeping a distance from a point
    pub fn random_walkable(&self, rng: &mut impl Rng, avoid: Option<(Position, i32)>) -> Option<Position> {
        let candidates: Vec<Position> = self
            .walkable_tiles()
            .filter(|p| match avoid {
                Some((center, min_dist)) => p.chebyshev_distance(&center) >= min_dist,
                None => true,
            })
            .collect();
        if candidates.is_empty() {
            None
        } else {
            Some(candidates[rng.gen_range(0..candidates.len())])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_out_of_bounds_is_wall_and_not_walkable() {
        let map = Map::new(10, 10);
        assert!(map.is_wall(-1, 0));
        assert!(map.is_wall(10, 3));
        assert!(!map.is_walkable(0, 10));
        assert!(map.is_walkable(5, 5));
    }

    #[test]
    fn test_spawn_prefers_centre() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut map = Map::new(11, 11);
        map.set_tile(5, 5, TileType::Rock);
        let pos = map.spawn_position(&mut rng).unwrap();
        assert!(pos.chebyshev_distance(&Position::new(5, 5)) <= 1);
        assert!(map.is_walkable(pos.x, pos.y));
    }

    #[test]
    fn test_spawn_on_solid_map_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut map = Map::new(6, 6);
        for y in 0..6 {
            for x in 0..6 {
                map.set_tile(x, y, TileType::StoneWall);
            }
        }
        assert!(map.spawn_position(&mut rng).is_none());
    }
}
