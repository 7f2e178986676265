//! Tile definitions
//!
//! Different tile types and their properties.

use serde::{Deserialize, Serialize};

/// A single tile in the map
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tile {
    pub tile_type: TileType,
    pub explored: bool,
}

impl Tile {
    pub fn new(tile_type: TileType) -> Self {
        Self {
            tile_type,
            explored: false,
        }
    }

    pub fn is_walkable(&self) -> bool {
        self.tile_type.is_walkable()
    }

    pub fn glyph(&self) -> char {
        self.tile_type.glyph()
    }

    pub fn fg_color(&self, lit: bool) -> (u8, u8, u8) {
        if lit {
            self.tile_type.fg_color()
        } else {
            let (r, g, b) = self.tile_type.fg_color();
            (r / 3, g / 3, b / 3)
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::new(TileType::Grass)
    }
}

/// Types of tiles in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    // Ground
    Grass,
    Dirt,
    Sand,
    Water,

    // Obstacles
    Rock,
    Tree,
    StoneWall,
}

impl TileType {
    pub fn is_walkable(&self) -> bool {
        matches!(
            self,
            TileType::Grass | TileType::Dirt | TileType::Sand
        )
    }

    pub fn glyph(&self) -> char {
        match self {
            TileType::Grass => '.',
            TileType::Dirt => ',',
            TileType::Sand => ':',
            TileType::Water => '~',
            TileType::Rock => '^',
            TileType::Tree => '♣',
            TileType::StoneWall => '#',
        }
    }

    pub fn fg_color(&self) -> (u8, u8, u8) {
        match self {
            TileType::Grass => (70, 140, 60),
            TileType::Dirt => (130, 100, 60),
            TileType::Sand => (210, 190, 120),
            TileType::Water => (60, 110, 200),
            TileType::Rock => (140, 140, 140),
            TileType::Tree => (40, 160, 40),
            TileType::StoneWall => (110, 110, 120),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TileType::Grass => "Grass",
            TileType::Dirt => "Dirt",
            TileType::Sand => "Sand",
            TileType::Water => "Water",
            TileType::Rock => "Rock",
            TileType::Tree => "Tree",
            TileType::StoneWall => "Stone Wall",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkability() {
        assert!(TileType::Grass.is_walkable());
        assert!(TileType::Sand.is_walkable());
        assert!(!TileType::Rock.is_walkable());
        assert!(!TileType::StoneWall.is_walkable());
        assert!(!TileType::Water.is_walkable());
    }
}
