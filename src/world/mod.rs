//! World module
//!
//! Contains map data structures, tiles, procedural generation and pathfinding.

pub mod generation;
pub mod locations;
pub mod map;
pub mod pathfinding;
pub mod tile;

pub use generation::generate_outdoor;
pub use locations::{LocationRegistry, QuestLocation};
pub use map::Map;
pub use pathfinding::find_path;
pub use tile::{Tile, TileType};
