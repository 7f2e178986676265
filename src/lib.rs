//! Tilequest - a 2D tile RPG for the terminal
//!
//! Explore a generated overworld, talk to villagers, and follow a quest
//! chain driven by dialog and story flags.

pub mod data;
pub mod dialog;
pub mod ecs;
pub mod entities;
pub mod game;
pub mod items;
pub mod progression;
pub mod quests;
pub mod save;
pub mod ui;
pub mod world;

// Re-export commonly used types
pub use game::{Game, GameState};
pub use world::map::Map;
