//! External game content
//!
//! Quests, dialogs, NPC placements and monster templates are read from
//! `assets/data` so they can be edited without rebuilding.

pub mod loader;

pub use loader::{DataManager, LoadError};
