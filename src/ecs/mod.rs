//! Entity Component System module
//!
//! Defines all components and systems for the game.

pub mod components;
pub mod systems;

pub use components::*;
pub use systems::{execute_ai_actions, run_monster_ai, tick_animations, AIAction, MonsterAttack};
