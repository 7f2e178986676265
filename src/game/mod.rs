//! Game module - Core game logic and state management

mod actions;
mod panels;
mod settings;
pub(crate) mod state;

pub use actions::{MoveOutcome, PlayerRewards};
pub use panels::{Panel, Panels};
pub use settings::{Difficulty, GameSettings, SettingsError, SEED_ENV};
pub use state::{Game, GameMessage, GameState, MessageCategory, MAX_MESSAGES, SIGHT_RADIUS};
