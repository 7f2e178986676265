//! Save/load system
//!
//! Slot-based save files in the platform data directory.

pub mod save_game;

pub use save_game::{
    EquipmentSave, ItemOnGround, PlayerSave, QuestLogSave, QuestProgress, SaveData, SaveError, SaveStore,
    SaveSummary, SAVE_SLOTS, SAVE_VERSION,
};
