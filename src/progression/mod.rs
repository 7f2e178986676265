//! Progression systems

pub mod xp;

pub use xp::{apply_level_ups, level_title, total_xp_for_level, xp_for_level, HEALTH_PER_LEVEL};
