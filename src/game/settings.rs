//! Game settings
//!
//! Persisted as `settings.ron` in the platform config directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable that fixes the world seed
pub const SEED_ENV: &str = "TILEQUEST_SEED";

const SPEED_STEP: f32 = 0.1;
const MIN_SPEED: f32 = 0.1;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Monster speed multiplier for this difficulty
    pub fn monster_speed(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 1.2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

fn default_data_dir() -> PathBuf {
    crate::data::DataManager::default_dir()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub map_width: i32,
    pub map_height: i32,
    pub monster_speed_multiplier: f32,
    pub difficulty: Difficulty,
    pub initial_monsters: usize,
    pub inventory_capacity: usize,
    /// Where quest, dialog and monster content is read from
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            map_width: 80,
            map_height: 80,
            monster_speed_multiplier: 1.0,
            difficulty: Difficulty::Medium,
            initial_monsters: 20,
            inventory_capacity: crate::items::DEFAULT_CAPACITY,
            data_dir: default_data_dir(),
        }
    }
}

impl GameSettings {
    /// Switch difficulty and take its monster speed
    pub fn adjust_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.monster_speed_multiplier = difficulty.monster_speed();
        log::info!("Difficulty set to {} (monster speed {:.1})", difficulty.name(), self.monster_speed_multiplier);
    }

    pub fn increase_monster_speed(&mut self) {
        self.monster_speed_multiplier += SPEED_STEP;
    }

    pub fn decrease_monster_speed(&mut self) {
        self.monster_speed_multiplier = (self.monster_speed_multiplier - SPEED_STEP).max(MIN_SPEED);
    }

    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }

    /// Path of the settings file
    pub fn settings_path() -> PathBuf {
        use directories::ProjectDirs;

        if let Some(proj_dirs) = ProjectDirs::from("com", "tilequest", "Tilequest") {
            proj_dirs.config_dir().join("settings.ron")
        } else {
            PathBuf::from("./settings.ron")
        }
    }

    /// Load settings, falling back to defaults
    pub fn load() -> Self {
        let path = Self::settings_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => {
                log::info!("Settings loaded from {:?}", path);
                settings
            }
            Err(e) => {
                log::warn!("Failed to load settings: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|e| SettingsError::IoError(e.to_string()))?;
        ron::from_str(&content).map_err(|e| SettingsError::ParseError(e.to_string()))
    }

    pub fn save_settings(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| SettingsError::IoError(e.to_string()))?;
        }
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SettingsError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(|e| SettingsError::IoError(e.to_string()))
    }

    /// Seed from `TILEQUEST_SEED`, if set and numeric
    pub fn seed_from_env() -> Option<u64> {
        let raw = std::env::var(SEED_ENV).ok()?;
        match raw.trim().parse() {
            Ok(seed) => Some(seed),
            Err(_) => {
                log::warn!("Ignoring non-numeric {}={}", SEED_ENV, raw);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_sets_monster_speed() {
        let mut settings = GameSettings::default();
        settings.adjust_difficulty(Difficulty::Hard);
        assert_eq!(settings.monster_speed_multiplier, 1.2);
        settings.adjust_difficulty(Difficulty::Easy);
        assert_eq!(settings.monster_speed_multiplier, 0.8);
    }

    #[test]
    fn test_speed_has_floor() {
        let mut settings = GameSettings::default();
        for _ in 0..30 {
            settings.decrease_monster_speed();
        }
        assert!((settings.monster_speed_multiplier - MIN_SPEED).abs() < 1e-6);
        settings.increase_monster_speed();
        assert!(settings.monster_speed_multiplier > MIN_SPEED);
        settings.reset_to_defaults();
        assert_eq!(settings, GameSettings::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.ron");
        let mut settings = GameSettings::default();
        settings.map_width = 64;
        settings.initial_monsters = 5;
        settings.save_to(&path).unwrap();
        assert_eq!(GameSettings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        fs::write(&path, "(map_width: 40)").unwrap();
        let settings = GameSettings::load_from(&path).unwrap();
        assert_eq!(settings.map_width, 40);
        assert_eq!(settings.initial_monsters, 20);
    }
}
