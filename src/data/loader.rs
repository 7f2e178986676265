//! Content loader
//!
//! Loads quests and dialogs (JSON), NPC placements (JSON) and monster
//! templates (RON) from disk, falling back to the built-in content.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::dialog::DialogLibrary;
use crate::entities::{MonsterTemplates, NpcDef};
use crate::quests::{LoadedQuests, QuestLoader};

const BUILTIN_QUESTS: &str = include_str!("../../assets/data/quests/main_story.json");
const BUILTIN_DIALOGS: &str = include_str!("../../assets/data/dialogs/village.json");
const BUILTIN_NPCS: &str = include_str!("../../assets/data/npcs.json");

/// Seed for reward items rolled while loading quests
const CONTENT_SEED: u64 = 0x7113;

/// Content file problems
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoadError {
    #[error("failed to read {path}: {message}")]
    IoError { path: String, message: String },
    #[error("failed to parse {path}: {message}")]
    ParseError { path: String, message: String },
}

impl LoadError {
    pub fn io(path: &Path, err: impl Display) -> Self {
        LoadError::IoError { path: path.display().to_string(), message: err.to_string() }
    }

    pub fn parse(path: &Path, err: impl Display) -> Self {
        LoadError::ParseError { path: path.display().to_string(), message: err.to_string() }
    }
}

/// All external game content
#[derive(Debug, Clone)]
pub struct DataManager {
    pub monsters: MonsterTemplates,
    pub quests: LoadedQuests,
    pub dialogs: DialogLibrary,
    pub npcs: Vec<NpcDef>,
}

impl Default for DataManager {
    /// Built-in content only
    fn default() -> Self {
        Self {
            monsters: MonsterTemplates::default(),
            quests: builtin_quests(),
            dialogs: builtin_dialogs(),
            npcs: builtin_npcs(),
        }
    }
}

impl DataManager {
    /// Load from `assets/data`
    pub fn new() -> Self {
        Self::load_from_assets()
    }

    pub fn load_from_assets() -> Self {
        Self::load_from(&Self::default_dir())
    }

    /// Load from a content directory; anything missing or broken falls
    /// back to the built-in version
    pub fn load_from(base_path: &Path) -> Self {
        let data = Self {
            monsters: Self::load_monsters(base_path),
            quests: Self::load_quests(base_path),
            dialogs: Self::load_dialogs(base_path),
            npcs: Self::load_npcs(base_path),
        };
        log::info!(
            "Content: {} monster templates, {} quests, {} dialogs, {} NPCs",
            data.monsters.templates.len(),
            data.quests.quests.len(),
            data.dialogs.len(),
            data.npcs.len()
        );
        data
    }

    fn load_monsters(base_path: &Path) -> MonsterTemplates {
        let path = base_path.join("monsters.ron");
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match ron::from_str(&content) {
                    Ok(templates) => return templates,
                    Err(e) => log::warn!("Failed to parse {}: {}", path.display(), e),
                },
                Err(e) => log::warn!("Failed to read {}: {}", path.display(), e),
            }
        }
        MonsterTemplates::default()
    }

    fn load_quests(base_path: &Path) -> LoadedQuests {
        let dir = base_path.join("quests");
        if dir.is_dir() {
            match QuestLoader::new(CONTENT_SEED).load_dir(&dir) {
                Ok(loaded) if !loaded.quests.is_empty() => return loaded,
                Ok(_) => log::warn!("No quests found in {}", dir.display()),
                Err(e) => log::warn!("{}", e),
            }
        }
        builtin_quests()
    }

    fn load_dialogs(base_path: &Path) -> DialogLibrary {
        let dir = base_path.join("dialogs");
        if dir.is_dir() {
            let mut library = DialogLibrary::new();
            match library.load_dir(&dir) {
                Ok(count) if count > 0 => return library,
                Ok(_) => log::warn!("No dialogs found in {}", dir.display()),
                Err(e) => log::warn!("{}", e),
            }
        }
        builtin_dialogs()
    }

    fn load_npcs(base_path: &Path) -> Vec<NpcDef> {
        let path = base_path.join("npcs.json");
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(npcs) => return npcs,
                    Err(e) => log::warn!("Failed to parse {}: {}", path.display(), e),
                },
                Err(e) => log::warn!("Failed to read {}: {}", path.display(), e),
            }
        }
        builtin_npcs()
    }

    /// Directory content is read from by default
    pub fn default_dir() -> PathBuf {
        PathBuf::from("assets/data")
    }
}

fn builtin_quests() -> LoadedQuests {
    QuestLoader::new(CONTENT_SEED).parse(BUILTIN_QUESTS).unwrap_or_else(|e| {
        log::warn!("Built-in quests are broken: {}", e);
        LoadedQuests::default()
    })
}

fn builtin_dialogs() -> DialogLibrary {
    let mut library = DialogLibrary::new();
    if let Err(e) = library.parse(BUILTIN_DIALOGS) {
        log::warn!("Built-in dialogs are broken: {}", e);
    }
    library
}

fn builtin_npcs() -> Vec<NpcDef> {
    serde_json::from_str(BUILTIN_NPCS).unwrap_or_else(|e| {
        log::warn!("Built-in NPCs are broken: {}", e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quests::MAIN_STORY_CHAIN;

    #[test]
    fn test_builtin_content_parses() {
        let data = DataManager::default();
        assert!(!data.quests.quests.is_empty());
        assert!(data.quests.chains.contains_key(MAIN_STORY_CHAIN));
        assert!(!data.dialogs.is_empty());
        assert!(!data.npcs.is_empty());
        // Every NPC's dialog exists
        for def in &data.npcs {
            if let Some(id) = &def.npc.dialog_id {
                assert!(data.dialogs.get(id).is_some(), "missing dialog {}", id);
            }
        }
    }

    #[test]
    fn test_missing_dir_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataManager::load_from(dir.path());
        assert_eq!(data.quests.quests.len(), DataManager::default().quests.quests.len());
        assert_eq!(data.monsters.templates.len(), MonsterTemplates::default().templates.len());
    }

    #[test]
    fn test_monster_overrides_from_ron() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("monsters.ron"),
            "(templates: [(kind: wolf, health: 55, damage: 7, speed: 3.0, xp_reward: 20)])",
        )
        .unwrap();
        let data = DataManager::load_from(dir.path());
        assert_eq!(data.monsters.templates.len(), 1);
        assert_eq!(data.monsters.templates[0].health, 55);
    }
}
