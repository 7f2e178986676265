//! Game save/load system
//!
//! Saves are JSON files, one per slot. The map is not stored: it is
//! regenerated from the saved seed, and the player, items and quest log
//! are put back on top of it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ecs::{EquipmentComponent, Experience, GroundItem, Health, InventoryComponent, Position};
use crate::game::Game;
use crate::items::{EquipSlot, Item};
use crate::quests::{Quest, QuestId, QuestStatus};

/// Save file version for compatibility checking
pub const SAVE_VERSION: u32 = 1;
/// Number of save slots
pub const SAVE_SLOTS: u8 = 3;

/// Save error types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SaveError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Invalid save data: {0}")]
    InvalidData(String),
}

/// Complete save data structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub player: PlayerSave,
    pub quests: QuestLogSave,
    /// The map is rebuilt from this
    pub map_seed: u64,
    #[serde(default)]
    pub items_on_ground: Vec<ItemOnGround>,
}

/// Player-specific save data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSave {
    pub position: (i32, i32),
    /// (current, max)
    pub health: (i32, i32),
    pub experience: Experience,
    pub gold: u32,
    /// Every slot, empty ones included, so positions survive a reload
    pub inventory: Vec<Option<Item>>,
    pub equipment: EquipmentSave,
}

/// Equipment save data (items in each slot)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentSave {
    pub head: Option<Item>,
    pub chest: Option<Item>,
    pub legs: Option<Item>,
    pub feet: Option<Item>,
    pub hands: Option<Item>,
    pub weapon: Option<Item>,
}

impl EquipmentSave {
    fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<Item> {
        match slot {
            EquipSlot::Head => &mut self.head,
            EquipSlot::Chest => &mut self.chest,
            EquipSlot::Legs => &mut self.legs,
            EquipSlot::Feet => &mut self.feet,
            EquipSlot::Hands => &mut self.hands,
            EquipSlot::Weapon => &mut self.weapon,
        }
    }

    /// Worn items, to be routed back through the equip logic
    pub fn into_items(self) -> impl Iterator<Item = Item> {
        [self.head, self.chest, self.legs, self.feet, self.hands, self.weapon]
            .into_iter()
            .flatten()
    }
}

/// Progress of one quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestProgress {
    pub id: QuestId,
    pub status: QuestStatus,
    pub objective_progress: Vec<u32>,
    #[serde(default)]
    pub elapsed: f32,
}

/// Quest log and story state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestLogSave {
    pub quests: Vec<QuestProgress>,
    pub story_flags: BTreeMap<String, String>,
    pub active_main_quest: Option<QuestId>,
    #[serde(default)]
    pub clues: Vec<String>,
    /// Generated quests are not in the content files, so they are kept whole
    #[serde(default)]
    pub generated: Vec<Quest>,
    #[serde(default)]
    pub discovered_locations: Vec<String>,
}

/// Item on the ground
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOnGround {
    pub position: (i32, i32),
    pub item: Item,
}

/// Brief summary of a save for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSummary {
    pub level: u32,
    pub main_quest: Option<String>,
    pub seed: u64,
}

impl SaveData {
    /// Extract save data from the current game state
    pub fn capture(game: &Game) -> Result<Self, SaveError> {
        let player = game.player().ok_or(SaveError::InvalidData("No player entity".to_string()))?;
        let world = game.world();

        let pos = world
            .get::<&Position>(player)
            .map_err(|_| SaveError::InvalidData("Missing player position".to_string()))?;
        let health = world
            .get::<&Health>(player)
            .map_err(|_| SaveError::InvalidData("Missing player health".to_string()))?;
        let experience = world
            .get::<&Experience>(player)
            .map_err(|_| SaveError::InvalidData("Missing player experience".to_string()))?;

        let inv_comp = world.get::<&InventoryComponent>(player);
        let gold = inv_comp.as_ref().map(|inv| inv.inventory.gold()).unwrap_or(0);
        let inventory = inv_comp.map(|inv| inv.inventory.slots_owned()).unwrap_or_default();

        let mut equipment = EquipmentSave::default();
        if let Ok(eq) = world.get::<&EquipmentComponent>(player) {
            for (slot, item) in eq.equipment.iter() {
                *equipment.slot_mut(slot) = item.cloned();
            }
        }

        let player_save = PlayerSave {
            position: (pos.x, pos.y),
            health: (health.current, health.max),
            experience: *experience,
            gold,
            inventory,
            equipment,
        };

        let manager = game.quests();
        let quests = manager
            .all_quests()
            .filter(|q| q.status != QuestStatus::NotStarted)
            .map(|q| QuestProgress {
                id: q.id.clone(),
                status: q.status,
                objective_progress: q.objectives.iter().map(|o| o.current).collect(),
                elapsed: q.elapsed,
            })
            .collect();
        let story = game.story().snapshot();
        let quest_log = QuestLogSave {
            quests,
            story_flags: story.story_flags,
            active_main_quest: story.active_quest_id,
            clues: game.clues().to_vec(),
            generated: game.generated_quests().cloned().collect(),
            discovered_locations: game.locations().discovered_ids(),
        };

        let items_on_ground = world
            .query::<(&Position, &GroundItem)>()
            .iter()
            .map(|(_, (p, ground))| ItemOnGround { position: (p.x, p.y), item: ground.item.clone() })
            .collect();

        Ok(SaveData {
            version: SAVE_VERSION,
            player: player_save,
            quests: quest_log,
            map_seed: game.seed(),
            items_on_ground,
        })
    }

    pub fn summary(&self) -> SaveSummary {
        SaveSummary {
            level: self.player.experience.level,
            main_quest: self.quests.active_main_quest.clone(),
            seed: self.map_seed,
        }
    }
}

/// Slot files in one directory
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `saves/` under the platform data directory
    pub fn default_location() -> Self {
        use directories::ProjectDirs;

        if let Some(proj_dirs) = ProjectDirs::from("com", "tilequest", "Tilequest") {
            let mut path = proj_dirs.data_local_dir().to_path_buf();
            path.push("saves");
            Self::new(path)
        } else {
            // Fallback to current directory
            Self::new("./saves")
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path for a specific save slot
    pub fn path(&self, slot: u8) -> Result<PathBuf, SaveError> {
        if slot >= SAVE_SLOTS {
            return Err(SaveError::InvalidData(format!("No save slot {}", slot)));
        }
        Ok(self.dir.join(format!("save_{}.json", slot)))
    }

    /// Check if a save exists in the given slot
    pub fn exists(&self, slot: u8) -> bool {
        self.path(slot).map_or(false, |p| p.exists())
    }

    /// Write save data to a slot
    pub fn save(&self, slot: u8, data: &SaveData) -> Result<(), SaveError> {
        let path = self.path(slot)?;
        fs::create_dir_all(&self.dir).map_err(|e| SaveError::IoError(e.to_string()))?;

        let json = serde_json::to_string_pretty(data).map_err(|e| SaveError::ParseError(e.to_string()))?;
        fs::write(&path, json).map_err(|e| SaveError::IoError(e.to_string()))?;

        log::info!("Game saved to slot {}", slot);
        Ok(())
    }

    /// Capture and save the game
    pub fn save_game(&self, game: &Game, slot: u8) -> Result<(), SaveError> {
        self.save(slot, &SaveData::capture(game)?)
    }

    /// Read a slot, rejecting other save versions
    pub fn load(&self, slot: u8) -> Result<SaveData, SaveError> {
        let path = self.path(slot)?;
        let data = fs::read_to_string(&path).map_err(|e| SaveError::IoError(e.to_string()))?;
        let save: SaveData = serde_json::from_str(&data).map_err(|e| SaveError::ParseError(e.to_string()))?;

        // Version check
        if save.version != SAVE_VERSION {
            return Err(SaveError::VersionMismatch { expected: SAVE_VERSION, found: save.version });
        }

        log::info!("Game loaded from slot {}", slot);
        Ok(save)
    }

    /// Delete a save slot
    pub fn delete(&self, slot: u8) -> Result<(), SaveError> {
        let path = self.path(slot)?;
        if path.exists() {
            fs::remove_file(&path).map_err(|e| SaveError::IoError(e.to_string()))?;
            log::info!("Deleted save slot {}", slot);
        }
        Ok(())
    }

    /// Every slot with its summary, if it holds a readable save
    pub fn list(&self) -> Vec<(u8, Option<SaveSummary>)> {
        (0..SAVE_SLOTS)
            .map(|slot| {
                let summary = if self.exists(slot) {
                    match self.load(slot) {
                        Ok(save) => Some(save.summary()),
                        Err(e) => {
                            log::warn!("Save slot {} unreadable: {}", slot, e);
                            None
                        }
                    }
                } else {
                    None
                };
                (slot, summary)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataManager;
    use crate::game::{GameSettings, GameState};
    use crate::items::{ItemKind, Material, Quality, WeaponType};
    use crate::quests::QuestType;

    fn small_game() -> Game {
        let settings = GameSettings { map_width: 40, map_height: 40, initial_monsters: 0, ..GameSettings::default() };
        let mut game = Game::new(settings, DataManager::default());
        game.start_new_game(7);
        game
    }

    fn fresh() -> Game {
        let settings = GameSettings { map_width: 40, map_height: 40, initial_monsters: 0, ..GameSettings::default() };
        Game::new(settings, DataManager::default())
    }

    #[test]
    fn test_slots_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());
        assert!(store.path(2).is_ok());
        assert!(matches!(store.path(3), Err(SaveError::InvalidData(_))));
        assert!(!store.exists(5));
    }

    #[test]
    fn test_list_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path().join("saves"));
        let game = small_game();
        store.save_game(&game, 1).unwrap();

        let slots = store.list();
        assert_eq!(slots.len(), 3);
        assert!(slots[0].1.is_none());
        let summary = slots[1].1.clone().unwrap();
        assert_eq!(summary.level, 1);
        assert_eq!(summary.seed, 7);
        assert_eq!(summary.main_quest.as_deref(), Some("mq_01_mysterious_arrival"));

        store.delete(1).unwrap();
        assert!(!store.exists(1));
        // Deleting an empty slot is fine
        store.delete(1).unwrap();
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());
        let mut data = SaveData::capture(&small_game()).unwrap();
        data.version = SAVE_VERSION + 1;
        store.save(0, &data).unwrap();
        assert_eq!(
            store.load(0).unwrap_err(),
            SaveError::VersionMismatch { expected: SAVE_VERSION, found: SAVE_VERSION + 1 }
        );
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());
        fs::write(store.path(0).unwrap(), "{ not json").unwrap();
        assert!(matches!(store.load(0), Err(SaveError::ParseError(_))));
        assert!(store.list()[0].1.is_none());
    }

    #[test]
    fn test_reload_keeps_slots_gear_and_quests() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());
        let mut game = small_game();
        let player = game.player().unwrap();

        // Move the second potion to the far end of the bag and add an axe
        let axe = game.items.create(
            ItemKind::Weapon { weapon_type: WeaponType::Axe, attack_power: 9 },
            Quality::Masterwork,
            Some(Material::Silver),
        );
        {
            let mut inv = game.world_mut().get::<&mut InventoryComponent>(player).unwrap();
            inv.inventory.swap(1, 39).unwrap();
            inv.inventory.set_slot(7, Some(axe)).unwrap();
            inv.inventory.add_gold(33);
        }
        game.world_mut().get::<&mut Health>(player).unwrap().current = 42;
        game.grant_experience(120);
        game.story.set_flag("investigation_started", "yes");
        game.clues.push("A clue".to_string());
        let generated = game.generate_quest(QuestType::Side);
        game.start_quest(&generated[0]).unwrap();
        let attack = game.player_attack();
        store.save_game(&game, 0).unwrap();

        let mut loaded = fresh();
        loaded.restore_from_save(store.load(0).unwrap()).unwrap();
        assert_eq!(loaded.state(), &GameState::Playing);

        let inv = loaded.inventory().unwrap();
        assert!(inv.get(0).is_some());
        assert!(inv.get(1).is_none());
        assert!(inv.get(39).is_some());
        assert_eq!(inv.get(7).unwrap().display_name(), "Masterwork Silver Axe");
        assert_eq!(inv.gold(), 33);

        assert_eq!(loaded.player_attack(), attack);
        assert_eq!(loaded.player_health().unwrap().current, 42 + 10);
        assert_eq!(loaded.player_level(), 2);
        assert_eq!(loaded.story().get_flag("investigation_started"), Some("yes"));
        assert_eq!(loaded.clues(), ["A clue".to_string()]);
        assert_eq!(loaded.quests().get_quest(&generated[0]).unwrap().status, QuestStatus::InProgress);
        assert_eq!(loaded.story().active_quest_id(), Some("mq_01_mysterious_arrival"));
        assert_eq!(loaded.player_position(), game.player_position());

        // New items never reuse saved ids
        let max_saved = inv.items().map(|(_, i)| i.id).max().unwrap();
        assert!(loaded.next_item_id() > max_saved);
    }

    #[test]
    fn test_unknown_quest_ids_are_skipped() {
        let mut data = SaveData::capture(&small_game()).unwrap();
        data.quests.quests.push(QuestProgress {
            id: "no_such_quest".to_string(),
            status: QuestStatus::InProgress,
            objective_progress: vec![1],
            elapsed: 0.0,
        });
        let mut loaded = fresh();
        loaded.restore_from_save(data).unwrap();
        assert!(loaded.quests().get_quest("no_such_quest").is_none());
        assert!(loaded.quests().get_quest("mq_01_mysterious_arrival").is_some());
    }
}
