//! Quest content files
//!
//! A quest file is JSON of the form
//! `{ "quests": [...], "quest_chains": { "<id>": { "name", "description", "quests": [...] } } }`.
//! Enum fields use upper-case names (`"MAIN"`, `"EASY"`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use super::manager::{QuestChain, QuestManager};
use super::objectives::Objective;
use super::quest::{Quest, QuestDifficulty, QuestId, QuestType};
use super::rewards::{Reward, RewardKind};
use crate::data::LoadError;
use crate::ecs::Position;
use crate::items::{ItemClass, ItemGenerator, ItemKind, Quality};
use crate::world::{LocationRegistry, QuestLocation};

fn one() -> u32 {
    1
}

fn default_radius() -> i32 {
    3
}

#[derive(Debug, Deserialize)]
struct QuestFile {
    #[serde(default)]
    quests: Vec<serde_json::Value>,
    #[serde(default)]
    quest_chains: BTreeMap<String, QuestChain>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RewardDef {
    Gold {
        #[serde(default)]
        description: String,
        amount: u32,
    },
    Experience {
        #[serde(default)]
        description: String,
        amount: u32,
    },
    Item {
        #[serde(default)]
        description: String,
        #[serde(default)]
        item_class: Option<ItemClass>,
        #[serde(default)]
        quality: Option<Quality>,
        /// Plain quest item carrying this tag instead of a generated one
        #[serde(default)]
        quest_item: Option<String>,
        #[serde(default = "one")]
        amount: u32,
    },
    Multi {
        #[serde(default)]
        description: String,
        rewards: Vec<RewardDef>,
    },
}

#[derive(Debug, Deserialize)]
struct LocationDef {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: String,
    coords: Option<(i32, i32)>,
    #[serde(default = "default_radius")]
    radius: i32,
}

#[derive(Debug, Deserialize)]
struct QuestDef {
    id: QuestId,
    title: String,
    description: String,
    #[serde(default)]
    quest_type: QuestType,
    #[serde(default = "one")]
    level_requirement: u32,
    #[serde(default)]
    difficulty: QuestDifficulty,
    #[serde(default)]
    objectives: Vec<Objective>,
    #[serde(default)]
    rewards: Vec<RewardDef>,
    #[serde(default)]
    prerequisites: Vec<QuestId>,
    #[serde(default)]
    required_flags: BTreeMap<String, String>,
    #[serde(default)]
    giver_id: Option<String>,
    #[serde(default)]
    turn_in_id: Option<String>,
    #[serde(default)]
    time_limit: Option<f32>,
    #[serde(default)]
    auto_start: bool,
    #[serde(default)]
    location: Option<LocationDef>,
}

/// Everything read from one or more quest files
#[derive(Debug, Clone, Default)]
pub struct LoadedQuests {
    pub quests: Vec<Quest>,
    pub chains: BTreeMap<String, QuestChain>,
    pub locations: Vec<QuestLocation>,
}

impl LoadedQuests {
    fn extend(&mut self, other: LoadedQuests) {
        self.quests.extend(other.quests);
        self.chains.extend(other.chains);
        self.locations.extend(other.locations);
    }

    /// Register quests first so chains can link them
    pub fn install(self, manager: &mut QuestManager, locations: &mut LocationRegistry) {
        for quest in self.quests {
            if let Err(err) = manager.add_quest(quest) {
                log::warn!("Skipping quest: {}", err);
            }
        }
        for (id, chain) in self.chains {
            manager.add_quest_chain(id, chain);
        }
        for location in self.locations {
            locations.add(location);
        }
    }
}

/// Builds quests from JSON, rolling any generated reward items
pub struct QuestLoader {
    items: ItemGenerator,
    rng: StdRng,
}

impl QuestLoader {
    pub fn new(seed: u64) -> Self {
        Self { items: ItemGenerator::new(), rng: StdRng::seed_from_u64(seed) }
    }

    /// Parse one file's contents. Bad quest entries are skipped.
    pub fn parse(&mut self, json: &str) -> Result<LoadedQuests, serde_json::Error> {
        let file: QuestFile = serde_json::from_str(json)?;
        let mut loaded = LoadedQuests { chains: file.quest_chains, ..Default::default() };

        for value in file.quests {
            let id = value.get("id").and_then(|v| v.as_str()).unwrap_or("unknown").to_string();
            match serde_json::from_value::<QuestDef>(value) {
                Ok(def) => {
                    let (quest, location) = self.build(def);
                    loaded.quests.push(quest);
                    loaded.locations.extend(location);
                }
                Err(err) => log::warn!("Skipping malformed quest '{}': {}", id, err),
            }
        }

        // Link chain members found in this file
        for (chain_id, chain) in &loaded.chains {
            for (i, quest_id) in chain.quests.iter().enumerate() {
                if let Some(quest) = loaded.quests.iter_mut().find(|q| &q.id == quest_id) {
                    quest.chain_id = Some(chain_id.clone());
                    quest.chain_position = Some(i as u32 + 1);
                    quest.next_quest_id = chain.quests.get(i + 1).cloned();
                }
            }
        }
        Ok(loaded)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<LoadedQuests, LoadError> {
        let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        let loaded = self.parse(&text).map_err(|e| LoadError::parse(path, e))?;
        log::info!("Loaded {} quests from {}", loaded.quests.len(), path.display());
        Ok(loaded)
    }

    /// Load every `*.json` file in a directory, in name order.
    /// Files that fail to parse are skipped with a warning.
    pub fn load_dir(&mut self, dir: &Path) -> Result<LoadedQuests, LoadError> {
        let mut loaded = LoadedQuests::default();
        for path in json_files(dir)? {
            match self.load_file(&path) {
                Ok(file) => loaded.extend(file),
                Err(err) => log::warn!("{}", err),
            }
        }
        Ok(loaded)
    }

    fn build(&mut self, def: QuestDef) -> (Quest, Option<QuestLocation>) {
        let rewards = def.rewards.into_iter().map(|r| self.build_reward(r)).collect();
        let location = def.location.and_then(|loc| {
            let (x, y) = loc.coords?;
            let name = loc.name.unwrap_or_else(|| loc.id.replace('_', " "));
            Some(QuestLocation::new(loc.id, name, Position::new(x, y), loc.radius, loc.description))
        });

        let mut quest = Quest::new(def.id, def.title, def.description, def.quest_type);
        quest.level_requirement = def.level_requirement;
        quest.difficulty = def.difficulty;
        quest.objectives = def.objectives;
        quest.rewards = rewards;
        quest.prerequisites = def.prerequisites;
        quest.required_flags = def.required_flags;
        quest.giver_id = def.giver_id;
        quest.turn_in_id = def.turn_in_id;
        quest.time_limit = def.time_limit;
        quest.auto_start = def.auto_start;
        (quest, location)
    }

    fn build_reward(&mut self, def: RewardDef) -> Reward {
        match def {
            RewardDef::Gold { description, amount } => described(Reward::gold(amount), description),
            RewardDef::Experience { description, amount } => described(Reward::experience(amount), description),
            RewardDef::Item { description, item_class, quality, quest_item, amount } => {
                let item = match quest_item {
                    Some(tag) => self.items.create(ItemKind::Quest { tag }, quality.unwrap_or(Quality::Standard), None),
                    None => self.items.generate(item_class, quality, &mut self.rng),
                };
                let description = match description.is_empty() {
                    true => format!("Receive {}", item.display_name()),
                    false => description,
                };
                Reward { description, kind: RewardKind::Item { item, amount } }
            }
            RewardDef::Multi { description, rewards } => Reward {
                description,
                kind: RewardKind::Multi(rewards.into_iter().map(|r| self.build_reward(r)).collect()),
            },
        }
    }
}

/// Keep the generated description unless the file gave one
fn described(reward: Reward, description: String) -> Reward {
    if description.is_empty() {
        reward
    } else {
        reward.with_description(description)
    }
}

/// Sorted `*.json` paths in a directory
pub(crate) fn json_files(dir: &Path) -> Result<Vec<std::path::PathBuf>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))?;
    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quests::QuestStatus;

    const SAMPLE: &str = r#"{
        "quests": [
            {
                "id": "mq_01_arrival",
                "title": "A Stranger Arrives",
                "description": "Speak with the elder.",
                "quest_type": "MAIN",
                "difficulty": "TRIVIAL",
                "objectives": [
                    {"type": "dialog", "description": "Talk to the elder", "dialog_id": "elder_intro"}
                ],
                "rewards": [
                    {"type": "gold", "amount": 25},
                    {"type": "item", "quest_item": "elder's token"}
                ],
                "location": {"id": "village_square", "coords": [10, 12], "radius": 4}
            },
            {
                "id": "mq_02_investigation",
                "title": "First Leads",
                "description": "Look around.",
                "quest_type": "MAIN",
                "objectives": [
                    {"type": "explore", "location_id": "old_mill", "area_name": "Old Mill"}
                ]
            },
            { "id": "broken", "title": "Missing description" }
        ],
        "quest_chains": {
            "main_story": {"name": "Shadow of the Artifact", "quests": ["mq_01_arrival", "mq_02_investigation"]}
        }
    }"#;

    #[test]
    fn test_parse_skips_bad_entries_and_links_chain() {
        let mut loader = QuestLoader::new(1);
        let loaded = loader.parse(SAMPLE).unwrap();
        assert_eq!(loaded.quests.len(), 2);

        let first = &loaded.quests[0];
        assert_eq!(first.quest_type, QuestType::Main);
        assert_eq!(first.difficulty, QuestDifficulty::Trivial);
        assert_eq!(first.status, QuestStatus::NotStarted);
        assert_eq!(first.chain_position, Some(1));
        assert_eq!(first.next_quest_id.as_deref(), Some("mq_02_investigation"));
        assert_eq!(first.rewards[0].description, "Receive 25 gold");
        assert_eq!(loaded.quests[1].next_quest_id, None);

        assert_eq!(loaded.locations.len(), 1);
        assert_eq!(loaded.locations[0].area_name, "village square");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let mut loader = QuestLoader::new(1);
        assert!(matches!(loader.load_file(&path), Err(LoadError::ParseError { .. })));
    }

    #[test]
    fn test_load_dir_installs_into_manager() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.json"), SAMPLE).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("zz_bad.json"), "[").unwrap();

        let mut loader = QuestLoader::new(1);
        let loaded = loader.load_dir(dir.path()).unwrap();
        let mut manager = QuestManager::new();
        let mut locations = LocationRegistry::new();
        loaded.install(&mut manager, &mut locations);

        assert_eq!(manager.chain("main_story").unwrap().quests.len(), 2);
        assert!(manager.get_quest("mq_02_investigation").is_some());
        assert!(locations.get("village_square").is_some());
    }
}
