//! Procedural quests from templates

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use super::objectives::Objective;
use super::quest::{Quest, QuestDifficulty, QuestType};
use super::rewards::Reward;
use crate::items::ItemGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Goal {
    Kill,
    Collect,
    Explore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payout {
    Gold,
    Experience,
    Item,
}

struct ObjectiveTemplate {
    goal: Goal,
    target: &'static str,
    /// Exactly one, instead of a rolled count
    unique: bool,
}

struct QuestTemplate {
    title: &'static str,
    description: &'static str,
    objectives: &'static [ObjectiveTemplate],
    rewards: &'static [Payout],
    difficulty: QuestDifficulty,
}

const fn obj(goal: Goal, target: &'static str, unique: bool) -> ObjectiveTemplate {
    ObjectiveTemplate { goal, target, unique }
}

const DRAGON_CHAIN: &[QuestTemplate] = &[
    QuestTemplate {
        title: "Dragon Signs",
        description: "Reports of a {adjective} dragon have been coming in. Scout the {location} for signs of its presence.",
        objectives: &[obj(Goal::Explore, "{location}", true), obj(Goal::Collect, "dragon scale", true)],
        rewards: &[Payout::Gold, Payout::Experience],
        difficulty: QuestDifficulty::Easy,
    },
    QuestTemplate {
        title: "The Dragon's Prey",
        description: "The {adjective} dragon has been hunting in the area. Clear out its minions to draw it out.",
        objectives: &[obj(Goal::Kill, "dark wizards", false), obj(Goal::Collect, "dragon totem", true)],
        rewards: &[Payout::Gold, Payout::Experience, Payout::Item],
        difficulty: QuestDifficulty::Medium,
    },
    QuestTemplate {
        title: "The {adjective} Dragon",
        description: "The time has come to face the {adjective} dragon. Defeat it and claim its power.",
        objectives: &[obj(Goal::Kill, "dragon", true), obj(Goal::Collect, "dragon heart", true)],
        rewards: &[Payout::Gold, Payout::Experience, Payout::Item],
        difficulty: QuestDifficulty::Epic,
    },
];

const MAIN_CHAINS: &[&[QuestTemplate]] = &[DRAGON_CHAIN];

const SIDE_TEMPLATES: &[QuestTemplate] = &[
    QuestTemplate {
        title: "Hunting {creatures}",
        description: "Local hunters need help controlling the {creatures} population and gathering resources.",
        objectives: &[obj(Goal::Kill, "{creatures}", false), obj(Goal::Collect, "{creatures} hide", false)],
        rewards: &[Payout::Gold, Payout::Experience],
        difficulty: QuestDifficulty::Easy,
    },
    QuestTemplate {
        title: "Gathering {resources}",
        description: "The town needs {resources} for its supplies. Clear the area of threats first.",
        objectives: &[obj(Goal::Kill, "hostile creatures", false), obj(Goal::Collect, "{resources}", false)],
        rewards: &[Payout::Gold],
        difficulty: QuestDifficulty::Easy,
    },
    QuestTemplate {
        title: "Explore the {location}",
        description: "Map out the dangerous {location} and document the threats within.",
        objectives: &[obj(Goal::Explore, "{location}", true), obj(Goal::Kill, "dangerous beasts", false)],
        rewards: &[Payout::Experience],
        difficulty: QuestDifficulty::Medium,
    },
];

const DAILY_TEMPLATES: &[QuestTemplate] = &[
    QuestTemplate {
        title: "Daily {activity}",
        description: "Complete today's {activity} for rewards.",
        objectives: &[obj(Goal::Kill, "{creatures}", false)],
        rewards: &[Payout::Gold],
        difficulty: QuestDifficulty::Trivial,
    },
    QuestTemplate {
        title: "Resource Run",
        description: "Gather daily resources from the {location}.",
        objectives: &[obj(Goal::Collect, "{resources}", false)],
        rewards: &[Payout::Gold, Payout::Item],
        difficulty: QuestDifficulty::Trivial,
    },
];

const WORDS: &[(&str, &[&str])] = &[
    ("adjective", &["fearsome", "ancient", "cursed", "mysterious", "dark", "corrupted", "legendary"]),
    ("location", &["dungeon", "cave", "ruins", "temple", "fortress", "catacombs", "forest"]),
    ("creatures", &["wolves", "zombies", "goblins", "skeletons", "spiders", "slimes"]),
    ("resources", &["herbs", "ores", "crystals", "wood", "leather", "cloth"]),
    ("activity", &["monster hunt", "resource gathering", "exploration", "training"]),
];

/// Words picked so far; a placeholder keeps its word once chosen
#[derive(Debug, Default)]
struct WordChoices(BTreeMap<&'static str, &'static str>);

impl WordChoices {
    fn fill(&mut self, text: &str, rng: &mut impl Rng) -> String {
        let mut out = text.to_string();
        for &(key, words) in WORDS {
            let placeholder = format!("{{{}}}", key);
            if !out.contains(&placeholder) {
                continue;
            }
            let word = *self.0.entry(key).or_insert_with(|| words.choose(rng).copied().unwrap_or(key));
            out = out.replace(&placeholder, word);
        }
        out
    }
}

fn reward_multiplier(quest_type: QuestType) -> u32 {
    match quest_type {
        QuestType::Main => 3,
        QuestType::Side => 2,
        _ => 1,
    }
}

/// Builds quests from the built-in templates
#[derive(Debug, Default)]
pub struct QuestGenerator {
    serial: u32,
}

impl QuestGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A linked run of quests: each requires the previous one and points at the next
    pub fn generate_chain(
        &mut self,
        chain_id: &str,
        quest_type: QuestType,
        items: &mut ItemGenerator,
        rng: &mut impl Rng,
    ) -> Vec<Quest> {
        let Some(chain) = MAIN_CHAINS.choose(rng) else {
            return Vec::new();
        };
        let mut words = WordChoices::default();
        let mut quests: Vec<Quest> = Vec::with_capacity(chain.len());

        for (i, template) in chain.iter().enumerate() {
            let id = format!("quest_{}_{}_{}", quest_type.name().to_lowercase(), chain_id, i + 1);
            let mut quest = self.build(id, template, quest_type, &mut words, items, rng);
            quest.chain_id = Some(chain_id.to_string());
            quest.chain_position = Some(i as u32 + 1);
            if let Some(prev) = quests.last_mut() {
                quest.prerequisites.push(prev.id.clone());
                prev.next_quest_id = Some(quest.id.clone());
            }
            quests.push(quest);
        }
        log::debug!("Generated quest chain '{}' with {} quests", chain_id, quests.len());
        quests
    }

    /// One quest of the given type. Main quests open a fresh chain half the time.
    pub fn generate(&mut self, quest_type: QuestType, items: &mut ItemGenerator, rng: &mut impl Rng) -> Quest {
        if quest_type == QuestType::Main && rng.gen_bool(0.5) {
            let chain_id = format!("chain_{}", rng.gen_range(1000..=9999));
            if let Some(first) = self.generate_chain(&chain_id, quest_type, items, rng).into_iter().next() {
                return first;
            }
        }

        let templates = match quest_type {
            QuestType::Daily => DAILY_TEMPLATES,
            _ => SIDE_TEMPLATES,
        };
        let template = &templates[rng.gen_range(0..templates.len())];
        self.serial += 1;
        let id = format!("quest_{}_{}_{}", quest_type.name().to_lowercase(), rng.gen_range(1000..=9999), self.serial);
        self.build(id, template, quest_type, &mut WordChoices::default(), items, rng)
    }

    fn build(
        &mut self,
        id: String,
        template: &QuestTemplate,
        quest_type: QuestType,
        words: &mut WordChoices,
        items: &mut ItemGenerator,
        rng: &mut impl Rng,
    ) -> Quest {
        let title = words.fill(template.title, rng);
        let description = words.fill(template.description, rng);
        let mut quest = Quest::new(id, title, description, quest_type);
        quest.difficulty = template.difficulty;

        for objective in template.objectives {
            let target = words.fill(objective.target, rng);
            quest.objectives.push(match objective.goal {
                Goal::Kill => Objective::kill(target, if objective.unique { 1 } else { rng.gen_range(3..=10) }),
                Goal::Collect => Objective::collect(target, if objective.unique { 1 } else { rng.gen_range(5..=15) }),
                Goal::Explore => {
                    let count = if objective.unique { 1 } else { rng.gen_range(3..=6) };
                    let mut explore = Objective::explore(target.replace(' ', "_"), target.clone());
                    explore.required = count;
                    explore.description = match count {
                        1 => format!("Explore the {}", target),
                        n => format!("Explore {} areas in the {}", n, target),
                    };
                    explore
                }
            });
        }

        let multiplier = reward_multiplier(quest_type);
        for payout in template.rewards {
            quest.rewards.push(match payout {
                Payout::Gold => Reward::gold(rng.gen_range(50..=200) * multiplier),
                Payout::Experience => Reward::experience(rng.gen_range(100..=400) * multiplier),
                Payout::Item => Reward::item(items.generate(None, None, rng)),
            });
        }
        quest
    }
}
