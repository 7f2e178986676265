//! Quest model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::objectives::{Objective, QuestEvent};
use super::rewards::{Reward, RewardTarget};

pub type QuestId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
    TurnedIn,
}

impl QuestStatus {
    pub fn name(&self) -> &'static str {
        match self {
            QuestStatus::NotStarted => "Not started",
            QuestStatus::InProgress => "In progress",
            QuestStatus::Completed => "Completed",
            QuestStatus::Failed => "Failed",
            QuestStatus::TurnedIn => "Turned in",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestType {
    Main,
    #[default]
    Side,
    Daily,
    World,
    Hidden,
}

impl QuestType {
    pub const ALL: [QuestType; 5] =
        [QuestType::Main, QuestType::Side, QuestType::Daily, QuestType::World, QuestType::Hidden];

    pub fn name(&self) -> &'static str {
        match self {
            QuestType::Main => "Main",
            QuestType::Side => "Side",
            QuestType::Daily => "Daily",
            QuestType::World => "World",
            QuestType::Hidden => "Hidden",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestDifficulty {
    Trivial,
    #[default]
    Easy,
    Medium,
    Hard,
    Epic,
}

impl QuestDifficulty {
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            QuestDifficulty::Trivial => (128, 128, 128),
            QuestDifficulty::Easy => (255, 255, 255),
            QuestDifficulty::Medium => (0, 255, 0),
            QuestDifficulty::Hard => (80, 120, 255),
            QuestDifficulty::Epic => (255, 128, 0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QuestDifficulty::Trivial => "Trivial",
            QuestDifficulty::Easy => "Easy",
            QuestDifficulty::Medium => "Medium",
            QuestDifficulty::Hard => "Hard",
            QuestDifficulty::Epic => "Epic",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum QuestError {
    #[error("no quest with id '{0}'")]
    UnknownQuest(QuestId),
    #[error("quest '{0}' already exists")]
    Duplicate(QuestId),
    #[error("quest '{0}' is not available to start")]
    NotStartable(QuestId),
    #[error("requires level {need} (you are level {have})")]
    LevelTooLow { need: u32, have: u32 },
    #[error("quest '{quest}' needs '{prerequisite}' turned in first")]
    PrerequisiteUnmet { quest: QuestId, prerequisite: QuestId },
    #[error("quest '{0}' is locked by the story so far")]
    FlagsUnmet(QuestId),
    #[error("quest '{0}' is not ready to turn in")]
    NotCompleted(QuestId),
    #[error("not every reward for '{0}' could be granted")]
    RewardsNotGranted(QuestId),
    #[error("story flag '{0}' is not of the form key=value")]
    MalformedFlag(String),
}

/// What availability checks need to know about the player
#[derive(Debug, Clone, Copy)]
pub struct QuestContext<'a> {
    pub player_level: u32,
    pub story_flags: &'a BTreeMap<String, String>,
}

impl<'a> QuestContext<'a> {
    pub fn new(player_level: u32, story_flags: &'a BTreeMap<String, String>) -> Self {
        Self { player_level, story_flags }
    }
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub quest_type: QuestType,
    #[serde(default = "one")]
    pub level_requirement: u32,
    #[serde(default)]
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
    #[serde(default)]
    pub prerequisites: Vec<QuestId>,
    /// Story flags (key -> value) that must be set before the quest opens
    #[serde(default)]
    pub required_flags: BTreeMap<String, String>,
    #[serde(default = "not_started")]
    pub status: QuestStatus,
    #[serde(default)]
    pub difficulty: QuestDifficulty,
    #[serde(default)]
    pub giver_id: Option<String>,
    #[serde(default)]
    pub turn_in_id: Option<String>,
    /// Seconds allowed once started
    #[serde(default)]
    pub time_limit: Option<f32>,
    #[serde(default)]
    pub elapsed: f32,
    #[serde(default)]
    pub chain_id: Option<String>,
    /// 1-based
    #[serde(default)]
    pub chain_position: Option<u32>,
    #[serde(default)]
    pub next_quest_id: Option<QuestId>,
    /// Started automatically once its requirements hold
    #[serde(default)]
    pub auto_start: bool,
}

fn not_started() -> QuestStatus {
    QuestStatus::NotStarted
}

impl Quest {
    pub fn new(id: impl Into<QuestId>, title: impl Into<String>, description: impl Into<String>, quest_type: QuestType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            quest_type,
            level_requirement: 1,
            objectives: Vec::new(),
            rewards: Vec::new(),
            prerequisites: Vec::new(),
            required_flags: BTreeMap::new(),
            status: QuestStatus::NotStarted,
            difficulty: QuestDifficulty::default(),
            giver_id: None,
            turn_in_id: None,
            time_limit: None,
            elapsed: 0.0,
            chain_id: None,
            chain_position: None,
            next_quest_id: None,
            auto_start: false,
        }
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_reward(mut self, reward: Reward) -> Self {
        self.rewards.push(reward);
        self
    }

    pub fn with_prerequisite(mut self, quest_id: impl Into<QuestId>) -> Self {
        self.prerequisites.push(quest_id.into());
        self
    }

    /// Explain why the quest cannot start, if it cannot
    pub fn check_available(
        &self,
        ctx: &QuestContext,
        is_turned_in: impl Fn(&str) -> bool,
    ) -> Result<(), QuestError> {
        if self.status != QuestStatus::NotStarted {
            return Err(QuestError::NotStartable(self.id.clone()));
        }
        if ctx.player_level < self.level_requirement {
            return Err(QuestError::LevelTooLow { need: self.level_requirement, have: ctx.player_level });
        }
        if let Some(prerequisite) = self.prerequisites.iter().find(|id| !is_turned_in(id)) {
            return Err(QuestError::PrerequisiteUnmet { quest: self.id.clone(), prerequisite: prerequisite.clone() });
        }
        let flags_hold = self
            .required_flags
            .iter()
            .all(|(key, value)| ctx.story_flags.get(key) == Some(value));
        if !flags_hold {
            return Err(QuestError::FlagsUnmet(self.id.clone()));
        }
        Ok(())
    }

    pub fn is_available(&self, ctx: &QuestContext, is_turned_in: impl Fn(&str) -> bool) -> bool {
        self.check_available(ctx, is_turned_in).is_ok()
    }

    pub fn start(&mut self) -> bool {
        if self.status == QuestStatus::NotStarted {
            self.status = QuestStatus::InProgress;
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    /// Move to `Completed` once every objective is done
    pub fn check_completion(&mut self) -> bool {
        if self.status != QuestStatus::InProgress {
            return false;
        }
        if self.objectives.iter().all(|o| o.completed) {
            self.status = QuestStatus::Completed;
            return true;
        }
        false
    }

    /// Feed an event to every objective. Returns true if any progressed.
    pub fn update_objectives(&mut self, event: &QuestEvent) -> bool {
        if self.status != QuestStatus::InProgress {
            return false;
        }
        let mut progressed = false;
        for objective in &mut self.objectives {
            if objective.check_progress(event) {
                progressed = true;
            }
        }
        if progressed {
            self.check_completion();
        }
        progressed
    }

    /// Grant every reward. Nothing is granted unless the target has room
    /// for every reward item.
    pub fn turn_in(&mut self, target: &mut dyn RewardTarget) -> Result<(), QuestError> {
        if self.status != QuestStatus::Completed {
            return Err(QuestError::NotCompleted(self.id.clone()));
        }
        let needed: usize = self.rewards.iter().map(Reward::item_slots).sum();
        if target.free_slots() < needed {
            return Err(QuestError::RewardsNotGranted(self.id.clone()));
        }
        let mut all_granted = true;
        for reward in &self.rewards {
            if !reward.grant(target) {
                all_granted = false;
            }
        }
        if !all_granted {
            return Err(QuestError::RewardsNotGranted(self.id.clone()));
        }
        self.status = QuestStatus::TurnedIn;
        Ok(())
    }

    pub fn fail(&mut self) -> bool {
        if self.status == QuestStatus::InProgress {
            self.status = QuestStatus::Failed;
            true
        } else {
            false
        }
    }

    /// Advance the clock on a timed quest; fails it when time runs out
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(limit) = self.time_limit else {
            return false;
        };
        if self.status != QuestStatus::InProgress {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed >= limit {
            return self.fail();
        }
        false
    }

    pub fn time_remaining(&self) -> Option<f32> {
        self.time_limit.map(|limit| (limit - self.elapsed).max(0.0))
    }

    /// Overall progress in percent
    pub fn completion_percentage(&self) -> f32 {
        let required: u32 = self.objectives.iter().map(|o| o.required).sum();
        if required == 0 {
            return 0.0;
        }
        let current: u32 = self.objectives.iter().map(|o| o.current).sum();
        current as f32 / required as f32 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quests::rewards::tests::Purse;

    fn wolf_hunt() -> Quest {
        Quest::new("wolf_hunt", "Wolf Hunt", "Thin the pack", QuestType::Side)
            .with_objective(Objective::kill("wolf", 2))
            .with_reward(Reward::gold(40))
    }

    #[test]
    fn test_lifecycle() {
        let mut quest = wolf_hunt();
        assert!(!quest.update_objectives(&QuestEvent::kill("wolf")));
        assert!(quest.start());
        assert!(!quest.start());

        assert!(quest.update_objectives(&QuestEvent::kill("wolf")));
        assert_eq!(quest.status, QuestStatus::InProgress);
        assert_eq!(quest.completion_percentage(), 50.0);
        quest.update_objectives(&QuestEvent::kill("wolf"));
        assert_eq!(quest.status, QuestStatus::Completed);

        let mut purse = Purse::default();
        quest.turn_in(&mut purse).unwrap();
        assert_eq!(quest.status, QuestStatus::TurnedIn);
        assert_eq!(purse.gold, 40);
    }

    #[test]
    fn test_turn_in_only_from_completed() {
        let mut quest = wolf_hunt();
        quest.start();
        let mut purse = Purse::default();
        assert_eq!(quest.turn_in(&mut purse), Err(QuestError::NotCompleted("wolf_hunt".into())));
        assert_eq!(purse.gold, 0);
    }

    #[test]
    fn test_full_bag_blocks_every_reward() {
        let item = crate::items::Item::new(1, crate::items::ItemKind::Quest { tag: "pelt".into() }, crate::items::Quality::Standard);
        let mut quest = wolf_hunt().with_reward(Reward::item(item));
        quest.start();
        quest.update_objectives(&QuestEvent::Kill { enemy_type: "wolf".into(), enemy_id: None });
        quest.update_objectives(&QuestEvent::kill("wolf"));

        let mut full = Purse::default();
        for _ in 0..3 {
            assert_eq!(quest.turn_in(&mut full), Err(QuestError::RewardsNotGranted("wolf_hunt".into())));
        }
        assert_eq!(quest.status, QuestStatus::Completed);
        assert_eq!(full.gold, 0);

        let mut roomy = Purse { room: 1, ..Default::default() };
        quest.turn_in(&mut roomy).unwrap();
        assert_eq!(quest.status, QuestStatus::TurnedIn);
        assert_eq!((roomy.gold, roomy.items.len()), (40, 1));
    }

    #[test]
    fn test_availability_rules() {
        let mut flags = BTreeMap::new();
        let mut quest = wolf_hunt().with_prerequisite("intro");
        quest.level_requirement = 2;
        quest.required_flags.insert("trusted_suspect".into(), "lysa".into());

        let ctx = QuestContext::new(1, &flags);
        assert_eq!(
            quest.check_available(&ctx, |_| true),
            Err(QuestError::LevelTooLow { need: 2, have: 1 })
        );
        let ctx = QuestContext::new(2, &flags);
        assert!(matches!(quest.check_available(&ctx, |_| false), Err(QuestError::PrerequisiteUnmet { .. })));
        assert_eq!(quest.check_available(&ctx, |_| true), Err(QuestError::FlagsUnmet("wolf_hunt".into())));

        flags.insert("trusted_suspect".into(), "lysa".into());
        let ctx = QuestContext::new(2, &flags);
        assert!(quest.is_available(&ctx, |id| id == "intro"));
    }

    #[test]
    fn test_time_limit_fails_quest() {
        let mut quest = wolf_hunt();
        quest.time_limit = Some(10.0);
        quest.start();
        assert!(!quest.tick(6.0));
        assert_eq!(quest.time_remaining(), Some(4.0));
        assert!(quest.tick(6.0));
        assert_eq!(quest.status, QuestStatus::Failed);
    }
}
