//! Main story chain
//!
//! Tracks story flags set by dialog and keeps the main quest line moving.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::manager::QuestManager;
use super::objectives::QuestEvent;
use super::quest::{Quest, QuestContext, QuestError, QuestId, QuestStatus, QuestType};
use super::rewards::RewardTarget;

/// Chain id of the main quest line
pub const MAIN_STORY_CHAIN: &str = "main_story";

/// Saved story progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorySnapshot {
    pub story_flags: BTreeMap<String, String>,
    pub active_quest_id: Option<QuestId>,
}

#[derive(Debug, Clone, Default)]
pub struct StoryHandler {
    story_flags: BTreeMap<String, String>,
    active_quest_id: Option<QuestId>,
}

impl StoryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self, player_level: u32) -> QuestContext<'_> {
        QuestContext::new(player_level, &self.story_flags)
    }

    pub fn flags(&self) -> &BTreeMap<String, String> {
        &self.story_flags
    }

    pub fn get_flag(&self, key: &str) -> Option<&str> {
        self.story_flags.get(key).map(String::as_str)
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.story_flags.insert(key.into(), value.into());
    }

    pub fn active_quest_id(&self) -> Option<&str> {
        self.active_quest_id.as_deref()
    }

    /// Start the first quest of the main chain
    pub fn start_initial_quest(&mut self, manager: &mut QuestManager, player_level: u32) -> Result<QuestId, QuestError> {
        let first = manager
            .chain(MAIN_STORY_CHAIN)
            .and_then(|chain| chain.quests.first().cloned())
            .ok_or_else(|| QuestError::UnknownQuest(MAIN_STORY_CHAIN.to_string()))?;
        manager.start_quest(&first, &QuestContext::new(player_level, &self.story_flags))?;
        log::info!("Started initial main quest '{}'", first);
        self.active_quest_id = Some(first.clone());
        Ok(first)
    }

    /// Apply a `key=value` flag, then start any auto-start quests it unlocks.
    /// Returns the ids of quests started.
    pub fn handle_flag(
        &mut self,
        flag: &str,
        manager: &mut QuestManager,
        player_level: u32,
    ) -> Result<Vec<QuestId>, QuestError> {
        let Some((key, value)) = flag.split_once('=') else {
            return Err(QuestError::MalformedFlag(flag.to_string()));
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() {
            return Err(QuestError::MalformedFlag(flag.to_string()));
        }
        log::info!("Story flag {}={}", key, value);
        self.set_flag(key, value);
        Ok(self.start_unlocked(manager, player_level))
    }

    /// Start every auto-start quest whose requirements now hold
    pub fn start_unlocked(&mut self, manager: &mut QuestManager, player_level: u32) -> Vec<QuestId> {
        let ctx = QuestContext::new(player_level, &self.story_flags);
        let unlocked: Vec<QuestId> = manager
            .available_quests(&ctx)
            .into_iter()
            .filter(|q| q.auto_start)
            .map(|q| q.id.clone())
            .collect();

        let mut started = Vec::new();
        for id in unlocked {
            match manager.start_quest(&id, &ctx) {
                Ok(()) => started.push(id),
                Err(err) => log::warn!("Could not auto-start quest: {}", err),
            }
        }
        started
    }

    /// Forward a finished conversation to the quest log. Main quests it
    /// completes are turned in and the chain moves to the next quest.
    pub fn on_dialog_finished(
        &mut self,
        dialog_id: &str,
        node_id: &str,
        npc_id: Option<&str>,
        manager: &mut QuestManager,
        target: &mut dyn RewardTarget,
        player_level: u32,
    ) -> Vec<QuestId> {
        let event = QuestEvent::Dialog {
            dialog_id: dialog_id.to_string(),
            node_id: node_id.to_string(),
            npc_id: npc_id.map(str::to_string),
        };
        let updated = manager.process_event(&event);

        for id in &updated {
            let next = match manager.get_quest(id) {
                Some(q) if q.quest_type == QuestType::Main && q.status == QuestStatus::Completed => {
                    q.next_quest_id.clone()
                }
                _ => continue,
            };
            log::info!("Main quest '{}' completed through dialog", id);
            if let Err(err) = manager.complete_quest(id, target) {
                log::warn!("{}", err);
                continue;
            }
            if let Some(next) = next {
                self.advance_to(&next, manager, player_level);
            }
        }
        updated
    }

    /// Start `next` as the current main quest
    pub fn advance_to(&mut self, next: &str, manager: &mut QuestManager, player_level: u32) -> bool {
        let ctx = QuestContext::new(player_level, &self.story_flags);
        match manager.start_quest(next, &ctx) {
            Ok(()) => {
                log::info!("Advanced main story to '{}'", next);
                self.active_quest_id = Some(next.to_string());
                true
            }
            Err(err) => {
                log::warn!("Main story could not advance: {}", err);
                false
            }
        }
    }

    /// The main quest the player is on, if any
    pub fn current_main_quest<'m>(&self, manager: &'m QuestManager) -> Option<&'m Quest> {
        let tracked = self
            .active_quest_id
            .as_deref()
            .and_then(|id| manager.get_quest(id))
            .filter(|q| matches!(q.status, QuestStatus::InProgress | QuestStatus::Completed));
        tracked.or_else(|| manager.active_quests().find(|q| q.quest_type == QuestType::Main))
    }

    pub fn snapshot(&self) -> StorySnapshot {
        StorySnapshot { story_flags: self.story_flags.clone(), active_quest_id: self.active_quest_id.clone() }
    }

    pub fn restore(&mut self, snapshot: StorySnapshot) {
        self.story_flags = snapshot.story_flags;
        self.active_quest_id = snapshot.active_quest_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quests::manager::QuestChain;
    use crate::quests::objectives::{Objective, ObjectiveKind};
    use crate::quests::rewards::tests::Purse;
    use crate::quests::rewards::Reward;

    fn talk(id: &str, dialog: &str) -> Quest {
        Quest::new(id, id, "", QuestType::Main)
            .with_objective(Objective::new(
                "Talk",
                1,
                ObjectiveKind::Dialog { dialog_id: dialog.into(), node_id: None, npc_id: None },
            ))
            .with_reward(Reward::experience(50))
    }

    fn story() -> QuestManager {
        let mut m = QuestManager::new();
        m.add_quest(talk("mq_01", "elder_intro")).unwrap();
        m.add_quest(talk("mq_02", "bram_talk").with_prerequisite("mq_01")).unwrap();
        m.add_quest_chain(
            MAIN_STORY_CHAIN,
            QuestChain { name: "Main".into(), description: String::new(), quests: vec!["mq_01".into(), "mq_02".into()] },
        );
        m
    }

    #[test]
    fn test_dialog_completion_advances_chain() {
        let mut manager = story();
        let mut handler = StoryHandler::new();
        assert_eq!(handler.start_initial_quest(&mut manager, 1).unwrap(), "mq_01");

        let mut purse = Purse::default();
        let updated = handler.on_dialog_finished("elder_intro", "farewell", None, &mut manager, &mut purse, 1);
        assert_eq!(updated, vec!["mq_01".to_string()]);
        assert_eq!(purse.xp, 50);
        assert_eq!(manager.get_quest("mq_01").unwrap().status, QuestStatus::TurnedIn);
        assert_eq!(handler.current_main_quest(&manager).unwrap().id, "mq_02");
    }

    #[test]
    fn test_flags_unlock_auto_start_quests() {
        let mut manager = story();
        let mut side = Quest::new("sq_redemption", "Redemption's Price", "", QuestType::Side);
        side.auto_start = true;
        side.required_flags.insert("bram_fate".into(), "mercy".into());
        manager.add_quest(side).unwrap();

        let mut handler = StoryHandler::new();
        assert_eq!(handler.handle_flag("no_equals_sign", &mut manager, 1), Err(QuestError::MalformedFlag("no_equals_sign".into())));
        assert!(handler.handle_flag("bram_fate=justice", &mut manager, 1).unwrap().is_empty());
        let started = handler.handle_flag("bram_fate=mercy", &mut manager, 1).unwrap();
        assert_eq!(started, vec!["sq_redemption".to_string()]);
        assert_eq!(handler.get_flag("bram_fate"), Some("mercy"));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut handler = StoryHandler::new();
        handler.set_flag("trusted_suspect", "lysa");
        let snapshot = handler.snapshot();
        let mut restored = StoryHandler::new();
        restored.restore(snapshot.clone());
        assert_eq!(restored.snapshot(), snapshot);
    }
}
