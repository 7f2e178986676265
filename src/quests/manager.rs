//! Quest bookkeeping
//!
//! Quests move from `available` to `active` when started, then to
//! `completed` once turned in (or `failed` when a time limit runs out).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::objectives::QuestEvent;
use super::quest::{Quest, QuestContext, QuestError, QuestId, QuestStatus, QuestType};
use super::rewards::RewardTarget;

/// A named, ordered run of quests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestChain {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quests: Vec<QuestId>,
}

#[derive(Debug, Clone, Default)]
pub struct QuestManager {
    available: BTreeMap<QuestId, Quest>,
    active: BTreeMap<QuestId, Quest>,
    completed: BTreeMap<QuestId, Quest>,
    failed: BTreeMap<QuestId, Quest>,
    chains: BTreeMap<String, QuestChain>,
}

impl QuestManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new quest. Ids must be unique across every state.
    pub fn add_quest(&mut self, quest: Quest) -> Result<(), QuestError> {
        if self.get_quest(&quest.id).is_some() {
            return Err(QuestError::Duplicate(quest.id));
        }
        let id = quest.id.clone();
        match quest.status {
            QuestStatus::NotStarted => self.available.insert(id, quest),
            QuestStatus::InProgress | QuestStatus::Completed => self.active.insert(id, quest),
            QuestStatus::TurnedIn => self.completed.insert(id, quest),
            QuestStatus::Failed => self.failed.insert(id, quest),
        };
        Ok(())
    }

    pub fn get_quest(&self, id: &str) -> Option<&Quest> {
        self.active
            .get(id)
            .or_else(|| self.completed.get(id))
            .or_else(|| self.available.get(id))
            .or_else(|| self.failed.get(id))
    }

    pub fn get_quest_mut(&mut self, id: &str) -> Option<&mut Quest> {
        if self.active.contains_key(id) {
            return self.active.get_mut(id);
        }
        if self.completed.contains_key(id) {
            return self.completed.get_mut(id);
        }
        if self.available.contains_key(id) {
            return self.available.get_mut(id);
        }
        self.failed.get_mut(id)
    }

    pub fn is_turned_in(&self, id: &str) -> bool {
        self.completed.get(id).is_some_and(|q| q.status == QuestStatus::TurnedIn)
    }

    /// Not-yet-started quests the player could start now
    pub fn available_quests(&self, ctx: &QuestContext) -> Vec<&Quest> {
        self.available
            .values()
            .filter(|q| q.is_available(ctx, |id| self.is_turned_in(id)))
            .collect()
    }

    pub fn active_quests(&self) -> impl Iterator<Item = &Quest> {
        self.active.values()
    }

    pub fn completed_quests(&self) -> impl Iterator<Item = &Quest> {
        self.completed.values()
    }

    pub fn failed_quests(&self) -> impl Iterator<Item = &Quest> {
        self.failed.values()
    }

    pub fn all_quests(&self) -> impl Iterator<Item = &Quest> {
        self.available
            .values()
            .chain(self.active.values())
            .chain(self.completed.values())
            .chain(self.failed.values())
    }

    pub fn check_startable(&self, id: &str, ctx: &QuestContext) -> Result<(), QuestError> {
        match self.available.get(id) {
            Some(quest) => quest.check_available(ctx, |p| self.is_turned_in(p)),
            None if self.get_quest(id).is_some() => Err(QuestError::NotStartable(id.to_string())),
            None => Err(QuestError::UnknownQuest(id.to_string())),
        }
    }

    pub fn start_quest(&mut self, id: &str, ctx: &QuestContext) -> Result<(), QuestError> {
        self.check_startable(id, ctx)?;
        let Some(mut quest) = self.available.remove(id) else {
            return Err(QuestError::UnknownQuest(id.to_string()));
        };
        quest.start();
        log::info!("Started quest '{}'", quest.id);
        self.active.insert(quest.id.clone(), quest);
        Ok(())
    }

    /// Turn in a completed quest and grant its rewards
    pub fn complete_quest(&mut self, id: &str, target: &mut dyn RewardTarget) -> Result<(), QuestError> {
        if !self.active.contains_key(id) {
            return match self.get_quest(id) {
                Some(_) => Err(QuestError::NotCompleted(id.to_string())),
                None => Err(QuestError::UnknownQuest(id.to_string())),
            };
        }
        if let Some(quest) = self.active.get_mut(id) {
            quest.turn_in(target)?;
        }
        if let Some(quest) = self.active.remove(id) {
            log::info!("Turned in quest '{}'", quest.id);
            self.completed.insert(quest.id.clone(), quest);
        }
        Ok(())
    }

    /// Feed an event to every active quest; returns the ids that progressed
    pub fn process_event(&mut self, event: &QuestEvent) -> Vec<QuestId> {
        let mut updated = Vec::new();
        for quest in self.active.values_mut() {
            if quest.update_objectives(event) {
                log::debug!("Quest '{}' progressed on {:?}", quest.id, event);
                updated.push(quest.id.clone());
            }
        }
        updated
    }

    pub fn quests_by_type(&self, quest_type: QuestType) -> Vec<&Quest> {
        self.all_quests().filter(|q| q.quest_type == quest_type).collect()
    }

    /// The quest preceded by its unfinished prerequisites, earliest first
    pub fn prerequisite_chain(&self, id: &str) -> Vec<&Quest> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = self.get_quest(id);

        while let Some(quest) = current {
            if !seen.insert(quest.id.as_str()) {
                break;
            }
            chain.insert(0, quest);
            current = quest
                .prerequisites
                .iter()
                .filter_map(|p| self.get_quest(p))
                .find(|p| p.status != QuestStatus::TurnedIn);
        }
        chain
    }

    /// Register a chain and link its member quests in order
    pub fn add_quest_chain(&mut self, chain_id: impl Into<String>, chain: QuestChain) {
        let chain_id = chain_id.into();
        let count = chain.quests.len();
        for (i, quest_id) in chain.quests.iter().enumerate() {
            let Some(quest) = self.get_quest_mut(quest_id) else {
                log::warn!("Chain '{}' names unknown quest '{}'", chain_id, quest_id);
                continue;
            };
            quest.chain_id = Some(chain_id.clone());
            quest.chain_position = Some(i as u32 + 1);
            if i + 1 < count {
                quest.next_quest_id = Some(chain.quests[i + 1].clone());
            }
        }
        self.chains.insert(chain_id, chain);
    }

    pub fn chain(&self, chain_id: &str) -> Option<&QuestChain> {
        self.chains.get(chain_id)
    }

    pub fn chains(&self) -> impl Iterator<Item = (&String, &QuestChain)> {
        self.chains.iter()
    }

    /// Advance timed quests; returns the ids that just failed
    pub fn tick(&mut self, dt: f32) -> Vec<QuestId> {
        let failed: Vec<QuestId> = self
            .active
            .values_mut()
            .filter_map(|q| q.tick(dt).then(|| q.id.clone()))
            .collect();
        for id in &failed {
            if let Some(quest) = self.active.remove(id) {
                log::info!("Quest '{}' ran out of time", id);
                self.failed.insert(id.clone(), quest);
            }
        }
        failed
    }

    /// Put a saved quest state back, moving the quest between maps
    pub fn restore_progress(&mut self, id: &str, status: QuestStatus, progress: &[u32], elapsed: f32) -> bool {
        let quest = self
            .available
            .remove(id)
            .or_else(|| self.active.remove(id))
            .or_else(|| self.completed.remove(id))
            .or_else(|| self.failed.remove(id));
        let Some(mut quest) = quest else {
            return false;
        };
        quest.status = status;
        quest.elapsed = elapsed;
        for (objective, &current) in quest.objectives.iter_mut().zip(progress) {
            objective.current = current.min(objective.required);
            objective.completed = objective.current >= objective.required;
        }
        if let Err(err) = self.add_quest(quest) {
            log::warn!("Could not restore quest: {}", err);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quests::objectives::Objective;
    use crate::quests::rewards::tests::Purse;
    use crate::quests::rewards::Reward;

    fn quest(id: &str) -> Quest {
        Quest::new(id, id, "", QuestType::Main)
            .with_objective(Objective::kill("slime", 1))
            .with_reward(Reward::experience(10))
    }

    fn manager() -> QuestManager {
        let mut m = QuestManager::new();
        m.add_quest(quest("first")).unwrap();
        m.add_quest(quest("second").with_prerequisite("first")).unwrap();
        m.add_quest(quest("third").with_prerequisite("second")).unwrap();
        m
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut m = manager();
        assert_eq!(m.add_quest(quest("first")), Err(QuestError::Duplicate("first".into())));
    }

    #[test]
    fn test_prerequisites_gate_start() {
        let mut m = manager();
        let flags = BTreeMap::new();
        let ctx = QuestContext::new(1, &flags);

        assert_eq!(m.available_quests(&ctx).len(), 1);
        assert!(matches!(m.start_quest("second", &ctx), Err(QuestError::PrerequisiteUnmet { .. })));

        m.start_quest("first", &ctx).unwrap();
        assert_eq!(m.process_event(&QuestEvent::kill("slime")), vec!["first".to_string()]);
        // Completed but not turned in still blocks
        assert!(m.start_quest("second", &ctx).is_err());

        let mut purse = Purse::default();
        m.complete_quest("first", &mut purse).unwrap();
        assert_eq!(purse.xp, 10);
        m.start_quest("second", &ctx).unwrap();
        assert_eq!(m.active_quests().count(), 1);
        assert_eq!(m.completed_quests().count(), 1);
    }

    #[test]
    fn test_prerequisite_chain_lists_unfinished_ancestors() {
        let m = manager();
        let ids: Vec<&str> = m.prerequisite_chain("third").iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert!(m.prerequisite_chain("missing").is_empty());
    }

    #[test]
    fn test_chain_links_members() {
        let mut m = manager();
        m.add_quest_chain(
            "main_story",
            QuestChain {
                name: "Main".into(),
                description: String::new(),
                quests: vec!["first".into(), "second".into(), "third".into()],
            },
        );
        let second = m.get_quest("second").unwrap();
        assert_eq!(second.chain_position, Some(2));
        assert_eq!(second.next_quest_id.as_deref(), Some("third"));
        assert_eq!(m.get_quest("third").unwrap().next_quest_id, None);
        assert_eq!(m.chain("main_story").unwrap().quests.len(), 3);
        assert_eq!(m.quests_by_type(QuestType::Main).len(), 3);
    }

    #[test]
    fn test_tick_moves_expired_quests_to_failed() {
        let mut m = QuestManager::new();
        let mut timed = quest("timed");
        timed.time_limit = Some(5.0);
        m.add_quest(timed).unwrap();
        let flags = BTreeMap::new();
        m.start_quest("timed", &QuestContext::new(1, &flags)).unwrap();

        assert!(m.tick(3.0).is_empty());
        assert_eq!(m.tick(3.0), vec!["timed".to_string()]);
        assert_eq!(m.get_quest("timed").unwrap().status, QuestStatus::Failed);
        assert_eq!(m.failed_quests().count(), 1);
    }
}
