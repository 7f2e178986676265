//! Quest objectives and the events that advance them

use serde::{Deserialize, Serialize};

fn one() -> u32 {
    1
}

/// Something that happened in the world that quests may care about
#[derive(Debug, Clone, PartialEq)]
pub enum QuestEvent {
    Kill {
        enemy_type: String,
        enemy_id: Option<String>,
    },
    Collect {
        item_type: String,
        item_id: Option<String>,
        amount: u32,
    },
    Explore {
        location_id: String,
    },
    Deliver {
        item_id: String,
        npc_id: String,
    },
    Dialog {
        dialog_id: String,
        node_id: String,
        npc_id: Option<String>,
    },
}

impl QuestEvent {
    pub fn kill(enemy_type: impl Into<String>) -> Self {
        QuestEvent::Kill { enemy_type: enemy_type.into(), enemy_id: None }
    }

    pub fn collect(item_type: impl Into<String>, amount: u32) -> Self {
        QuestEvent::Collect { item_type: item_type.into(), item_id: None, amount }
    }

    pub fn explore(location_id: impl Into<String>) -> Self {
        QuestEvent::Explore { location_id: location_id.into() }
    }
}

/// What an objective is waiting for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectiveKind {
    Kill {
        target_type: String,
        #[serde(default)]
        target_id: Option<String>,
    },
    Collect {
        item_type: String,
        #[serde(default)]
        item_id: Option<String>,
    },
    Explore {
        location_id: String,
        #[serde(default)]
        area_name: String,
    },
    Deliver {
        item_id: String,
        #[serde(alias = "target_npc_id")]
        npc_id: String,
    },
    Dialog {
        dialog_id: String,
        #[serde(default)]
        node_id: Option<String>,
        #[serde(default)]
        npc_id: Option<String>,
    },
}

/// A single tracked goal inside a quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    #[serde(default)]
    pub description: String,
    #[serde(rename = "required_progress", default = "one")]
    pub required: u32,
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(flatten)]
    pub kind: ObjectiveKind,
}

impl Objective {
    pub fn new(description: impl Into<String>, required: u32, kind: ObjectiveKind) -> Self {
        Self {
            description: description.into(),
            required: required.max(1),
            current: 0,
            completed: false,
            kind,
        }
    }

    pub fn kill(target_type: impl Into<String>, required: u32) -> Self {
        let target_type = target_type.into();
        Self::new(
            format!("Defeat {} {}", required, target_type),
            required,
            ObjectiveKind::Kill { target_type, target_id: None },
        )
    }

    pub fn collect(item_type: impl Into<String>, required: u32) -> Self {
        let item_type = item_type.into();
        Self::new(
            format!("Collect {} {}", required, item_type),
            required,
            ObjectiveKind::Collect { item_type, item_id: None },
        )
    }

    pub fn explore(location_id: impl Into<String>, area_name: impl Into<String>) -> Self {
        let area_name = area_name.into();
        Self::new(
            format!("Explore the {}", area_name),
            1,
            ObjectiveKind::Explore { location_id: location_id.into(), area_name },
        )
    }

    /// Advance progress, clamped at `required`.
    /// Returns true only on the update that completes the objective.
    pub fn update_progress(&mut self, amount: u32) -> bool {
        if self.completed {
            return false;
        }
        self.current = (self.current + amount).min(self.required);
        if self.current >= self.required {
            self.completed = true;
            return true;
        }
        false
    }

    /// Apply an event. Returns true if it counted toward this objective.
    pub fn check_progress(&mut self, event: &QuestEvent) -> bool {
        if self.completed {
            return false;
        }
        let amount = match (&self.kind, event) {
            (
                ObjectiveKind::Kill { target_type, target_id },
                QuestEvent::Kill { enemy_type, enemy_id },
            ) => {
                if target_type != enemy_type || !optional_matches(target_id, enemy_id) {
                    return false;
                }
                1
            }
            (
                ObjectiveKind::Collect { item_type, item_id },
                QuestEvent::Collect { item_type: collected, item_id: collected_id, amount },
            ) => {
                if item_type != collected || !optional_matches(item_id, collected_id) {
                    return false;
                }
                *amount
            }
            (ObjectiveKind::Explore { location_id, .. }, QuestEvent::Explore { location_id: found }) => {
                if location_id != found {
                    return false;
                }
                1
            }
            (
                ObjectiveKind::Deliver { item_id, npc_id },
                QuestEvent::Deliver { item_id: delivered, npc_id: to },
            ) => {
                if item_id != delivered || npc_id != to {
                    return false;
                }
                1
            }
            (
                ObjectiveKind::Dialog { dialog_id, node_id, npc_id },
                QuestEvent::Dialog { dialog_id: finished, node_id: last_node, npc_id: speaker },
            ) => {
                if dialog_id != finished {
                    return false;
                }
                if node_id.as_ref().is_some_and(|n| n != last_node) {
                    return false;
                }
                // Events without a speaker still count
                if let (Some(want), Some(got)) = (npc_id, speaker) {
                    if want != got {
                        return false;
                    }
                }
                1
            }
            _ => return false,
        };

        // Explore, deliver and dialog objectives only ever need one hit
        let amount = match self.kind {
            ObjectiveKind::Kill { .. } | ObjectiveKind::Collect { .. } => amount,
            _ => self.required - self.current,
        };
        self.update_progress(amount.max(1));
        true
    }
}

/// An objective-side id filter matches anything when unset
fn optional_matches(wanted: &Option<String>, got: &Option<String>) -> bool {
    match wanted {
        Some(w) => got.as_ref() == Some(w),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_clamps_and_completes_once() {
        let mut obj = Objective::kill("wolves", 3);
        assert!(!obj.update_progress(2));
        assert!(obj.update_progress(5));
        assert_eq!(obj.current, 3);
        assert!(!obj.update_progress(1));
        assert_eq!(obj.current, 3);
    }

    #[test]
    fn test_kill_matches_type_and_optional_id() {
        let mut obj = Objective::new(
            "Slay the alpha",
            1,
            ObjectiveKind::Kill { target_type: "wolf".into(), target_id: Some("alpha".into()) },
        );
        assert!(!obj.check_progress(&QuestEvent::kill("wolf")));
        assert!(!obj.check_progress(&QuestEvent::kill("slime")));
        assert!(obj.check_progress(&QuestEvent::Kill {
            enemy_type: "wolf".into(),
            enemy_id: Some("alpha".into()),
        }));
        assert!(obj.completed);
    }

    #[test]
    fn test_collect_uses_event_amount() {
        let mut obj = Objective::collect("herbs", 5);
        assert!(obj.check_progress(&QuestEvent::collect("herbs", 3)));
        assert_eq!(obj.current, 3);
        assert!(obj.check_progress(&QuestEvent::collect("herbs", 3)));
        assert!(obj.completed);
        assert!(!obj.check_progress(&QuestEvent::collect("herbs", 1)));
    }

    #[test]
    fn test_explore_counts_once() {
        let mut obj = Objective::explore("old_mill", "Old Mill");
        assert!(!obj.check_progress(&QuestEvent::explore("village_edge")));
        assert!(obj.check_progress(&QuestEvent::explore("old_mill")));
        assert!(!obj.check_progress(&QuestEvent::explore("old_mill")));
        assert!(obj.completed);
    }

    #[test]
    fn test_dialog_objective_node_filter() {
        let mut obj = Objective::new(
            "Hear the elder out",
            1,
            ObjectiveKind::Dialog {
                dialog_id: "elder_intro".into(),
                node_id: Some("conclusion".into()),
                npc_id: Some("elder_malik".into()),
            },
        );
        let event = |node: &str| QuestEvent::Dialog {
            dialog_id: "elder_intro".into(),
            node_id: node.into(),
            npc_id: None,
        };
        assert!(!obj.check_progress(&event("greeting")));
        assert!(obj.check_progress(&event("conclusion")));
        assert!(obj.completed);
    }

    #[test]
    fn test_objective_json_shape() {
        let obj: Objective = serde_json::from_str(
            r#"{"type":"deliver","description":"Bring the letter","item_id":"letter","target_npc_id":"seren"}"#,
        )
        .unwrap();
        assert_eq!(obj.required, 1);
        assert_eq!(obj.kind, ObjectiveKind::Deliver { item_id: "letter".into(), npc_id: "seren".into() });
    }
}
