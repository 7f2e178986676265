//! Quest system
//!
//! Quest model, objectives, rewards, the quest log, JSON loading,
//! the main story handler and template-driven quest generation.

pub mod generator;
pub mod loader;
pub mod manager;
pub mod objectives;
pub mod quest;
pub mod rewards;
pub mod story;

pub use generator::QuestGenerator;
pub use loader::{LoadedQuests, QuestLoader};
pub use manager::{QuestChain, QuestManager};
pub use objectives::{Objective, ObjectiveKind, QuestEvent};
pub use quest::{Quest, QuestContext, QuestDifficulty, QuestError, QuestId, QuestStatus, QuestType};
pub use rewards::{Reward, RewardKind, RewardTarget};
pub use story::{StoryHandler, StorySnapshot, MAIN_STORY_CHAIN};
