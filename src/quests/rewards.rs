//! Quest rewards

use serde::{Deserialize, Serialize};

use crate::items::Item;

/// Anything that can receive quest rewards
pub trait RewardTarget {
    fn add_gold(&mut self, amount: u32);
    fn add_experience(&mut self, amount: u32);
    /// Returns false if the item could not be stored
    fn add_item(&mut self, item: Item) -> bool;
    /// Room left for reward items
    fn free_slots(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RewardKind {
    Gold(u32),
    Experience(u32),
    Item { item: Item, amount: u32 },
    Multi(Vec<Reward>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub description: String,
    pub kind: RewardKind,
}

impl Reward {
    pub fn gold(amount: u32) -> Self {
        Self { description: format!("Receive {} gold", amount), kind: RewardKind::Gold(amount) }
    }

    pub fn experience(amount: u32) -> Self {
        Self { description: format!("Gain {} experience", amount), kind: RewardKind::Experience(amount) }
    }

    pub fn item(item: Item) -> Self {
        Self { description: format!("Receive {}", item.display_name()), kind: RewardKind::Item { item, amount: 1 } }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Grant to a target. Returns false if any part could not be granted;
    /// parts granted before the failure stay granted.
    pub fn grant(&self, target: &mut dyn RewardTarget) -> bool {
        match &self.kind {
            RewardKind::Gold(amount) => {
                target.add_gold(*amount);
                true
            }
            RewardKind::Experience(amount) => {
                target.add_experience(*amount);
                true
            }
            RewardKind::Item { item, amount } => {
                for _ in 0..*amount {
                    if !target.add_item(item.clone()) {
                        return false;
                    }
                }
                true
            }
            RewardKind::Multi(rewards) => {
                let mut all = true;
                for reward in rewards {
                    if !reward.grant(target) {
                        all = false;
                    }
                }
                all
            }
        }
    }

    /// Bag slots this reward needs
    pub fn item_slots(&self) -> usize {
        match &self.kind {
            RewardKind::Gold(_) | RewardKind::Experience(_) => 0,
            RewardKind::Item { amount, .. } => *amount as usize,
            RewardKind::Multi(rewards) => rewards.iter().map(Reward::item_slots).sum(),
        }
    }

    /// Total gold and experience, for display
    pub fn totals(&self) -> (u32, u32) {
        match &self.kind {
            RewardKind::Gold(amount) => (*amount, 0),
            RewardKind::Experience(amount) => (0, *amount),
            RewardKind::Item { .. } => (0, 0),
            RewardKind::Multi(rewards) => rewards.iter().fold((0, 0), |(g, x), r| {
                let (rg, rx) = r.totals();
                (g + rg, x + rx)
            }),
        }
    }
}
