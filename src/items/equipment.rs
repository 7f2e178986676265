//! Equipment system
//!
//! Manages equipped items and calculates total bonuses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::item::{EquipSlot, Item};

/// Failures of the inventory <-> equipment flow
#[derive(Debug, Error, PartialEq)]
pub enum EquipError {
    #[error("{0} cannot be equipped")]
    NotEquippable(String),
    #[error("nothing equipped in {0:?}")]
    EmptySlot(EquipSlot),
    #[error("inventory slot {0} is empty")]
    NoItem(usize),
    #[error("inventory is full")]
    InventoryFull,
}

/// Player equipment slots
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Equipment {
    slots: HashMap<EquipSlot, Item>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equip an item into the slot its kind maps to.
    ///
    /// Returns the previous occupant of that slot; an item with no slot is
    /// handed back as `Err`.
    pub fn equip(&mut self, item: Item) -> Result<Option<Item>, Item> {
        match item.equip_slot() {
            Some(slot) => Ok(self.slots.insert(slot, item)),
            None => Err(item),
        }
    }

    pub fn unequip(&mut self, slot: EquipSlot) -> Option<Item> {
        self.slots.remove(&slot)
    }

    pub fn get(&self, slot: EquipSlot) -> Option<&Item> {
        self.slots.get(&slot)
    }

    pub fn is_empty(&self, slot: EquipSlot) -> bool {
        !self.slots.contains_key(&slot)
    }

    /// Slots in display order with their contents
    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, Option<&Item>)> {
        EquipSlot::ALL.iter().map(move |slot| (*slot, self.slots.get(slot)))
    }

    pub fn total_attack(&self) -> i32 {
        self.slots.values().map(|i| i.attack_bonus()).sum()
    }

    pub fn total_defense(&self) -> i32 {
        self.slots.values().map(|i| i.defense_bonus()).sum()
    }

    pub fn total_dexterity(&self) -> i32 {
        self.slots.values().map(|i| i.dexterity_bonus()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ArmorType, ConsumableType, ItemKind, Quality, WeaponType};

    fn item(id: u64, kind: ItemKind) -> Item {
        Item::new(id, kind, Quality::Standard)
    }

    #[test]
    fn test_equip_routes_by_kind() {
        let mut eq = Equipment::new();
        eq.equip(item(1, ItemKind::Armor { armor_type: ArmorType::Legs, defense: 4 })).unwrap();
        eq.equip(item(2, ItemKind::Gauntlets { defense: 2, dexterity: 3 })).unwrap();
        eq.equip(item(3, ItemKind::Weapon { weapon_type: WeaponType::Axe, attack_power: 9 })).unwrap();

        assert_eq!(eq.get(EquipSlot::Legs).map(|i| i.id), Some(1));
        assert_eq!(eq.get(EquipSlot::Hands).map(|i| i.id), Some(2));
        assert_eq!(eq.get(EquipSlot::Weapon).map(|i| i.id), Some(3));
        assert_eq!(eq.total_defense(), 6);
        assert_eq!(eq.total_attack(), 9);
        assert_eq!(eq.total_dexterity(), 3);
    }

    #[test]
    fn test_equip_returns_previous() {
        let mut eq = Equipment::new();
        let first = item(1, ItemKind::Armor { armor_type: ArmorType::Head, defense: 1 });
        let second = item(2, ItemKind::Armor { armor_type: ArmorType::Head, defense: 2 });
        assert_eq!(eq.equip(first).unwrap(), None);
        assert_eq!(eq.equip(second).unwrap().map(|i| i.id), Some(1));
    }

    #[test]
    fn test_consumable_not_equippable() {
        let mut eq = Equipment::new();
        let potion = item(1, ItemKind::Consumable { consumable_type: ConsumableType::Mana, effect_value: 20 });
        assert_eq!(eq.equip(potion).unwrap_err().id, 1);
        assert!(eq.iter().all(|(_, i)| i.is_none()));
    }
}
