//! Inventory system
//!
//! Fixed-size slot array (5x8 grid in the UI) plus gold.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::item::{Item, ItemId, ItemKind, ConsumableType};

/// Default slot count (5 columns x 8 rows)
pub const DEFAULT_CAPACITY: usize = 40;
/// Inventory grid width in the UI
pub const GRID_COLUMNS: usize = 5;

#[derive(Debug, Error, PartialEq)]
pub enum InventoryError {
    #[error("slot {index} is out of range (capacity {capacity})")]
    SlotOutOfRange { index: usize, capacity: usize },
    #[error("slot {0} is empty")]
    EmptySlot(usize),
    #[error("item in slot {0} is not consumable")]
    NotConsumable(usize),
    #[error("not enough gold: need {need}, have {have}")]
    NotEnoughGold { need: u32, have: u32 },
}

/// Player inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<Item>>,
    gold: u32,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Inventory {
    /// Create an empty inventory
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            gold: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Get current number of items
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn free_slots(&self) -> usize {
        self.capacity() - self.count()
    }

    pub fn is_full(&self) -> bool {
        self.first_empty().is_none()
    }

    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.is_none())
    }

    /// Put an item into the first empty slot.
    /// Hands the item back when the inventory is full.
    pub fn add_item(&mut self, item: Item) -> Result<usize, Item> {
        match self.first_empty() {
            Some(index) => {
                self.slots[index] = Some(item);
                Ok(index)
            }
            None => Err(item),
        }
    }

    /// Place an item at an exact slot, returning what was there
    pub fn set_slot(&mut self, index: usize, item: Option<Item>) -> Result<Option<Item>, InventoryError> {
        let capacity = self.capacity();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(InventoryError::SlotOutOfRange { index, capacity })?;
        Ok(std::mem::replace(slot, item))
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Item> {
        self.slots.get_mut(index).and_then(|s| s.take())
    }

    pub fn remove_by_id(&mut self, id: ItemId) -> Option<Item> {
        self.slots
            .iter_mut()
            .find(|s| s.as_ref().map_or(false, |i| i.id == id))
            .and_then(|s| s.take())
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.slots.get(index).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Item> {
        self.slots.get_mut(index).and_then(|s| s.as_mut())
    }

    /// Swap two slots (either may be empty)
    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), InventoryError> {
        let capacity = self.capacity();
        for index in [a, b] {
            if index >= capacity {
                return Err(InventoryError::SlotOutOfRange { index, capacity });
            }
        }
        self.slots.swap(a, b);
        Ok(())
    }

    /// Iterate over occupied slots with their index
    pub fn items(&self) -> impl Iterator<Item = (usize, &Item)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|item| (i, item)))
    }

    /// Count items whose quest tag matches
    pub fn count_tagged(&self, tag: &str) -> usize {
        self.items().filter(|(_, i)| i.quest_tag() == tag).count()
    }

    /// Use up the consumable in a slot
    pub fn consume_at(&mut self, index: usize) -> Result<(ConsumableType, i32), InventoryError> {
        let capacity = self.capacity();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(InventoryError::SlotOutOfRange { index, capacity })?;
        let effect = match slot {
            None => return Err(InventoryError::EmptySlot(index)),
            Some(item) => match item.kind {
                ItemKind::Consumable { consumable_type, effect_value } => (consumable_type, effect_value),
                _ => return Err(InventoryError::NotConsumable(index)),
            },
        };
        *slot = None;
        Ok(effect)
    }

    pub fn gold(&self) -> u32 {
        self.gold
    }

    pub fn add_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    pub fn spend_gold(&mut self, amount: u32) -> Result<(), InventoryError> {
        if self.gold < amount {
            return Err(InventoryError::NotEnoughGold { need: amount, have: self.gold });
        }
        self.gold -= amount;
        Ok(())
    }

    /// Slot contents as owned values (for saves)
    pub fn slots_owned(&self) -> Vec<Option<Item>> {
        self.slots.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{Quality, WeaponType};

    fn sword(id: ItemId) -> Item {
        Item::new(id, ItemKind::Weapon { weapon_type: WeaponType::Sword, attack_power: 5 }, Quality::Standard)
    }

    fn potion(id: ItemId) -> Item {
        Item::new(
            id,
            ItemKind::Consumable { consumable_type: ConsumableType::Health, effect_value: 25 },
            Quality::Standard,
        )
    }

    #[test]
    fn test_full_inventory_returns_item() {
        let mut inv = Inventory::new(2);
        assert_eq!(inv.add_item(sword(1)), Ok(0));
        assert_eq!(inv.add_item(sword(2)), Ok(1));
        let rejected = inv.add_item(sword(3)).unwrap_err();
        assert_eq!(rejected.id, 3);
        assert_eq!(inv.count(), 2);
    }

    #[test]
    fn test_add_fills_first_gap() {
        let mut inv = Inventory::new(4);
        for id in 0..4 {
            inv.add_item(sword(id)).unwrap();
        }
        inv.remove_at(1);
        assert_eq!(inv.add_item(sword(9)), Ok(1));
    }

    #[test]
    fn test_set_slot_out_of_range() {
        let mut inv = Inventory::new(3);
        assert_eq!(
            inv.set_slot(5, Some(sword(1))),
            Err(InventoryError::SlotOutOfRange { index: 5, capacity: 3 })
        );
        assert!(inv.set_slot(2, Some(sword(1))).unwrap().is_none());
        assert_eq!(inv.get(2).map(|i| i.id), Some(1));
    }

    #[test]
    fn test_consume_at() {
        let mut inv = Inventory::new(3);
        inv.add_item(sword(1)).unwrap();
        inv.add_item(potion(2)).unwrap();
        assert_eq!(inv.consume_at(0), Err(InventoryError::NotConsumable(0)));
        assert_eq!(inv.consume_at(1), Ok((ConsumableType::Health, 25)));
        assert!(inv.get(1).is_none());
        assert_eq!(inv.consume_at(1), Err(InventoryError::EmptySlot(1)));
    }

    #[test]
    fn test_gold() {
        let mut inv = Inventory::default();
        inv.add_gold(50);
        assert!(inv.spend_gold(80).is_err());
        inv.spend_gold(20).unwrap();
        assert_eq!(inv.gold(), 30);
        assert_eq!(inv.capacity(), DEFAULT_CAPACITY);
    }
}
