//! Item system

pub mod equipment;
pub mod generator;
pub mod inventory;
pub mod item;

pub use equipment::{EquipError, Equipment};
pub use generator::{is_generated_tag, ItemClass, ItemGenerator};
pub use inventory::{Inventory, InventoryError, DEFAULT_CAPACITY, GRID_COLUMNS};
pub use item::{
    ArmorType, ConsumableType, EquipSlot, Item, ItemId, ItemKind, Material, Prefix, Quality, WeaponType,
};
