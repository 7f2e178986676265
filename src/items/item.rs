//! Item definitions
//!
//! Core item types, qualities, materials and prefixes.

use serde::{Deserialize, Serialize};

/// Unique item ID for tracking
pub type ItemId = u64;

/// Item quality tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    Standard,   // White - base stats only
    Polished,   // Green
    Masterwork, // Blue
    Legendary,  // Orange
}

impl Quality {
    pub const ALL: [Quality; 4] = [
        Quality::Standard,
        Quality::Polished,
        Quality::Masterwork,
        Quality::Legendary,
    ];

    /// Stat multiplier applied to rolled base values
    pub fn multiplier(&self) -> f32 {
        match self {
            Quality::Standard => 1.0,
            Quality::Polished => 1.2,
            Quality::Masterwork => 1.5,
            Quality::Legendary => 2.0,
        }
    }

    /// Chance to roll a prefix
    pub fn prefix_chance(&self) -> f64 {
        match self {
            Quality::Standard => 0.1,
            Quality::Polished => 0.2,
            Quality::Masterwork => 0.4,
            Quality::Legendary => 0.8,
        }
    }

    /// Get display color RGB
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Quality::Standard => (200, 200, 200),
            Quality::Polished => (100, 255, 100),
            Quality::Masterwork => (100, 150, 255),
            Quality::Legendary => (255, 180, 50),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Quality::Standard => "Standard",
            Quality::Polished => "Polished",
            Quality::Masterwork => "Masterwork",
            Quality::Legendary => "Legendary",
        }
    }

    /// Prefixes that can roll on an item of this quality
    pub fn prefix_pool(&self) -> Vec<Prefix> {
        match self {
            Quality::Standard => Prefix::COMMON.to_vec(),
            Quality::Polished => Prefix::UNCOMMON.to_vec(),
            Quality::Masterwork => Prefix::UNCOMMON.iter().chain(Prefix::RARE.iter()).copied().collect(),
            Quality::Legendary => Prefix::RARE.to_vec(),
        }
    }
}

/// Materials weapons and armor are forged from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    Iron,
    Steel,
    Silver,
    Gold,
    Mithril,
}

impl Material {
    pub const ALL: [Material; 5] = [
        Material::Iron,
        Material::Steel,
        Material::Silver,
        Material::Gold,
        Material::Mithril,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Material::Iron => "Iron",
            Material::Steel => "Steel",
            Material::Silver => "Silver",
            Material::Gold => "Gold",
            Material::Mithril => "Mithril",
        }
    }
}

/// Name prefixes, tiered by rarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prefix {
    // Common
    Sharp,
    Sturdy,
    Balanced,
    // Uncommon
    Vicious,
    Reinforced,
    Precise,
    // Rare
    Soulbound,
    Ethereal,
    Celestial,
}

impl Prefix {
    pub const COMMON: [Prefix; 3] = [Prefix::Sharp, Prefix::Sturdy, Prefix::Balanced];
    pub const UNCOMMON: [Prefix; 3] = [Prefix::Vicious, Prefix::Reinforced, Prefix::Precise];
    pub const RARE: [Prefix; 3] = [Prefix::Soulbound, Prefix::Ethereal, Prefix::Celestial];

    pub fn name(&self) -> &'static str {
        match self {
            Prefix::Sharp => "Sharp",
            Prefix::Sturdy => "Sturdy",
            Prefix::Balanced => "Balanced",
            Prefix::Vicious => "Vicious",
            Prefix::Reinforced => "Reinforced",
            Prefix::Precise => "Precise",
            Prefix::Soulbound => "Soulbound",
            Prefix::Ethereal => "Ethereal",
            Prefix::Celestial => "Celestial",
        }
    }
}

/// Equipment slot for wearable items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    Head,
    Chest,
    Legs,
    Feet,
    Hands,
    Weapon,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 6] = [
        EquipSlot::Head,
        EquipSlot::Chest,
        EquipSlot::Legs,
        EquipSlot::Feet,
        EquipSlot::Hands,
        EquipSlot::Weapon,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EquipSlot::Head => "Head",
            EquipSlot::Chest => "Chest",
            EquipSlot::Legs => "Legs",
            EquipSlot::Feet => "Feet",
            EquipSlot::Hands => "Hands",
            EquipSlot::Weapon => "Weapon",
        }
    }
}

/// Weapon subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponType {
    Sword,
    Axe,
    Mace,
    Dagger,
    Staff,
}

impl WeaponType {
    pub const ALL: [WeaponType; 5] = [
        WeaponType::Sword,
        WeaponType::Axe,
        WeaponType::Mace,
        WeaponType::Dagger,
        WeaponType::Staff,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WeaponType::Sword => "Sword",
            WeaponType::Axe => "Axe",
            WeaponType::Mace => "Mace",
            WeaponType::Dagger => "Dagger",
            WeaponType::Staff => "Staff",
        }
    }
}

/// Armor pieces; each maps onto its own equipment slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmorType {
    Head,
    Chest,
    Legs,
    Feet,
    Hands,
}

impl ArmorType {
    pub const ALL: [ArmorType; 5] = [
        ArmorType::Head,
        ArmorType::Chest,
        ArmorType::Legs,
        ArmorType::Feet,
        ArmorType::Hands,
    ];

    pub fn slot(&self) -> EquipSlot {
        match self {
            ArmorType::Head => EquipSlot::Head,
            ArmorType::Chest => EquipSlot::Chest,
            ArmorType::Legs => EquipSlot::Legs,
            ArmorType::Feet => EquipSlot::Feet,
            ArmorType::Hands => EquipSlot::Hands,
        }
    }

    pub fn name(&self) -> &'static str {
        self.slot().name()
    }
}

/// Potion flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsumableType {
    Health,
    Mana,
    Stamina,
}

impl ConsumableType {
    pub const ALL: [ConsumableType; 3] = [ConsumableType::Health, ConsumableType::Mana, ConsumableType::Stamina];

    pub fn name(&self) -> &'static str {
        match self {
            ConsumableType::Health => "Health",
            ConsumableType::Mana => "Mana",
            ConsumableType::Stamina => "Stamina",
        }
    }
}

/// What an item is, with its kind-specific stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    Weapon { weapon_type: WeaponType, attack_power: i32 },
    Armor { armor_type: ArmorType, defense: i32 },
    Gauntlets { defense: i32, dexterity: i32 },
    Consumable { consumable_type: ConsumableType, effect_value: i32 },
    /// Story item matched by collect objectives
    Quest { tag: String },
}

/// The main Item struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique instance ID
    pub id: ItemId,
    pub kind: ItemKind,
    pub quality: Quality,
    /// Consumables and quest items have no material
    pub material: Option<Material>,
    pub prefix: Option<Prefix>,
}

impl Item {
    pub fn new(id: ItemId, kind: ItemKind, quality: Quality) -> Self {
        Self {
            id,
            kind,
            quality,
            material: None,
            prefix: None,
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Base name without quality, material or prefix
    pub fn base_name(&self) -> String {
        match &self.kind {
            ItemKind::Weapon { weapon_type, .. } => weapon_type.name().to_string(),
            ItemKind::Armor { armor_type, .. } => armor_type.name().to_string(),
            ItemKind::Gauntlets { .. } => "Gauntlets".to_string(),
            ItemKind::Consumable { consumable_type, .. } => format!("{} Potion", consumable_type.name()),
            ItemKind::Quest { tag } => title_case(tag),
        }
    }

    /// Full name, e.g. "Vicious Masterwork Steel Sword"
    pub fn display_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(prefix) = &self.prefix {
            parts.push(prefix.name());
        }
        if self.quality != Quality::Standard {
            parts.push(self.quality.name());
        }
        if let Some(material) = &self.material {
            parts.push(material.name());
        }
        let base = self.base_name();
        parts.push(&base);
        parts.join(" ")
    }

    /// Tooltip lines
    pub fn stats_display(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match &self.kind {
            ItemKind::Weapon { attack_power, .. } => lines.push(format!("Attack: {}", attack_power)),
            ItemKind::Armor { defense, .. } => lines.push(format!("Defense: {}", defense)),
            ItemKind::Gauntlets { defense, dexterity } => {
                lines.push(format!("Defense: {}", defense));
                lines.push(format!("Dexterity: +{}", dexterity));
            }
            ItemKind::Consumable { consumable_type, effect_value } => {
                lines.push(format!("Restores {} {}", effect_value, consumable_type.name()));
            }
            ItemKind::Quest { .. } => lines.push("Quest item".to_string()),
        }
        if self.quality != Quality::Standard {
            lines.push(format!("Quality: {}", self.quality.name()));
        }
        if let Some(material) = &self.material {
            lines.push(format!("Material: {}", material.name()));
        }
        if let Some(prefix) = &self.prefix {
            lines.push(format!("Effect: {}", prefix.name()));
        }
        lines
    }

    /// Slot this item is worn in, if any
    pub fn equip_slot(&self) -> Option<EquipSlot> {
        match &self.kind {
            ItemKind::Weapon { .. } => Some(EquipSlot::Weapon),
            ItemKind::Armor { armor_type, .. } => Some(armor_type.slot()),
            ItemKind::Gauntlets { .. } => Some(EquipSlot::Hands),
            ItemKind::Consumable { .. } | ItemKind::Quest { .. } => None,
        }
    }

    pub fn is_consumable(&self) -> bool {
        matches!(self.kind, ItemKind::Consumable { .. })
    }

    /// String matched against collect objectives
    pub fn quest_tag(&self) -> String {
        match &self.kind {
            ItemKind::Quest { tag } => tag.clone(),
            _ => self.base_name().to_lowercase(),
        }
    }

    pub fn attack_bonus(&self) -> i32 {
        match self.kind {
            ItemKind::Weapon { attack_power, .. } => attack_power,
            _ => 0,
        }
    }

    pub fn defense_bonus(&self) -> i32 {
        match self.kind {
            ItemKind::Armor { defense, .. } | ItemKind::Gauntlets { defense, .. } => defense,
            _ => 0,
        }
    }

    pub fn dexterity_bonus(&self) -> i32 {
        match self.kind {
            ItemKind::Gauntlets { dexterity, .. } => dexterity,
            _ => 0,
        }
    }

    /// Display glyph
    pub fn glyph(&self) -> char {
        match &self.kind {
            ItemKind::Weapon { .. } => '/',
            ItemKind::Armor { .. } => '[',
            ItemKind::Gauntlets { .. } => '(',
            ItemKind::Consumable { .. } => '!',
            ItemKind::Quest { .. } => '*',
        }
    }
}

fn title_case(tag: &str) -> String {
    tag.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_order() {
        let item = Item::new(
            1,
            ItemKind::Weapon { weapon_type: WeaponType::Sword, attack_power: 12 },
            Quality::Masterwork,
        )
        .with_material(Material::Steel)
        .with_prefix(Prefix::Vicious);
        assert_eq!(item.display_name(), "Vicious Masterwork Steel Sword");
    }

    #[test]
    fn test_standard_quality_hidden() {
        let potion = Item::new(
            2,
            ItemKind::Consumable { consumable_type: ConsumableType::Health, effect_value: 30 },
            Quality::Standard,
        );
        assert_eq!(potion.display_name(), "Health Potion");
        assert_eq!(potion.equip_slot(), None);
    }

    #[test]
    fn test_equip_slot_routing() {
        let helm = Item::new(3, ItemKind::Armor { armor_type: ArmorType::Head, defense: 4 }, Quality::Standard);
        let gloves = Item::new(4, ItemKind::Gauntlets { defense: 3, dexterity: 2 }, Quality::Standard);
        assert_eq!(helm.equip_slot(), Some(EquipSlot::Head));
        assert_eq!(gloves.equip_slot(), Some(EquipSlot::Hands));
    }

    #[test]
    fn test_quest_tag() {
        let relic = Item::new(5, ItemKind::Quest { tag: "ancient_relic".into() }, Quality::Standard);
        assert_eq!(relic.quest_tag(), "ancient_relic");
        assert_eq!(relic.display_name(), "Ancient Relic");
    }
}
