//! Random item generation
//!
//! Rolls class, quality, prefix, material and stats for new items.
//! Item ids come from the generator's own counter; the game owns one
//! generator, so ids are unique per game.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::item::{
    ArmorType, ConsumableType, Item, ItemId, ItemKind, Material, Quality, WeaponType,
};

/// Broad item class picked in the generator panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemClass {
    Weapon,
    Armor,
    Consumable,
}

impl ItemClass {
    pub const ALL: [ItemClass; 3] = [ItemClass::Weapon, ItemClass::Armor, ItemClass::Consumable];

    pub fn name(&self) -> &'static str {
        match self {
            ItemClass::Weapon => "Weapon",
            ItemClass::Armor => "Armor",
            ItemClass::Consumable => "Consumable",
        }
    }
}

/// Produces items with unique ids
#[derive(Debug, Clone)]
pub struct ItemGenerator {
    next_id: ItemId,
}

impl Default for ItemGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemGenerator {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Continue numbering after previously issued ids (used after loading a save)
    pub fn starting_at(next_id: ItemId) -> Self {
        Self { next_id: next_id.max(1) }
    }

    pub fn next_id(&mut self) -> ItemId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Id the next item will receive
    pub fn peek_id(&self) -> ItemId {
        self.next_id
    }

    /// Generate a random item; unspecified class or quality are rolled uniformly
    pub fn generate(&mut self, class: Option<ItemClass>, quality: Option<Quality>, rng: &mut impl Rng) -> Item {
        let class = class.unwrap_or_else(|| ItemClass::ALL[rng.gen_range(0..ItemClass::ALL.len())]);
        let quality = quality.unwrap_or_else(|| Quality::ALL[rng.gen_range(0..Quality::ALL.len())]);
        let multiplier = quality.multiplier();

        let prefix = if rng.gen_bool(quality.prefix_chance()) {
            quality.prefix_pool().choose(rng).copied()
        } else {
            None
        };
        let material = Material::ALL[rng.gen_range(0..Material::ALL.len())];

        let scaled = |base: i32| (base as f32 * multiplier).floor() as i32;

        let (kind, material) = match class {
            ItemClass::Weapon => {
                let weapon_type = WeaponType::ALL[rng.gen_range(0..WeaponType::ALL.len())];
                let attack_power = scaled(rng.gen_range(5..=15));
                (ItemKind::Weapon { weapon_type, attack_power }, Some(material))
            }
            ItemClass::Armor => {
                let armor_type = ArmorType::ALL[rng.gen_range(0..ArmorType::ALL.len())];
                if armor_type == ArmorType::Hands {
                    let defense = scaled(rng.gen_range(3..=8));
                    let dexterity = rng.gen_range(1..=5);
                    (ItemKind::Gauntlets { defense, dexterity }, Some(material))
                } else {
                    let defense = scaled(rng.gen_range(5..=15));
                    (ItemKind::Armor { armor_type, defense }, Some(material))
                }
            }
            ItemClass::Consumable => {
                let consumable_type = ConsumableType::ALL[rng.gen_range(0..ConsumableType::ALL.len())];
                let effect_value = scaled(rng.gen_range(20..=50));
                (ItemKind::Consumable { consumable_type, effect_value }, None)
            }
        };

        let item = Item {
            id: self.next_id(),
            kind,
            quality,
            material,
            prefix,
        };
        log::debug!("Generated item #{}: {}", item.id, item.display_name());
        item
    }

    /// A fixed item, e.g. starting gear or scripted rewards
    pub fn create(&mut self, kind: ItemKind, quality: Quality, material: Option<Material>) -> Item {
        Item {
            id: self.next_id(),
            kind,
            quality,
            material,
            prefix: None,
        }
    }
}

/// Whether `tag` names something the generator can roll, as opposed to a
/// story item that only quests hand out
pub fn is_generated_tag(tag: &str) -> bool {
    let tag = tag.trim().to_lowercase();
    WeaponType::ALL.iter().any(|w| w.name().to_lowercase() == tag)
        || ArmorType::ALL.iter().any(|a| a.name().to_lowercase() == tag)
        || tag == "gauntlets"
        || ConsumableType::ALL
            .iter()
            .any(|c| format!("{} potion", c.name().to_lowercase()) == tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::Prefix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_tags() {
        assert!(is_generated_tag("health potion"));
        assert!(is_generated_tag("Sword"));
        assert!(is_generated_tag("gauntlets"));
        assert!(!is_generated_tag("dragon scale"));
        assert!(!is_generated_tag("herbs"));
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut gen = ItemGenerator::new();
        let mut rng = StdRng::seed_from_u64(5);
        let a = gen.generate(None, None, &mut rng);
        let b = gen.generate(None, None, &mut rng);
        assert!(b.id > a.id);
    }

    #[test]
    fn test_weapon_attack_range_scales_with_quality() {
        let mut gen = ItemGenerator::new();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let item = gen.generate(Some(ItemClass::Weapon), Some(Quality::Legendary), &mut rng);
            match item.kind {
                ItemKind::Weapon { attack_power, .. } => assert!((10..=30).contains(&attack_power)),
                other => panic!("expected weapon, got {:?}", other),
            }
            assert!(item.material.is_some());
        }
    }

    #[test]
    fn test_consumables_have_no_material() {
        let mut gen = ItemGenerator::new();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let item = gen.generate(Some(ItemClass::Consumable), Some(Quality::Polished), &mut rng);
            assert!(item.material.is_none());
            match item.kind {
                ItemKind::Consumable { effect_value, .. } => assert!((24..=60).contains(&effect_value)),
                other => panic!("expected consumable, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_armor_hands_become_gauntlets() {
        let mut gen = ItemGenerator::new();
        let mut rng = StdRng::seed_from_u64(9);
        let mut saw_gauntlets = false;
        for _ in 0..200 {
            let item = gen.generate(Some(ItemClass::Armor), Some(Quality::Standard), &mut rng);
            match item.kind {
                ItemKind::Gauntlets { defense, dexterity } => {
                    saw_gauntlets = true;
                    assert!((3..=8).contains(&defense));
                    assert!((1..=5).contains(&dexterity));
                }
                ItemKind::Armor { armor_type, .. } => assert_ne!(armor_type, ArmorType::Hands),
                other => panic!("expected armor, got {:?}", other),
            }
        }
        assert!(saw_gauntlets);
    }

    #[test]
    fn test_prefix_pool_matches_quality() {
        let mut gen = ItemGenerator::new();
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..300 {
            let item = gen.generate(None, Some(Quality::Legendary), &mut rng);
            if let Some(prefix) = item.prefix {
                assert!(Prefix::RARE.contains(&prefix));
            }
        }
    }
}
