//! Player entity creation

use hecs::{Entity, World};

use crate::ecs::{
    Animation, Combat, EquipmentComponent, Experience, Health, InventoryComponent, Mana, Name, Player,
    Position, Renderable, Stamina,
};
use crate::items::{
    ConsumableType, Equipment, Inventory, ItemGenerator, ItemKind, Material, Quality, WeaponType,
};

pub const PLAYER_MAX_HEALTH: i32 = 100;
pub const PLAYER_BASE_ATTACK: i32 = 5;
pub const PLAYER_BASE_DEFENSE: i32 = 0;

/// Spawn the player entity with starting gear
pub fn spawn_player(world: &mut World, pos: Position, items: &mut ItemGenerator, inventory_capacity: usize) -> Entity {
    let mut inventory = Inventory::new(inventory_capacity);
    for _ in 0..2 {
        let potion = items.create(
            ItemKind::Consumable { consumable_type: ConsumableType::Health, effect_value: 30 },
            Quality::Standard,
            None,
        );
        if inventory.add_item(potion).is_err() {
            log::warn!("No room for starting potion");
        }
    }

    let mut equipment = Equipment::new();
    let sword = items.create(
        ItemKind::Weapon { weapon_type: WeaponType::Sword, attack_power: 5 },
        Quality::Standard,
        Some(Material::Iron),
    );
    if equipment.equip(sword).is_err() {
        log::warn!("Starting sword could not be equipped");
    }

    // hecs tuples are capped, so the rest goes in with insert
    let entity = world.spawn((
        Player,
        Name::new("Hero"),
        pos,
        Renderable::new('@', (255, 255, 200)).with_order(100),
        Health::new(PLAYER_MAX_HEALTH),
        Mana::new(50),
        Stamina::new(50),
        Combat::new(PLAYER_BASE_ATTACK, PLAYER_BASE_DEFENSE),
        Experience::new(),
        Animation::new(),
    ));

    let _ = world.insert(
        entity,
        (
            InventoryComponent { inventory },
            EquipmentComponent { equipment },
        ),
    );

    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::EquipSlot;

    #[test]
    fn test_player_starting_kit() {
        let mut world = World::new();
        let mut items = ItemGenerator::new();
        let player = spawn_player(&mut world, Position::new(3, 3), &mut items, 40);

        let inv = world.get::<&InventoryComponent>(player).unwrap();
        assert_eq!(inv.inventory.capacity(), 40);
        assert_eq!(inv.inventory.count(), 2);

        let eq = world.get::<&EquipmentComponent>(player).unwrap();
        let weapon = eq.equipment.get(EquipSlot::Weapon).unwrap();
        assert_eq!(weapon.display_name(), "Iron Sword");

        assert_eq!(world.get::<&Health>(player).unwrap().max, 100);
        assert_eq!(world.get::<&Combat>(player).unwrap().attack, 5);
    }
}
