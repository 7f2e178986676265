//! Player actions
//!
//! Everything the player can do to the world: walking, fighting, items,
//! conversations and quest bookkeeping. Each action reports back through
//! the message log.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::state::{Game, GameState, MessageCategory, SIGHT_RADIUS};
use crate::dialog::{DialogEffect, DialogSession, DialogStep};
use crate::ecs::{
    Animation, AnimationState, Combat, Direction, EquipmentComponent, Experience, GroundItem, Health,
    InventoryComponent, Mana, Monster, Name, Position, Renderable, Stamina, XpReward,
};
use crate::entities::{npc_at, npc_in_range, split_slime, Npc};
use crate::items::{
    is_generated_tag, ConsumableType, EquipError, EquipSlot, InventoryError, Item, ItemClass, ItemGenerator,
    ItemKind, Quality,
};
use crate::progression::apply_level_ups;
use crate::quests::{
    ObjectiveKind, Quest, QuestChain, QuestError, QuestEvent, QuestId, QuestStatus, QuestType, RewardTarget,
};
use crate::world::QuestLocation;

/// Chance a slain monster drops a random item
const LOOT_CHANCE: f64 = 0.25;
/// Chance, per unfinished collect objective, that a slain monster drops
/// the story item it asks for
const QUEST_LOOT_CHANCE: f64 = 0.35;
/// Radius of locations placed for generated explore objectives
const GENERATED_LOCATION_RADIUS: i32 = 3;

/// What a movement key did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Blocked,
    Attacked,
    Talked,
}

/// Quest rewards paid into the player's components
pub struct PlayerRewards<'a> {
    world: &'a mut World,
    player: Entity,
    items: &'a mut ItemGenerator,
    messages: Vec<String>,
    levels_gained: u32,
}

impl<'a> PlayerRewards<'a> {
    pub fn new(world: &'a mut World, player: Entity, items: &'a mut ItemGenerator) -> Self {
        Self { world, player, items, messages: Vec::new(), levels_gained: 0 }
    }

    /// Messages to show and levels gained while granting
    pub fn finish(self) -> (Vec<String>, u32) {
        (self.messages, self.levels_gained)
    }
}

impl RewardTarget for PlayerRewards<'_> {
    fn add_gold(&mut self, amount: u32) {
        if let Ok(mut inv) = self.world.get::<&mut InventoryComponent>(self.player) {
            inv.inventory.add_gold(amount);
            self.messages.push(format!("Received {} gold", amount));
        }
    }

    fn add_experience(&mut self, amount: u32) {
        let levels = match self.world.get::<&mut Experience>(self.player) {
            Ok(mut exp) => exp.add_xp(amount),
            Err(_) => return,
        };
        self.messages.push(format!("Gained {} experience", amount));
        if levels > 0 {
            if let Ok(mut health) = self.world.get::<&mut Health>(self.player) {
                apply_level_ups(&mut health, levels);
            }
            self.levels_gained += levels;
        }
    }

    fn add_item(&mut self, mut item: Item) -> bool {
        // Reward templates are shared, so every copy gets its own id
        item.id = self.items.next_id();
        let name = item.display_name();
        let Ok(mut inv) = self.world.get::<&mut InventoryComponent>(self.player) else {
            return false;
        };
        match inv.inventory.add_item(item) {
            Ok(_) => {
                self.messages.push(format!("Received {}", name));
                true
            }
            Err(_) => false,
        }
    }

    fn free_slots(&self) -> usize {
        self.world
            .get::<&InventoryComponent>(self.player)
            .map(|inv| inv.inventory.free_slots())
            .unwrap_or(0)
    }
}

impl Game {
    // ------------------------------------------------------------------
    // Movement
    // ------------------------------------------------------------------

    /// Step one tile. Monsters in the way are attacked and NPCs are
    /// talked to instead.
    pub fn try_move_player(&mut self, dx: i32, dy: i32) -> MoveOutcome {
        if self.state != GameState::Playing || self.panels.is_modal() {
            return MoveOutcome::Blocked;
        }
        let (Some(player), Some(pos)) = (self.player_entity, self.player_position()) else {
            return MoveOutcome::Blocked;
        };
        if let Ok(mut anim) = self.world.get::<&mut Animation>(player) {
            anim.facing = Direction::from_delta(dx, dy);
        }

        let target = pos.offset(dx, dy);
        if let Some(monster) = self.monster_at(target) {
            self.attack_monster(monster);
            return MoveOutcome::Attacked;
        }
        if let Some(npc) = npc_at(&self.world, target) {
            self.start_dialog_with(npc);
            return MoveOutcome::Talked;
        }
        if !self.map.is_walkable(target.x, target.y) {
            return MoveOutcome::Blocked;
        }

        if let Ok(mut p) = self.world.get::<&mut Position>(player) {
            *p = target;
        }
        if let Ok(mut anim) = self.world.get::<&mut Animation>(player) {
            anim.set_state(AnimationState::Walking);
        }
        self.map.reveal_around(target, SIGHT_RADIUS);
        self.check_location(target);
        self.pick_up_items(target);
        MoveOutcome::Moved
    }

    fn monster_at(&self, pos: Position) -> Option<Entity> {
        self.world
            .query::<(&Position, &Monster)>()
            .iter()
            .find(|(_, (p, _))| **p == pos)
            .map(|(e, _)| e)
    }

    /// Discover the location underfoot when the player walks into it
    fn check_location(&mut self, pos: Position) {
        let here = self
            .locations
            .location_at(pos)
            .map(|l| (l.location_id.clone(), l.area_name.clone(), l.description.clone()));
        let here_id = here.as_ref().map(|(id, _, _)| id.clone());
        if here_id == self.current_location {
            return;
        }
        self.current_location = here_id;
        let Some((id, area, description)) = here else {
            return;
        };

        if self.locations.discover(&id) {
            self.add_message(format!("Discovered {}", area), MessageCategory::Lore);
            if !description.is_empty() {
                self.add_message(description, MessageCategory::Lore);
            }
        }
        self.emit_event(QuestEvent::explore(id));
    }

    fn pick_up_items(&mut self, pos: Position) {
        let Some(player) = self.player_entity else {
            return;
        };
        let here: Vec<Entity> = self
            .world
            .query::<(&Position, &GroundItem)>()
            .iter()
            .filter(|(_, (p, _))| **p == pos)
            .map(|(e, _)| e)
            .collect();

        for entity in here {
            let Ok(ground) = self.world.remove_one::<GroundItem>(entity) else {
                continue;
            };
            let item = ground.item;
            let (name, tag) = (item.display_name(), item.quest_tag());
            let stored = match self.world.get::<&mut InventoryComponent>(player) {
                Ok(mut inv) => inv.inventory.add_item(item),
                Err(_) => Err(item),
            };
            match stored {
                Ok(_) => {
                    let _ = self.world.despawn(entity);
                    self.add_message(format!("Picked up {}", name), MessageCategory::Item);
                    self.emit_event(QuestEvent::collect(tag, 1));
                }
                Err(item) => {
                    let _ = self.world.insert_one(entity, GroundItem { item });
                    self.add_message(format!("No room for {}", name), MessageCategory::Warning);
                }
            }
        }
    }

    /// Leave an item lying on a tile
    pub(super) fn drop_on_ground(&mut self, pos: Position, item: Item) -> Entity {
        let renderable = Renderable::new(item.glyph(), item.quality.color()).with_order(10);
        self.world.spawn((pos, renderable, Name::new(item.display_name()), GroundItem { item }))
    }

    // ------------------------------------------------------------------
    // Combat
    // ------------------------------------------------------------------

    /// Hit a monster with the player's weapon
    pub fn attack_monster(&mut self, target: Entity) {
        let Some(player) = self.player_entity else {
            return;
        };
        let armor = self.world.get::<&Combat>(target).map_or(0, |c| c.defense);
        let damage = (self.player_attack() - armor).max(1);
        let (dealt, dead) = match self.world.get::<&mut Health>(target) {
            Ok(mut health) => (health.take_damage(damage), health.is_dead()),
            Err(_) => return,
        };
        let name = self.world.get::<&Name>(target).map_or_else(|_| "monster".to_string(), |n| n.0.clone());

        if let Ok(mut anim) = self.world.get::<&mut Animation>(player) {
            anim.set_state(AnimationState::Attacking);
        }
        if let Ok(mut anim) = self.world.get::<&mut Animation>(target) {
            anim.set_state(AnimationState::Hurt);
        }
        self.add_message(format!("You hit the {} for {} damage", name, dealt), MessageCategory::Combat);

        if dead {
            self.kill_monster(target, name);
        }
    }

    fn kill_monster(&mut self, entity: Entity, name: String) {
        let Ok(monster) = self.world.get::<&Monster>(entity).map(|m| *m) else {
            return;
        };
        let pos = self.world.get::<&Position>(entity).map(|p| *p).ok();
        let xp = self.world.get::<&XpReward>(entity).map_or(0, |r| r.0);
        let _ = self.world.despawn(entity);
        log::debug!("{} died", monster.kind.id());

        self.add_message(format!("The {} dies (+{} XP)", name, xp), MessageCategory::Combat);
        self.grant_experience(xp);

        let mut updated: Vec<QuestId> = Vec::new();
        for tag in monster.kind.quest_tags() {
            for id in self.quests.process_event(&QuestEvent::kill(tag)) {
                if !updated.contains(&id) {
                    updated.push(id);
                }
            }
        }
        self.report_progress(&updated);

        let Some(pos) = pos else {
            return;
        };
        if self.rng.gen_bool(LOOT_CHANCE) {
            let item = self.items.generate(None, None, &mut self.rng);
            self.add_message(format!("The {} dropped {}", name, item.display_name()), MessageCategory::Item);
            self.drop_on_ground(pos, item);
        }
        self.drop_quest_loot(pos);

        if monster.kind.splits_on_death() {
            let template = self.data.monsters.get(monster.kind);
            let children = split_slime(&mut self.world, &self.map, &template, pos, monster.size, &mut self.rng);
            if !children.is_empty() {
                self.add_message(format!("The {} splits apart!", name), MessageCategory::Combat);
            }
        }
    }

    /// Story items that collect objectives wait for come from monsters
    fn drop_quest_loot(&mut self, pos: Position) {
        let mut wanted: Vec<String> = self
            .quests
            .active_quests()
            .filter(|q| q.status == QuestStatus::InProgress)
            .flat_map(|q| q.objectives.iter())
            .filter(|o| !o.completed)
            .filter_map(|o| match &o.kind {
                ObjectiveKind::Collect { item_type, .. } if !is_generated_tag(item_type) => Some(item_type.clone()),
                _ => None,
            })
            .collect();
        wanted.sort();
        wanted.dedup();

        for tag in wanted {
            if !self.rng.gen_bool(QUEST_LOOT_CHANCE) {
                continue;
            }
            let item = self.items.create(ItemKind::Quest { tag }, Quality::Standard, None);
            self.add_message(format!("Something glints on the ground: {}", item.display_name()), MessageCategory::Item);
            self.drop_on_ground(pos, item);
        }
    }

    /// Award XP and handle level-ups. Returns levels gained.
    pub fn grant_experience(&mut self, amount: u32) -> u32 {
        let Some(player) = self.player_entity else {
            return 0;
        };
        let levels = match self.world.get::<&mut Experience>(player) {
            Ok(mut exp) => exp.add_xp(amount),
            Err(_) => return 0,
        };
        if levels > 0 {
            if let Ok(mut health) = self.world.get::<&mut Health>(player) {
                apply_level_ups(&mut health, levels);
            }
            self.on_level_up();
        }
        levels
    }

    fn on_level_up(&mut self) {
        let level = self.player_level();
        log::info!("Player reached level {}", level);
        self.add_message(format!("Level up! You are now level {}", level), MessageCategory::System);
        let started = self.story.start_unlocked(&mut self.quests, level);
        self.on_quests_started(&started);
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    /// Wear the item in an inventory slot. Whatever was worn before takes
    /// its place in the same slot.
    pub fn equip_from_inventory(&mut self, index: usize) -> Result<(), EquipError> {
        let player = self.player_entity.ok_or(EquipError::NoItem(index))?;
        let name = {
            let (inv, eq) = self
                .world
                .query_one_mut::<(&mut InventoryComponent, &mut EquipmentComponent)>(player)
                .map_err(|_| EquipError::NoItem(index))?;
            let item = inv.inventory.get(index).ok_or(EquipError::NoItem(index))?;
            if item.equip_slot().is_none() {
                return Err(EquipError::NotEquippable(item.display_name()));
            }
            let item = inv.inventory.remove_at(index).ok_or(EquipError::NoItem(index))?;
            let name = item.display_name();
            match eq.equipment.equip(item) {
                Ok(Some(previous)) => {
                    if let Err(err) = inv.inventory.set_slot(index, Some(previous)) {
                        log::warn!("Could not return unequipped item: {}", err);
                    }
                }
                Ok(None) => {}
                Err(item) => {
                    let name = item.display_name();
                    let _ = inv.inventory.set_slot(index, Some(item));
                    return Err(EquipError::NotEquippable(name));
                }
            }
            name
        };
        self.add_message(format!("Equipped {}", name), MessageCategory::Item);
        Ok(())
    }

    /// Take off a worn item. Stays equipped if the bag is full.
    pub fn unequip_to_inventory(&mut self, slot: EquipSlot) -> Result<(), EquipError> {
        let player = self.player_entity.ok_or(EquipError::EmptySlot(slot))?;
        let name = {
            let (inv, eq) = self
                .world
                .query_one_mut::<(&mut InventoryComponent, &mut EquipmentComponent)>(player)
                .map_err(|_| EquipError::EmptySlot(slot))?;
            if eq.equipment.is_empty(slot) {
                return Err(EquipError::EmptySlot(slot));
            }
            if inv.inventory.is_full() {
                return Err(EquipError::InventoryFull);
            }
            let item = eq.equipment.unequip(slot).ok_or(EquipError::EmptySlot(slot))?;
            let name = item.display_name();
            if let Err(item) = inv.inventory.add_item(item) {
                let _ = eq.equipment.equip(item);
                return Err(EquipError::InventoryFull);
            }
            name
        };
        self.add_message(format!("Unequipped {}", name), MessageCategory::Item);
        Ok(())
    }

    /// Drink the potion in a slot
    pub fn use_consumable(&mut self, index: usize) -> Result<(), InventoryError> {
        let player = self.player_entity.ok_or(InventoryError::EmptySlot(index))?;
        let (kind, value) = match self.world.get::<&mut InventoryComponent>(player) {
            Ok(mut inv) => inv.inventory.consume_at(index)?,
            Err(_) => return Err(InventoryError::EmptySlot(index)),
        };
        let restored = match kind {
            ConsumableType::Health => self.world.get::<&mut Health>(player).map_or(0, |mut h| h.heal(value)),
            ConsumableType::Mana => self.world.get::<&mut Mana>(player).map_or(0, |mut m| m.restore(value)),
            ConsumableType::Stamina => self.world.get::<&mut Stamina>(player).map_or(0, |mut s| s.restore(value)),
        };
        self.add_message(
            format!("You drink a {} potion and recover {} {}", kind.name().to_lowercase(), restored, kind.name()),
            MessageCategory::Item,
        );
        Ok(())
    }

    /// Put the item in a slot on the ground under the player
    pub fn drop_item(&mut self, index: usize) -> Result<(), InventoryError> {
        let (Some(player), Some(pos)) = (self.player_entity, self.player_position()) else {
            return Err(InventoryError::EmptySlot(index));
        };
        let item = match self.world.get::<&mut InventoryComponent>(player) {
            Ok(mut inv) => {
                let capacity = inv.inventory.capacity();
                if index >= capacity {
                    return Err(InventoryError::SlotOutOfRange { index, capacity });
                }
                inv.inventory.remove_at(index).ok_or(InventoryError::EmptySlot(index))?
            }
            Err(_) => return Err(InventoryError::EmptySlot(index)),
        };
        self.add_message(format!("Dropped {}", item.display_name()), MessageCategory::Item);
        self.drop_on_ground(pos, item);
        Ok(())
    }

    /// Roll an item from the generator panel straight into the bag
    pub fn generate_item(&mut self, class: Option<ItemClass>, quality: Option<Quality>) -> Option<Item> {
        let player = self.player_entity?;
        let full = self
            .world
            .get::<&InventoryComponent>(player)
            .map_or(true, |inv| inv.inventory.is_full());
        if full {
            self.add_message("Inventory is full", MessageCategory::Warning);
            return None;
        }
        let item = self.items.generate(class, quality, &mut self.rng);
        let stored = match self.world.get::<&mut InventoryComponent>(player) {
            Ok(mut inv) => inv.inventory.add_item(item.clone()).is_ok(),
            Err(_) => false,
        };
        if !stored {
            return None;
        }
        self.add_message(format!("Generated {}", item.display_name()), MessageCategory::Item);
        Some(item)
    }

    // ------------------------------------------------------------------
    // Dialog
    // ------------------------------------------------------------------

    /// Talk to the closest NPC in reach
    pub fn talk_to_nearby_npc(&mut self) -> bool {
        let Some(pos) = self.player_position() else {
            return false;
        };
        match npc_in_range(&self.world, pos) {
            Some(npc) => self.start_dialog_with(npc),
            None => {
                self.add_message("There is no one to talk to", MessageCategory::System);
                false
            }
        }
    }

    /// Open a conversation with an NPC. A dialog an active quest is
    /// waiting on wins over the NPC's usual one.
    pub fn start_dialog_with(&mut self, npc_entity: Entity) -> bool {
        let Ok(npc) = self.world.get::<&Npc>(npc_entity).map(|n| (*n).clone()) else {
            return false;
        };
        self.deliver_items_to(&npc.npc_id);

        let dialog_id = self.objective_dialog_for(&npc.npc_id).or(npc.dialog_id.clone());
        match dialog_id {
            Some(id) => self.start_dialog(&id, Some(&npc.npc_id)),
            None => {
                self.add_message(format!("{} has nothing to say", npc.name), MessageCategory::Lore);
                false
            }
        }
    }

    fn objective_dialog_for(&self, npc_id: &str) -> Option<String> {
        self.quests
            .active_quests()
            .filter(|q| q.status == QuestStatus::InProgress)
            .flat_map(|q| q.objectives.iter())
            .filter(|o| !o.completed)
            .find_map(|o| match &o.kind {
                ObjectiveKind::Dialog { dialog_id, npc_id: Some(target), .. }
                    if target == npc_id && self.data.dialogs.get(dialog_id).is_some() =>
                {
                    Some(dialog_id.clone())
                }
                _ => None,
            })
    }

    /// Hand over carried items that deliver objectives want for this NPC
    fn deliver_items_to(&mut self, npc_id: &str) {
        let Some(player) = self.player_entity else {
            return;
        };
        let wanted: Vec<String> = self
            .quests
            .active_quests()
            .flat_map(|q| q.objectives.iter())
            .filter(|o| !o.completed)
            .filter_map(|o| match &o.kind {
                ObjectiveKind::Deliver { item_id, npc_id: to } if to == npc_id => Some(item_id.clone()),
                _ => None,
            })
            .collect();

        for tag in wanted {
            let handed = match self.world.get::<&mut InventoryComponent>(player) {
                Ok(mut inv) => {
                    let found = inv.inventory.items().find(|(_, i)| i.quest_tag() == tag).map(|(_, i)| i.id);
                    found.and_then(|id| inv.inventory.remove_by_id(id))
                }
                Err(_) => None,
            };
            if let Some(item) = handed {
                self.add_message(format!("You hand over {}", item.display_name()), MessageCategory::Quest);
                self.emit_event(QuestEvent::Deliver { item_id: tag, npc_id: npc_id.to_string() });
            }
        }
    }

    /// Open a dialog tree by id
    pub fn start_dialog(&mut self, dialog_id: &str, npc_id: Option<&str>) -> bool {
        let Some(tree) = self.data.dialogs.get(dialog_id).cloned() else {
            log::warn!("Unknown dialog '{}'", dialog_id);
            self.add_message("They have nothing to say", MessageCategory::Warning);
            return false;
        };
        let Some((session, effects)) = DialogSession::start(dialog_id, tree) else {
            return false;
        };
        let session = match npc_id {
            Some(id) => session.with_npc(id),
            None => session,
        };
        log::debug!("Dialog '{}' started", dialog_id);
        self.dialog = Some(session);
        self.panels.open_dialog();
        self.apply_dialog_effects(effects);
        true
    }

    /// Pick a reply in the open dialog
    pub fn choose_dialog_option(&mut self, index: usize) {
        let Some(session) = self.dialog.as_mut() else {
            return;
        };
        let step = session.choose(index);
        self.handle_dialog_step(step);
    }

    /// Continue past a node with no replies
    pub fn advance_dialog(&mut self) {
        let Some(session) = self.dialog.as_mut() else {
            return;
        };
        let step = session.advance();
        self.handle_dialog_step(step);
    }

    /// Walk away from the conversation without finishing it
    pub fn close_dialog(&mut self) {
        if self.dialog.take().is_some() {
            log::debug!("Dialog closed early");
        }
        self.panels.close_dialog();
    }

    fn handle_dialog_step(&mut self, step: DialogStep) {
        match step {
            DialogStep::Continue(effects) => self.apply_dialog_effects(effects),
            DialogStep::Finished { last_node } => self.finish_dialog(&last_node),
            DialogStep::Ignored => {}
        }
    }

    fn apply_dialog_effects(&mut self, effects: Vec<DialogEffect>) {
        for effect in effects {
            match effect {
                DialogEffect::Clue(clue) => {
                    if !self.clues.contains(&clue) {
                        self.add_message(format!("Clue: {}", clue), MessageCategory::Lore);
                        self.clues.push(clue);
                    }
                }
                DialogEffect::Flag(flag) => {
                    let level = self.player_level();
                    match self.story.handle_flag(&flag, &mut self.quests, level) {
                        Ok(started) => self.on_quests_started(&started),
                        Err(err) => log::warn!("{}", err),
                    }
                }
            }
        }
    }

    fn finish_dialog(&mut self, last_node: &str) {
        let Some(session) = self.dialog.take() else {
            return;
        };
        self.panels.close_dialog();
        let Some(player) = self.player_entity else {
            return;
        };

        let level = self.player_level();
        let main_before = self.story.active_quest_id().map(str::to_string);
        let mut rewards = PlayerRewards::new(&mut self.world, player, &mut self.items);
        let updated = self.story.on_dialog_finished(
            session.dialog_id(),
            last_node,
            session.npc_id(),
            &mut self.quests,
            &mut rewards,
            level,
        );
        let (messages, levels) = rewards.finish();
        self.apply_rewards(messages, levels);
        self.report_progress(&updated);

        let main_after = self.story.active_quest_id().map(str::to_string);
        if main_after != main_before {
            if let Some(id) = main_after {
                self.on_quests_started(&[id]);
            }
        }
    }

    // ------------------------------------------------------------------
    // Quests
    // ------------------------------------------------------------------

    /// Feed an event to the quest log and report what moved
    pub(super) fn emit_event(&mut self, event: QuestEvent) -> Vec<QuestId> {
        let updated = self.quests.process_event(&event);
        self.report_progress(&updated);
        updated
    }

    fn report_progress(&mut self, ids: &[QuestId]) {
        for id in ids {
            let Some(quest) = self.quests.get_quest(id) else {
                continue;
            };
            let text = match quest.status {
                QuestStatus::Completed => {
                    format!("Objectives done: {}. Turn it in from the quest log", quest.title)
                }
                QuestStatus::TurnedIn => format!("Quest complete: {}", quest.title),
                _ => format!("Quest updated: {} ({:.0}%)", quest.title, quest.completion_percentage()),
            };
            self.add_message(text, MessageCategory::Quest);
        }
    }

    /// Quests started by the story rather than the player still pick up
    /// items already in the bag
    fn on_quests_started(&mut self, ids: &[QuestId]) {
        for id in ids {
            self.credit_carried_items(id);
            let title = self.quest_title(id);
            self.add_message(format!("New quest: {}", title), MessageCategory::Quest);
        }
    }

    fn apply_rewards(&mut self, messages: Vec<String>, levels: u32) {
        for message in messages {
            self.add_message(message, MessageCategory::Item);
        }
        if levels > 0 {
            self.on_level_up();
        }
    }

    /// Accept an available quest. Items already carried count toward its
    /// collect objectives.
    pub fn start_quest(&mut self, id: &str) -> Result<(), QuestError> {
        let level = self.player_level();
        let ctx = self.story.context(level);
        self.quests.start_quest(id, &ctx)?;
        self.credit_carried_items(id);
        let title = self.quest_title(id);
        self.add_message(format!("Quest started: {}", title), MessageCategory::Quest);
        Ok(())
    }

    pub(super) fn credit_carried_items(&mut self, id: &str) {
        let Some(inventory) = self.inventory() else {
            return;
        };
        let Some(quest) = self.quests.get_quest_mut(id) else {
            return;
        };
        let mut progressed = false;
        for objective in &mut quest.objectives {
            if let ObjectiveKind::Collect { item_type, .. } = &objective.kind {
                let carried = inventory.count_tagged(item_type) as u32;
                if carried > 0 && objective.update_progress(carried) {
                    progressed = true;
                }
            }
        }
        if progressed {
            quest.check_completion();
        }
    }

    /// Turn in a completed quest. Main quests then move the story on.
    pub fn turn_in_quest(&mut self, id: &str) -> Result<(), QuestError> {
        let player = self.player_entity.ok_or_else(|| QuestError::NotCompleted(id.to_string()))?;
        let (quest_type, next) = self
            .quests
            .get_quest(id)
            .map(|q| (q.quest_type, q.next_quest_id.clone()))
            .ok_or_else(|| QuestError::UnknownQuest(id.to_string()))?;

        let mut rewards = PlayerRewards::new(&mut self.world, player, &mut self.items);
        let result = self.quests.complete_quest(id, &mut rewards);
        let (messages, levels) = rewards.finish();
        self.apply_rewards(messages, levels);
        if let Err(err) = result {
            if matches!(err, QuestError::RewardsNotGranted(_)) {
                self.add_message("Make room in your bag for the rewards first", MessageCategory::Warning);
            }
            return Err(err);
        }

        let title = self.quest_title(id);
        self.add_message(format!("Quest complete: {}", title), MessageCategory::Quest);

        let level = self.player_level();
        if quest_type == QuestType::Main {
            if let Some(next) = next {
                if self.story.advance_to(&next, &mut self.quests, level) {
                    self.on_quests_started(&[next]);
                }
            }
        }
        let started = self.story.start_unlocked(&mut self.quests, level);
        self.on_quests_started(&started);
        Ok(())
    }

    /// Add freshly generated quests to the log. Main quests come as a
    /// whole chain. Returns the new ids.
    pub fn generate_quest(&mut self, quest_type: QuestType) -> Vec<QuestId> {
        let ids = if quest_type == QuestType::Main {
            let mut chain_id = format!("chain_{}", self.rng.gen_range(1000..=9999));
            while self.quests.chain(&chain_id).is_some() {
                chain_id = format!("chain_{}", self.rng.gen_range(1000..=9999));
            }
            let quests = self.quest_generator.generate_chain(&chain_id, quest_type, &mut self.items, &mut self.rng);
            let chain = QuestChain {
                name: quests.last().map(|q| q.title.clone()).unwrap_or_default(),
                description: String::new(),
                quests: quests.iter().map(|q| q.id.clone()).collect(),
            };
            let ids = self.add_generated(quests);
            self.quests.add_quest_chain(chain_id, chain);
            ids
        } else {
            let quest = self.quest_generator.generate(quest_type, &mut self.items, &mut self.rng);
            self.add_generated(vec![quest])
        };
        self.ensure_quest_locations();

        if let Some(first) = ids.first() {
            let title = self.quest_title(first);
            self.add_message(
                format!("New {} quest available: {}", quest_type.name().to_lowercase(), title),
                MessageCategory::Quest,
            );
        }
        ids
    }

    fn add_generated(&mut self, quests: Vec<Quest>) -> Vec<QuestId> {
        let mut ids = Vec::new();
        for quest in quests {
            let id = quest.id.clone();
            match self.quests.add_quest(quest) {
                Ok(()) => {
                    self.generated_quests.push(id.clone());
                    ids.push(id);
                }
                Err(err) => log::warn!("Generated quest rejected: {}", err),
            }
        }
        ids
    }

    /// Generated explore objectives name places the map does not have yet.
    /// They are placed from the world seed and the location id, so a
    /// reloaded game puts them in the same spot.
    pub(super) fn ensure_quest_locations(&mut self) {
        let mut missing: Vec<(String, String)> = Vec::new();
        for quest in self.generated_quests.iter().filter_map(|id| self.quests.get_quest(id)) {
            for objective in &quest.objectives {
                if let ObjectiveKind::Explore { location_id, area_name } = &objective.kind {
                    if self.locations.get(location_id).is_none() && !missing.iter().any(|(id, _)| id == location_id) {
                        missing.push((location_id.clone(), area_name.clone()));
                    }
                }
            }
        }

        for (id, area) in missing {
            let mut hasher = DefaultHasher::new();
            id.hash(&mut hasher);
            let mut rng = StdRng::seed_from_u64(self.seed ^ hasher.finish());
            let Some(pos) = self.map.random_walkable(&mut rng, None) else {
                log::warn!("No room for location '{}'", id);
                continue;
            };
            let area = if area.is_empty() { id.replace('_', " ") } else { area };
            let description = format!("You have found the {}.", area);
            self.locations.add(QuestLocation::new(id.clone(), area, pos, GENERATED_LOCATION_RADIUS, description));
            log::debug!("Placed location '{}' at ({}, {})", id, pos.x, pos.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Player;
    use crate::entities::{spawn_monster, MonsterKind};
    use crate::game::state::tests::test_game;
    use crate::items::{ArmorType, Material, WeaponType};
    use crate::quests::{Objective, Reward};

    /// A walkable neighbour of the player with nothing standing on it
    fn open_neighbour(game: &Game) -> (i32, i32) {
        let pos = game.player_position().unwrap();
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let p = pos.offset(dx, dy);
            if game.map().is_walkable(p.x, p.y) && !game.is_occupied(p) {
                return (dx, dy);
            }
        }
        panic!("player is boxed in");
    }

    fn give(game: &mut Game, kind: ItemKind) -> usize {
        let player = game.player().unwrap();
        let item = game.items.create(kind, Quality::Standard, Some(Material::Steel));
        game.world_mut()
            .get::<&mut InventoryComponent>(player)
            .unwrap()
            .inventory
            .add_item(item)
            .unwrap()
    }

    #[test]
    fn test_walk_and_pick_up() {
        let mut game = test_game();
        let (dx, dy) = open_neighbour(&game);
        let target = game.player_position().unwrap().offset(dx, dy);
        let potion = game.items.create(
            ItemKind::Consumable { consumable_type: ConsumableType::Mana, effect_value: 10 },
            Quality::Standard,
            None,
        );
        game.drop_on_ground(target, potion);
        let before = game.inventory().unwrap().count();

        assert_eq!(game.try_move_player(dx, dy), MoveOutcome::Moved);
        assert_eq!(game.player_position(), Some(target));
        assert_eq!(game.inventory().unwrap().count(), before + 1);
        assert_eq!(game.world().query::<&GroundItem>().iter().count(), 0);
    }

    #[test]
    fn test_bumping_a_monster_attacks_it() {
        let mut game = test_game();
        let (dx, dy) = open_neighbour(&game);
        let start = game.player_position().unwrap();
        let target = start.offset(dx, dy);
        let template = game.data().monsters.get(MonsterKind::Wolf);
        let wolf = spawn_monster(game.world_mut(), &template, target);
        let before = game.world().get::<&Health>(wolf).unwrap().current;

        assert_eq!(game.try_move_player(dx, dy), MoveOutcome::Attacked);
        assert_eq!(game.player_position(), Some(start));
        assert!(game.world().get::<&Health>(wolf).unwrap().current < before);
    }

    #[test]
    fn test_kill_grants_xp_and_counts_for_quests() {
        let mut game = test_game();
        game.start_quest("sq_wolf_cull").unwrap();
        let pos = game.player_position().unwrap().offset(3, 3);
        let template = game.data().monsters.get(MonsterKind::Wolf);
        let wolf = spawn_monster(game.world_mut(), &template, pos);
        game.world_mut().get::<&mut Health>(wolf).unwrap().current = 1;

        game.attack_monster(wolf);
        assert!(!game.world().contains(wolf));
        let exp = game.player_experience().unwrap();
        assert_eq!(exp.current_xp, template.xp_reward);

        let quest = game.quests().get_quest("sq_wolf_cull").unwrap();
        assert_eq!(quest.status, QuestStatus::InProgress);
        assert_eq!(quest.objectives[0].current, 1);
    }

    #[test]
    fn test_equip_swaps_into_same_slot() {
        let mut game = test_game();
        let index = give(&mut game, ItemKind::Weapon { weapon_type: WeaponType::Axe, attack_power: 12 });
        let attack_before = game.player_attack();

        game.equip_from_inventory(index).unwrap();
        assert_eq!(game.player_attack(), attack_before + 7);
        // The starting sword lands where the axe was
        let returned = game.inventory().unwrap().get(index).cloned().unwrap();
        assert_eq!(returned.display_name(), "Iron Sword");
    }

    #[test]
    fn test_equip_rejects_potions() {
        let mut game = test_game();
        let err = game.equip_from_inventory(0).unwrap_err();
        assert!(matches!(err, EquipError::NotEquippable(_)));
        assert!(game.inventory().unwrap().get(0).is_some());
    }

    #[test]
    fn test_unequip_fails_when_full() {
        let mut game = test_game();
        let player = game.player().unwrap();
        while !game.inventory().unwrap().is_full() {
            give(&mut game, ItemKind::Armor { armor_type: ArmorType::Head, defense: 1 });
        }
        assert_eq!(game.unequip_to_inventory(EquipSlot::Weapon), Err(EquipError::InventoryFull));
        assert!(game.world().get::<&EquipmentComponent>(player).unwrap().equipment.get(EquipSlot::Weapon).is_some());
    }

    #[test]
    fn test_potion_heals() {
        let mut game = test_game();
        let player = game.player().unwrap();
        game.world_mut().get::<&mut Health>(player).unwrap().current = 50;
        game.use_consumable(0).unwrap();
        assert_eq!(game.player_health().unwrap().current, 80);
        assert!(game.inventory().unwrap().get(0).is_none());
        assert_eq!(game.use_consumable(0), Err(InventoryError::EmptySlot(0)));
    }

    #[test]
    fn test_drop_leaves_item_underfoot() {
        let mut game = test_game();
        game.drop_item(0).unwrap();
        let pos = game.player_position().unwrap();
        let on_ground = game
            .world()
            .query::<(&Position, &GroundItem)>()
            .iter()
            .filter(|(_, (p, _))| **p == pos)
            .count();
        assert_eq!(on_ground, 1);
    }

    #[test]
    fn test_generate_item_stops_when_full() {
        let mut game = test_game();
        let capacity = game.inventory().unwrap().capacity();
        let mut made = 0;
        while game.generate_item(Some(ItemClass::Armor), None).is_some() {
            made += 1;
        }
        assert_eq!(game.inventory().unwrap().count(), capacity);
        assert!(made > 0);
        assert_eq!(game.messages().last().unwrap().text, "Inventory is full");
    }

    #[test]
    fn test_dialog_completes_main_quest_and_advances() {
        let mut game = test_game();
        assert!(game.start_dialog("thorne_report", Some("captain_thorne")));
        assert!(game.panels().dialog);

        // Pick the first reply until the conversation ends
        for _ in 0..20 {
            if game.dialog().is_none() {
                break;
            }
            let has_choices = game
                .dialog()
                .and_then(|d| d.current_node())
                .map_or(false, |n| !n.choices.is_empty());
            if has_choices {
                game.choose_dialog_option(0);
            } else {
                game.advance_dialog();
            }
        }
        assert!(game.dialog().is_none());
        assert!(!game.panels().dialog);
        assert!(game.quests().is_turned_in("mq_01_mysterious_arrival"));
        assert_eq!(game.story().active_quest_id(), Some("mq_02_first_investigation"));
        assert!(game.player_gold() > 0);
    }

    #[test]
    fn test_turn_in_requires_completion() {
        let mut game = test_game();
        let err = game.turn_in_quest("mq_01_mysterious_arrival").unwrap_err();
        assert!(matches!(err, QuestError::NotCompleted(_)));
    }

    #[test]
    fn test_generated_main_quests_form_a_chain() {
        let mut game = test_game();
        let ids = game.generate_quest(QuestType::Main);
        assert_eq!(ids.len(), 3);
        assert_eq!(game.generated_quests().count(), 3);
        let first = game.quests().get_quest(&ids[0]).unwrap();
        assert_eq!(first.next_quest_id.as_deref(), Some(ids[1].as_str()));
        // The first step explores somewhere that now exists on the map
        for objective in &first.objectives {
            if let ObjectiveKind::Explore { location_id, .. } = &objective.kind {
                assert!(game.locations().get(location_id).is_some());
            }
        }
    }

    #[test]
    fn test_quest_loot_only_for_story_items() {
        let mut game = test_game();
        let ids = game.generate_quest(QuestType::Main);
        game.start_quest(&ids[0]).unwrap();
        let pos = game.player_position().unwrap();
        for _ in 0..40 {
            game.drop_quest_loot(pos);
        }
        let tags: Vec<String> = game
            .world()
            .query::<&GroundItem>()
            .iter()
            .map(|(_, g)| g.item.quest_tag())
            .collect();
        assert!(!tags.is_empty());
        assert!(tags.iter().all(|t| t == "dragon scale"));
    }

    #[test]
    fn test_carried_items_count_when_starting() {
        let mut game = test_game();
        // Two starting health potions
        game.start_quest("dq_potion_run").unwrap();
        let quest = game.quests().get_quest("dq_potion_run").unwrap();
        assert_eq!(quest.status, QuestStatus::Completed);
    }

    #[test]
    fn test_turn_in_with_full_bag_pays_nothing() {
        let mut game = test_game();
        let pelt = Item::new(0, ItemKind::Quest { tag: "wolf pelt".into() }, Quality::Standard);
        let quest = Quest::new("sq_bounty", "Bounty", "Bring proof", QuestType::Side)
            .with_objective(Objective::kill("wolf", 1))
            .with_reward(Reward::gold(100))
            .with_reward(Reward::item(pelt));
        game.quests.add_quest(quest).unwrap();
        game.start_quest("sq_bounty").unwrap();
        game.emit_event(QuestEvent::kill("wolf"));
        while !game.inventory().unwrap().is_full() {
            give(&mut game, ItemKind::Armor { armor_type: ArmorType::Feet, defense: 1 });
        }
        let gold = game.player_gold();

        for _ in 0..3 {
            assert!(matches!(game.turn_in_quest("sq_bounty"), Err(QuestError::RewardsNotGranted(_))));
        }
        assert_eq!(game.player_gold(), gold);
        assert_eq!(game.quests().get_quest("sq_bounty").unwrap().status, QuestStatus::Completed);

        game.drop_item(0).unwrap();
        game.turn_in_quest("sq_bounty").unwrap();
        assert_eq!(game.player_gold(), gold + 100);
        assert!(game.quests().is_turned_in("sq_bounty"));
    }

    #[test]
    fn test_flag_started_quests_count_carried_items() {
        let mut game = test_game();
        let mut quest = Quest::new("sq_potion_hoard", "Potion Hoard", "Keep a stock of potions", QuestType::Side)
            .with_objective(Objective::collect("health potion", 2));
        quest.auto_start = true;
        quest.required_flags.insert("k".into(), "v".into());
        game.quests.add_quest(quest).unwrap();

        game.apply_dialog_effects(vec![DialogEffect::Flag("k=v".into())]);
        let quest = game.quests().get_quest("sq_potion_hoard").unwrap();
        assert_eq!(quest.objectives[0].current, 2);
        assert_eq!(quest.status, QuestStatus::Completed);
    }

    #[test]
    fn test_player_is_not_a_monster() {
        let game = test_game();
        let player = game.player().unwrap();
        assert!(game.world().get::<&Player>(player).is_ok());
        assert!(game.monster_at(game.player_position().unwrap()).is_none());
    }
}
