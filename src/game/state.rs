//! Game state
//!
//! The `Game` context owns everything a running session needs: the ECS
//! world, the map, the quest log and story, the open conversation and the
//! message log. It is created once and passed explicitly to the UI.

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::panels::Panels;
use super::settings::GameSettings;
use crate::data::DataManager;
use crate::dialog::{DialogLibrary, DialogSession};
use crate::ecs::{
    execute_ai_actions, run_monster_ai, tick_animations, Animation, AnimationState, BlocksMovement, Combat,
    EquipmentComponent, Experience, Health, InventoryComponent, MonsterAttack, Player, Position,
};
use crate::entities::{
    count_monsters, spawn_initial_monsters, spawn_monster, spawn_npc, spawn_player, MonsterSpawner, SpawnRule,
};
use crate::items::{Equipment, Inventory, Item, ItemGenerator};
use crate::quests::{Quest, QuestGenerator, QuestId, QuestManager, StoryHandler, StorySnapshot};
use crate::save::{EquipmentSave, SaveData, SaveError};
use crate::world::{generate_outdoor, LocationRegistry, Map};

/// Messages kept in the log
pub const MAX_MESSAGES: usize = 100;
/// Tiles revealed around the player
pub const SIGHT_RADIUS: i32 = 8;
/// Spawn points are kept at least this far from the starting tile
const SPAWN_POINT_DISTANCE: i32 = 10;
const SPAWN_POINTS: usize = 6;
/// How far from its configured tile an NPC may be nudged onto open ground
const NPC_PLACEMENT_RADIUS: i32 = 6;

/// All possible game states
#[derive(Debug, Clone, PartialEq)]
pub enum GameState {
    /// Title screen
    MainMenu,
    /// Actively playing
    Playing,
    /// World frozen, nothing open
    Paused,
    /// Player died
    GameOver { cause: String },
    /// Exit the game
    Quit,
}

/// A message to display in the game log
#[derive(Debug, Clone)]
pub struct GameMessage {
    pub text: String,
    pub timestamp: f32,
    pub category: MessageCategory,
}

/// Categories for message colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCategory {
    Combat,
    Item,
    Quest,
    Lore,
    System,
    Warning,
}

impl MessageCategory {
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            MessageCategory::Combat => (255, 120, 100),
            MessageCategory::Item => (120, 200, 255),
            MessageCategory::Quest => (255, 215, 0),
            MessageCategory::Lore => (200, 160, 255),
            MessageCategory::System => (200, 200, 200),
            MessageCategory::Warning => (255, 80, 80),
        }
    }
}

/// The main game struct that holds all game data
pub struct Game {
    pub(crate) state: GameState,
    pub(crate) world: World,
    pub(crate) map: Map,
    pub(crate) rng: StdRng,
    /// Seed the current map was generated from
    pub(crate) seed: u64,
    pub(crate) settings: GameSettings,
    /// Content: monsters, quests, dialogs, NPC placements
    pub(crate) data: DataManager,
    pub(crate) quests: QuestManager,
    pub(crate) story: StoryHandler,
    pub(crate) quest_generator: QuestGenerator,
    /// Ids of quests made by the generator; saved in full
    pub(crate) generated_quests: Vec<QuestId>,
    pub(crate) dialog: Option<DialogSession>,
    pub(crate) panels: Panels,
    pub(crate) messages: Vec<GameMessage>,
    /// Clues gathered from conversations, in order
    pub(crate) clues: Vec<String>,
    pub(crate) items: ItemGenerator,
    pub(crate) spawner: MonsterSpawner,
    pub(crate) locations: LocationRegistry,
    /// Location the player is standing in, for enter detection
    pub(crate) current_location: Option<String>,
    pub(crate) player_entity: Option<Entity>,
    /// Name of whatever last hurt the player
    pub(crate) last_attacker: Option<String>,
    pub(crate) elapsed: f32,
}

impl Game {
    /// Create a game at the main menu. Nothing is generated until
    /// `start_new_game` or `restore_from_save`.
    pub fn new(settings: GameSettings, data: DataManager) -> Self {
        Self {
            state: GameState::MainMenu,
            world: World::new(),
            map: Map::new(settings.map_width, settings.map_height),
            rng: StdRng::from_entropy(),
            seed: 0,
            settings,
            data,
            quests: QuestManager::new(),
            story: StoryHandler::new(),
            quest_generator: QuestGenerator::new(),
            generated_quests: Vec::new(),
            dialog: None,
            panels: Panels::new(),
            messages: Vec::new(),
            clues: Vec::new(),
            items: ItemGenerator::new(),
            spawner: MonsterSpawner::new(),
            locations: LocationRegistry::new(),
            current_location: None,
            player_entity: None,
            last_attacker: None,
            elapsed: 0.0,
        }
    }

    /// Seed for a new game: `TILEQUEST_SEED` if set, else random
    pub fn pick_seed() -> u64 {
        GameSettings::seed_from_env().unwrap_or_else(|| rand::thread_rng().gen())
    }

    /// Generate a fresh world and start the main story
    pub fn start_new_game(&mut self, seed: u64) {
        log::info!("Starting new game with seed {}", seed);
        self.build_world(seed);
        self.reset_session();

        let level = self.player_level();
        match self.story.start_initial_quest(&mut self.quests, level) {
            Ok(id) => {
                self.credit_carried_items(&id);
                let title = self.quest_title(&id);
                self.add_message(format!("New quest: {}", title), MessageCategory::Quest);
            }
            Err(err) => log::warn!("No main story to start: {}", err),
        }
        self.add_message("You wake at the edge of a quiet village.", MessageCategory::System);
        self.set_state(GameState::Playing);
    }

    fn reset_session(&mut self) {
        self.story = StoryHandler::new();
        self.dialog = None;
        self.panels.close_all();
        self.messages.clear();
        self.clues.clear();
        self.current_location = None;
        self.last_attacker = None;
        self.elapsed = 0.0;
    }

    /// Map, content, NPCs, player and monsters for a seed
    fn build_world(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
        self.world = World::new();
        self.items = ItemGenerator::new();
        self.map = generate_outdoor(self.settings.map_width, self.settings.map_height, &mut self.rng);

        self.quests = QuestManager::new();
        self.locations = LocationRegistry::new();
        self.generated_quests.clear();
        self.data.quests.clone().install(&mut self.quests, &mut self.locations);

        self.place_npcs();

        let start = self
            .map
            .spawn_position(&mut self.rng)
            .unwrap_or_else(|| Position::new(self.map.width / 2, self.map.height / 2));
        let player = spawn_player(&mut self.world, start, &mut self.items, self.settings.inventory_capacity);
        self.player_entity = Some(player);
        self.map.reveal_around(start, SIGHT_RADIUS);

        self.setup_spawner(start);
        spawn_initial_monsters(
            &mut self.world,
            &self.map,
            &self.data.monsters,
            self.settings.initial_monsters,
            start,
            &mut self.rng,
        );
    }

    /// NPCs go on the nearest open tile to where the content puts them
    fn place_npcs(&mut self) {
        for def in self.data.npcs.clone() {
            let wanted = Position::new(def.x, def.y);
            match self.open_tile_near(wanted, NPC_PLACEMENT_RADIUS) {
                Some(pos) => {
                    log::debug!("Placed NPC '{}' at ({}, {})", def.npc.npc_id, pos.x, pos.y);
                    spawn_npc(&mut self.world, def.npc, pos);
                }
                None => log::warn!("No room for NPC '{}' near ({}, {})", def.npc.npc_id, def.x, def.y),
            }
        }
    }

    fn open_tile_near(&self, center: Position, max_radius: i32) -> Option<Position> {
        for radius in 0..=max_radius {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs().max(dy.abs()) != radius {
                        continue;
                    }
                    let pos = center.offset(dx, dy);
                    if self.map.is_walkable(pos.x, pos.y) && !self.is_occupied(pos) {
                        return Some(pos);
                    }
                }
            }
        }
        None
    }

    fn setup_spawner(&mut self, start: Position) {
        self.spawner = MonsterSpawner::new();
        for _ in 0..SPAWN_POINTS {
            if let Some(pos) = self.map.random_walkable(&mut self.rng, Some((start, SPAWN_POINT_DISTANCE))) {
                self.spawner.add_spawn_point(pos);
            }
        }
        // Rules are picked uniformly, so the weight shows up as the spawn chance
        let max_weight = self
            .data
            .monsters
            .templates
            .iter()
            .map(|t| t.spawn_weight)
            .fold(0.0_f32, f32::max);
        if max_weight <= 0.0 {
            return;
        }
        for template in &self.data.monsters.templates {
            if template.spawn_weight <= 0.0 {
                continue;
            }
            let rule = SpawnRule { kind: template.kind, spawn_chance: (template.spawn_weight / max_weight) as f64 };
            self.spawner.register_template(template.kind.id(), rule);
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn set_state(&mut self, state: GameState) {
        log::debug!("State transition: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut GameSettings {
        &mut self.settings
    }

    pub fn data(&self) -> &DataManager {
        &self.data
    }

    pub fn dialogs(&self) -> &DialogLibrary {
        &self.data.dialogs
    }

    pub fn quests(&self) -> &QuestManager {
        &self.quests
    }

    pub fn story(&self) -> &StoryHandler {
        &self.story
    }

    /// Quests made by the generator this session
    pub fn generated_quests(&self) -> impl Iterator<Item = &Quest> {
        self.generated_quests.iter().filter_map(|id| self.quests.get_quest(id))
    }

    pub fn dialog(&self) -> Option<&DialogSession> {
        self.dialog.as_ref()
    }

    pub fn panels(&self) -> &Panels {
        &self.panels
    }

    pub fn panels_mut(&mut self) -> &mut Panels {
        &mut self.panels
    }

    pub fn locations(&self) -> &LocationRegistry {
        &self.locations
    }

    pub fn clues(&self) -> &[String] {
        &self.clues
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Id the next created item will get
    pub fn next_item_id(&self) -> u64 {
        self.items.peek_id()
    }

    pub fn player(&self) -> Option<Entity> {
        self.player_entity
    }

    pub fn player_position(&self) -> Option<Position> {
        self.player_entity.and_then(|e| self.world.get::<&Position>(e).ok().map(|p| *p))
    }

    pub fn player_health(&self) -> Option<Health> {
        self.player_entity.and_then(|e| self.world.get::<&Health>(e).ok().map(|h| *h))
    }

    pub fn player_experience(&self) -> Option<Experience> {
        self.player_entity.and_then(|e| self.world.get::<&Experience>(e).ok().map(|x| *x))
    }

    pub fn player_level(&self) -> u32 {
        self.player_experience().map_or(1, |x| x.level)
    }

    pub fn player_gold(&self) -> u32 {
        self.player_entity
            .and_then(|e| self.world.get::<&InventoryComponent>(e).ok().map(|i| i.inventory.gold()))
            .unwrap_or(0)
    }

    /// Base attack plus equipment
    pub fn player_attack(&self) -> i32 {
        let Some(player) = self.player_entity else {
            return 0;
        };
        let base = self.world.get::<&Combat>(player).map_or(0, |c| c.attack);
        let gear = self.world.get::<&EquipmentComponent>(player).map_or(0, |e| e.equipment.total_attack());
        base + gear
    }

    /// Base defense plus equipment
    pub fn player_defense(&self) -> i32 {
        let Some(player) = self.player_entity else {
            return 0;
        };
        let base = self.world.get::<&Combat>(player).map_or(0, |c| c.defense);
        let gear = self.world.get::<&EquipmentComponent>(player).map_or(0, |e| e.equipment.total_defense());
        base + gear
    }

    /// Clone of the player's bag
    pub fn inventory(&self) -> Option<Inventory> {
        self.player_entity
            .and_then(|e| self.world.get::<&InventoryComponent>(e).ok().map(|i| i.inventory.clone()))
    }

    /// Clone of the player's worn gear
    pub fn equipment(&self) -> Option<Equipment> {
        self.player_entity
            .and_then(|e| self.world.get::<&EquipmentComponent>(e).ok().map(|eq| eq.equipment.clone()))
    }

    pub(super) fn quest_title(&self, id: &str) -> String {
        self.quests.get_quest(id).map_or_else(|| id.to_string(), |q| q.title.clone())
    }

    /// Anything that blocks movement on a tile, the player included
    pub fn is_occupied(&self, pos: Position) -> bool {
        let blocked = self
            .world
            .query::<(&Position, &BlocksMovement)>()
            .iter()
            .any(|(_, (p, _))| *p == pos);
        blocked || self.world.query::<(&Position, &Player)>().iter().any(|(_, (p, _))| *p == pos)
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    pub fn messages(&self) -> &[GameMessage] {
        &self.messages
    }

    /// Add a message to the log
    pub fn add_message(&mut self, text: impl Into<String>, category: MessageCategory) {
        self.messages.push(GameMessage { text: text.into(), timestamp: self.elapsed, category });

        if self.messages.len() > MAX_MESSAGES {
            self.messages.remove(0);
        }
    }

    // ------------------------------------------------------------------
    // Frame update
    // ------------------------------------------------------------------

    /// Advance the world by one frame. Frozen outside `Playing` and while
    /// a modal panel is open.
    pub fn update(&mut self, dt: f32) {
        if self.state != GameState::Playing || self.panels.is_modal() {
            return;
        }
        self.elapsed += dt;

        let Some(player_pos) = self.player_position() else {
            return;
        };

        let actions = run_monster_ai(
            &mut self.world,
            &self.map,
            player_pos,
            dt,
            self.settings.monster_speed_multiplier,
            &mut self.rng,
        );
        for attack in execute_ai_actions(&mut self.world, &self.map, actions) {
            self.resolve_monster_attack(attack);
        }

        self.update_spawner(dt);

        for id in self.quests.tick(dt) {
            let title = self.quest_title(&id);
            self.add_message(format!("Quest failed: {} (out of time)", title), MessageCategory::Warning);
        }

        tick_animations(&mut self.world, dt);

        if self.player_health().map_or(false, |h| h.is_dead()) {
            let cause = match self.last_attacker.take() {
                Some(name) => format!("slain by a {}", name),
                None => "slain".to_string(),
            };
            self.player_died(cause);
        }
    }

    /// Monster damage is reduced by the player's defense, but always lands
    fn resolve_monster_attack(&mut self, attack: MonsterAttack) {
        let Some(player) = self.player_entity else {
            return;
        };
        let damage = (attack.damage - self.player_defense()).max(1);
        let dealt = match self.world.get::<&mut Health>(player) {
            Ok(mut health) => health.take_damage(damage),
            Err(_) => return,
        };
        if let Ok(mut anim) = self.world.get::<&mut Animation>(player) {
            anim.set_state(AnimationState::Hurt);
        }
        self.last_attacker = Some(attack.name.clone());
        self.add_message(format!("{} hits you for {} damage", attack.name, dealt), MessageCategory::Combat);
    }

    fn update_spawner(&mut self, dt: f32) {
        let active = count_monsters(&self.world);
        let Some(request) = self.spawner.update(dt, active, &mut self.rng) else {
            return;
        };
        if self.is_occupied(request.position) || !self.map.is_walkable(request.position.x, request.position.y) {
            log::debug!("Spawn point ({}, {}) is blocked", request.position.x, request.position.y);
            return;
        }
        let template = self.data.monsters.get(request.kind);
        spawn_monster(&mut self.world, &template, request.position);
        log::debug!("Spawned {} at ({}, {})", request.kind.id(), request.position.x, request.position.y);
    }

    /// Handle player death
    pub fn player_died(&mut self, cause: impl Into<String>) {
        let cause = cause.into();
        log::info!("Player died: {}", cause);
        self.dialog = None;
        self.panels.close_all();
        self.set_state(GameState::GameOver { cause });
    }

    /// Freeze or unfreeze the world
    pub fn toggle_pause(&mut self) {
        match self.state {
            GameState::Playing => self.set_state(GameState::Paused),
            GameState::Paused => self.set_state(GameState::Playing),
            _ => {}
        }
    }

    /// Request to quit the game
    pub fn quit(&mut self) {
        self.set_state(GameState::Quit);
    }

    // ------------------------------------------------------------------
    // Save / load
    // ------------------------------------------------------------------

    /// Rebuild the world from the saved seed, then put the player, their
    /// gear and the quest log back
    pub fn restore_from_save(&mut self, save: SaveData) -> Result<(), SaveError> {
        // Validate before the running session is torn down
        let saved = save.player;
        if saved.health.1 <= 0 || saved.health.0 > saved.health.1 {
            return Err(SaveError::InvalidData(format!(
                "Player health {}/{} is out of range",
                saved.health.0, saved.health.1
            )));
        }
        let (inventory, equipment) = restore_gear(
            saved.inventory,
            saved.gold,
            saved.equipment,
            self.settings.inventory_capacity,
        )?;

        self.build_world(save.map_seed);
        self.reset_session();

        let player = self
            .player_entity
            .ok_or_else(|| SaveError::InvalidData("No player entity".to_string()))?;

        // Player
        let pos = Position::new(saved.position.0, saved.position.1);
        if self.map.is_walkable(pos.x, pos.y) {
            if let Ok(mut p) = self.world.get::<&mut Position>(player) {
                *p = pos;
            }
            self.map.reveal_around(pos, SIGHT_RADIUS);
        } else {
            log::warn!("Saved position ({}, {}) is blocked, keeping spawn", pos.x, pos.y);
        }
        if let Ok(mut health) = self.world.get::<&mut Health>(player) {
            *health = Health { current: saved.health.0, max: saved.health.1 };
        }
        if let Ok(mut exp) = self.world.get::<&mut Experience>(player) {
            *exp = saved.experience;
        }

        let max_id = inventory
            .items()
            .map(|(_, i)| i.id)
            .chain(equipment.iter().filter_map(|(_, i)| i.map(|i| i.id)))
            .chain(save.items_on_ground.iter().map(|g| g.item.id))
            .max()
            .unwrap_or(0);
        self.items = ItemGenerator::starting_at(max_id + 1);
        for ground in save.items_on_ground {
            self.drop_on_ground(Position::new(ground.position.0, ground.position.1), ground.item);
        }

        self.world
            .insert(player, (InventoryComponent { inventory }, EquipmentComponent { equipment }))
            .map_err(|_| SaveError::InvalidData("Player entity vanished".to_string()))?;

        // Quests
        let log = save.quests;
        for quest in log.generated {
            let id = quest.id.clone();
            match self.quests.add_quest(quest) {
                Ok(()) => self.generated_quests.push(id),
                Err(err) => log::warn!("Skipping saved generated quest: {}", err),
            }
        }
        self.ensure_quest_locations();
        for progress in &log.quests {
            if !self
                .quests
                .restore_progress(&progress.id, progress.status, &progress.objective_progress, progress.elapsed)
            {
                log::warn!("Unknown quest '{}' in save, skipping", progress.id);
            }
        }
        self.story.restore(StorySnapshot {
            story_flags: log.story_flags,
            active_quest_id: log.active_main_quest,
        });
        self.clues = log.clues;
        for id in &log.discovered_locations {
            self.locations.discover(id);
        }
        self.current_location = self
            .player_position()
            .and_then(|p| self.locations.location_at(p))
            .map(|l| l.location_id.clone());

        self.add_message("Game loaded.", MessageCategory::System);
        self.set_state(GameState::Playing);
        Ok(())
    }
}

/// Inventory with its slot positions kept, and equipment routed through
/// the equip rules
fn restore_gear(
    slots: Vec<Option<Item>>,
    gold: u32,
    worn: EquipmentSave,
    min_capacity: usize,
) -> Result<(Inventory, Equipment), SaveError> {
    let mut inventory = Inventory::new(slots.len().max(min_capacity));
    for (index, slot) in slots.into_iter().enumerate() {
        if slot.is_some() {
            inventory
                .set_slot(index, slot)
                .map_err(|e| SaveError::InvalidData(e.to_string()))?;
        }
    }
    inventory.add_gold(gold);

    let mut equipment = Equipment::new();
    for item in worn.into_items() {
        if let Err(item) = equipment.equip(item) {
            log::warn!("Saved equipment '{}' cannot be worn, moving to inventory", item.display_name());
            if inventory.add_item(item).is_err() {
                log::warn!("No room for unwearable saved item");
            }
        }
    }
    Ok((inventory, equipment))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A small seeded game with the built-in content
    pub(crate) fn test_game() -> Game {
        let settings = GameSettings { map_width: 48, map_height: 48, initial_monsters: 0, ..GameSettings::default() };
        let mut game = Game::new(settings, DataManager::default());
        game.start_new_game(42);
        game
    }

    #[test]
    fn test_new_game_starts_main_story() {
        let game = test_game();
        assert_eq!(game.state(), &GameState::Playing);
        assert!(game.player().is_some());
        let current = game.story().current_main_quest(game.quests()).unwrap();
        assert_eq!(current.id, "mq_01_mysterious_arrival");
        assert!(game.messages().iter().any(|m| m.text.contains("A Mysterious Arrival")));
    }

    #[test]
    fn test_npcs_placed_on_open_ground() {
        let game = test_game();
        let npcs: Vec<Position> = game
            .world()
            .query::<(&Position, &crate::entities::Npc)>()
            .iter()
            .map(|(_, (p, _))| *p)
            .collect();
        assert_eq!(npcs.len(), 4);
        for pos in npcs {
            assert!(game.map().is_walkable(pos.x, pos.y));
        }
    }

    #[test]
    fn test_message_log_is_capped() {
        let mut game = test_game();
        for i in 0..150 {
            game.add_message(format!("m{}", i), MessageCategory::System);
        }
        assert_eq!(game.messages().len(), MAX_MESSAGES);
        assert_eq!(game.messages().last().unwrap().text, "m149");
    }

    #[test]
    fn test_monster_hits_are_reduced_but_land() {
        let mut game = test_game();
        let player = game.player().unwrap();
        let before = game.player_health().unwrap().current;
        // Starting sword adds no defense; give the player a thick hide
        game.world_mut().get::<&mut Combat>(player).unwrap().defense = 50;
        game.resolve_monster_attack(MonsterAttack { attacker: player, name: "Wolf".into(), damage: 12 });
        assert_eq!(game.player_health().unwrap().current, before - 1);
    }

    #[test]
    fn test_death_ends_game() {
        let mut game = test_game();
        let player = game.player().unwrap();
        game.world_mut().get::<&mut Health>(player).unwrap().current = 0;
        game.last_attacker = Some("Wraith".into());
        game.update(0.016);
        assert_eq!(game.state(), &GameState::GameOver { cause: "slain by a Wraith".into() });
    }

    #[test]
    fn test_bad_save_leaves_session_running() {
        let mut game = test_game();
        let player = game.player().unwrap();
        let pos = game.player_position().unwrap();
        game.start_quest("sq_wolf_cull").unwrap();

        let mut save = SaveData::capture(&game).unwrap();
        save.map_seed = 999;
        save.player.health = (10, 0);
        assert!(matches!(game.restore_from_save(save), Err(SaveError::InvalidData(_))));

        assert_eq!(game.seed(), 42);
        assert_eq!(game.player(), Some(player));
        assert_eq!(game.player_position(), Some(pos));
        assert!(game.quests().active_quests().any(|q| q.id == "sq_wolf_cull"));
    }

    #[test]
    fn test_modal_panel_freezes_world() {
        let mut game = test_game();
        game.panels_mut().open_dialog();
        game.update(1.0);
        assert_eq!(game.elapsed(), 0.0);
        game.panels_mut().close_dialog();
        game.update(1.0);
        assert_eq!(game.elapsed(), 1.0);
    }
}
