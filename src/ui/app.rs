//! Main UI Application
//!
//! Keeps panel cursors and routes key presses to the game. Drawing lives
//! in `view`.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use super::view::{bag_layout, equipment_row_at};
use super::widgets::{grid_rows, slot_at, GridCursor};
use crate::game::{Difficulty, Game, GameState, MessageCategory};
use crate::items::{EquipSlot, ItemClass, Quality};
use crate::quests::{Quest, QuestStatus, QuestType};
use crate::save::{SaveStore, SAVE_SLOTS};

pub(super) const MAIN_MENU: [&str; 3] = ["New Game", "Load Game", "Quit"];
pub(super) const SYSTEM_MENU: [&str; 4] = ["Resume", "Save Game", "Load Game", "Quit to Menu"];
/// Quest types the generator panel can roll
pub(super) const GENERATED_QUEST_TYPES: [QuestType; 4] =
    [QuestType::Main, QuestType::Side, QuestType::Daily, QuestType::World];
pub(super) const GENERATOR_ROWS: usize = 3;

/// Which half of the bag overlay takes the cursor keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BagFocus {
    #[default]
    Inventory,
    Equipment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMode {
    Save,
    Load,
}

/// Save slot picker, shown over whatever screen opened it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotMenu {
    pub mode: SlotMode,
    pub selected: u8,
}

/// Main UI application
pub struct App {
    pub(super) saves: SaveStore,
    pub(super) menu_cursor: usize,
    pub(super) system_cursor: usize,
    pub(super) slot_menu: Option<SlotMenu>,
    /// Shown on the title screen, e.g. after a failed load
    pub(super) notice: Option<String>,

    pub(super) bag_focus: BagFocus,
    pub(super) inventory_cursor: GridCursor,
    pub(super) equipment_cursor: usize,

    pub(super) quest_tab: QuestType,
    pub(super) quest_cursor: usize,

    pub(super) generator_row: usize,
    /// 0 is "any", otherwise an index into `ItemClass::ALL` plus one
    pub(super) generator_class: usize,
    /// 0 is "any", otherwise an index into `Quality::ALL` plus one
    pub(super) generator_quality: usize,
    pub(super) generator_quest: usize,

    pub(super) dialog_cursor: usize,
}

impl App {
    pub fn new(saves: SaveStore) -> Self {
        Self {
            saves,
            menu_cursor: 0,
            system_cursor: 0,
            slot_menu: None,
            notice: None,
            bag_focus: BagFocus::Inventory,
            inventory_cursor: GridCursor::default(),
            equipment_cursor: 0,
            quest_tab: QuestType::Main,
            quest_cursor: 0,
            generator_row: 0,
            generator_class: 0,
            generator_quality: 0,
            generator_quest: 0,
            dialog_cursor: 0,
        }
    }

    pub fn saves(&self) -> &SaveStore {
        &self.saves
    }

    pub fn slot_menu(&self) -> Option<SlotMenu> {
        self.slot_menu
    }

    /// Handle keyboard input, returns true if should quit
    pub fn handle_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        // Global quit shortcut
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }

        if let Some(menu) = self.slot_menu {
            return self.handle_slot_input(key, game, menu);
        }

        match game.state().clone() {
            GameState::MainMenu => self.handle_main_menu_input(key, game),
            GameState::Playing => self.handle_playing_input(key, game),
            GameState::Paused => self.handle_pause_input(key, game),
            GameState::GameOver { .. } => self.handle_game_over_input(key, game),
            GameState::Quit => Ok(true),
        }
    }

    fn handle_main_menu_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_cursor = (self.menu_cursor + MAIN_MENU.len() - 1) % MAIN_MENU.len();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.menu_cursor = (self.menu_cursor + 1) % MAIN_MENU.len();
            }
            KeyCode::Enter | KeyCode::Char(' ') => match self.menu_cursor {
                0 => self.new_game(game),
                1 => self.open_slot_menu(SlotMode::Load),
                _ => game.quit(),
            },
            KeyCode::Char('n') => self.new_game(game),
            KeyCode::Char('l') => self.open_slot_menu(SlotMode::Load),
            KeyCode::Char('d') => {
                let current = game.settings().difficulty;
                let i = Difficulty::ALL.iter().position(|d| *d == current).unwrap_or(0);
                let next = Difficulty::ALL[(i + 1) % Difficulty::ALL.len()];
                game.settings_mut().adjust_difficulty(next);
            }
            KeyCode::Char('q') | KeyCode::Esc => game.quit(),
            _ => {}
        }
        Ok(false)
    }

    fn new_game(&mut self, game: &mut Game) {
        self.reset_cursors();
        self.notice = None;
        game.start_new_game(Game::pick_seed());
    }

    fn reset_cursors(&mut self) {
        self.bag_focus = BagFocus::Inventory;
        self.inventory_cursor = GridCursor::default();
        self.equipment_cursor = 0;
        self.quest_cursor = 0;
        self.system_cursor = 0;
        self.dialog_cursor = 0;
    }

    fn open_slot_menu(&mut self, mode: SlotMode) {
        self.slot_menu = Some(SlotMenu { mode, selected: 0 });
    }

    // ------------------------------------------------------------------
    // Playing
    // ------------------------------------------------------------------

    fn handle_playing_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        let panels = *game.panels();
        if panels.dialog {
            return self.handle_dialog_input(key, game);
        }
        if panels.system_menu {
            return self.handle_system_menu_input(key, game);
        }

        match key.code {
            KeyCode::Char('i') | KeyCode::Char('e') => {
                game.panels_mut().toggle_inventory();
                self.bag_focus = if key.code == KeyCode::Char('e') { BagFocus::Equipment } else { BagFocus::Inventory };
                return Ok(false);
            }
            KeyCode::Char('q') => {
                game.panels_mut().toggle_quest_log();
                self.quest_cursor = 0;
                return Ok(false);
            }
            KeyCode::Char('g') => {
                game.panels_mut().toggle_generator();
                self.bag_focus = BagFocus::Inventory;
                return Ok(false);
            }
            KeyCode::Esc => {
                game.panels_mut().escape();
                self.system_cursor = 0;
                return Ok(false);
            }
            KeyCode::Char('p') => {
                game.toggle_pause();
                return Ok(false);
            }
            KeyCode::Char('t') => {
                if game.talk_to_nearby_npc() {
                    self.dialog_cursor = 0;
                } else {
                    game.add_message("There is no one here to talk to", MessageCategory::System);
                }
                return Ok(false);
            }
            KeyCode::Char('w') => return self.move_player(game, 0, -1),
            KeyCode::Char('s') => return self.move_player(game, 0, 1),
            KeyCode::Char('a') => return self.move_player(game, -1, 0),
            KeyCode::Char('d') => return self.move_player(game, 1, 0),
            _ => {}
        }

        // The topmost open panel takes the cursor keys
        if panels.quest_log {
            self.handle_quest_log_input(key, game);
        } else if panels.generator {
            self.handle_generator_input(key, game);
        } else if panels.inventory || panels.equipment {
            self.handle_bag_input(key, game);
        } else {
            match key.code {
                KeyCode::Up => return self.move_player(game, 0, -1),
                KeyCode::Down => return self.move_player(game, 0, 1),
                KeyCode::Left => return self.move_player(game, -1, 0),
                KeyCode::Right => return self.move_player(game, 1, 0),
                _ => {}
            }
        }
        Ok(false)
    }

    fn move_player(&mut self, game: &mut Game, dx: i32, dy: i32) -> Result<bool> {
        game.try_move_player(dx, dy);
        if game.panels().dialog {
            self.dialog_cursor = 0;
        }
        Ok(false)
    }

    fn handle_bag_input(&mut self, key: KeyEvent, game: &mut Game) {
        if key.code == KeyCode::Tab {
            self.bag_focus = match self.bag_focus {
                BagFocus::Inventory if game.panels().equipment => BagFocus::Equipment,
                _ => BagFocus::Inventory,
            };
            return;
        }

        match self.bag_focus {
            BagFocus::Inventory => self.handle_inventory_input(key, game),
            BagFocus::Equipment => self.handle_equipment_input(key, game),
        }
    }

    fn handle_inventory_input(&mut self, key: KeyEvent, game: &mut Game) {
        let Some(inventory) = game.inventory() else {
            return;
        };
        let rows = grid_rows(inventory.capacity());
        match key.code {
            KeyCode::Up => self.inventory_cursor.move_up(),
            KeyCode::Down => self.inventory_cursor.move_down(rows),
            KeyCode::Left => self.inventory_cursor.move_left(),
            KeyCode::Right => self.inventory_cursor.move_right(),
            KeyCode::Enter => activate_slot(game, self.inventory_cursor.index()),
            KeyCode::Char('x') => {
                let index = self.inventory_cursor.index();
                if inventory.get(index).is_some() {
                    if let Err(e) = game.drop_item(index) {
                        log::warn!("Drop failed: {}", e);
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_equipment_input(&mut self, key: KeyEvent, game: &mut Game) {
        let slots = EquipSlot::ALL.len();
        match key.code {
            KeyCode::Up => self.equipment_cursor = (self.equipment_cursor + slots - 1) % slots,
            KeyCode::Down => self.equipment_cursor = (self.equipment_cursor + 1) % slots,
            KeyCode::Enter => unequip(game, EquipSlot::ALL[self.equipment_cursor]),
            _ => {}
        }
    }

    /// Left clicks on the open bag. A grid cell equips or uses its item and
    /// an equipment row takes its item off.
    pub fn handle_mouse(&mut self, mouse: MouseEvent, game: &mut Game, screen: Rect) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        if self.slot_menu.is_some() || game.state() != &GameState::Playing {
            return;
        }
        let panels = game.panels();
        if panels.dialog || panels.system_menu || panels.quest_log {
            return;
        }
        if !(panels.inventory || panels.equipment || panels.generator) {
            return;
        }
        let showing_equipment = !panels.generator;
        let Some(capacity) = game.inventory().map(|inv| inv.capacity()) else {
            return;
        };

        let layout = bag_layout(screen);
        if let Some(cursor) = slot_at(layout.grid, capacity, mouse.column, mouse.row) {
            self.bag_focus = BagFocus::Inventory;
            self.inventory_cursor = cursor;
            activate_slot(game, cursor.index());
        } else if showing_equipment {
            if let Some(row) = equipment_row_at(layout.side, mouse.column, mouse.row) {
                self.bag_focus = BagFocus::Equipment;
                self.equipment_cursor = row;
                unequip(game, EquipSlot::ALL[row]);
            }
        }
    }

    fn handle_quest_log_input(&mut self, key: KeyEvent, game: &mut Game) {
        match key.code {
            KeyCode::Tab => {
                self.quest_tab = next_quest_tab(self.quest_tab);
                self.quest_cursor = 0;
            }
            KeyCode::BackTab => {
                self.quest_tab = previous_quest_tab(self.quest_tab);
                self.quest_cursor = 0;
            }
            KeyCode::Up => self.quest_cursor = self.quest_cursor.saturating_sub(1),
            KeyCode::Down => {
                let count = quest_entries(game, self.quest_tab).len();
                if self.quest_cursor + 1 < count {
                    self.quest_cursor += 1;
                }
            }
            KeyCode::Enter => {
                let Some((id, status)) = quest_entries(game, self.quest_tab)
                    .get(self.quest_cursor)
                    .map(|q| (q.id.clone(), q.status))
                else {
                    return;
                };
                let result = match status {
                    QuestStatus::NotStarted => game.start_quest(&id),
                    QuestStatus::Completed => game.turn_in_quest(&id),
                    _ => return,
                };
                if let Err(e) = result {
                    log::warn!("Quest action on {} failed: {}", id, e);
                    game.add_message(e.to_string(), MessageCategory::Warning);
                }
                let count = quest_entries(game, self.quest_tab).len();
                self.quest_cursor = self.quest_cursor.min(count.saturating_sub(1));
            }
            _ => {}
        }
    }

    fn handle_generator_input(&mut self, key: KeyEvent, game: &mut Game) {
        let class_options = ItemClass::ALL.len() + 1;
        let quality_options = Quality::ALL.len() + 1;
        let quest_options = GENERATED_QUEST_TYPES.len();
        match key.code {
            KeyCode::Up => self.generator_row = (self.generator_row + GENERATOR_ROWS - 1) % GENERATOR_ROWS,
            KeyCode::Down | KeyCode::Tab => self.generator_row = (self.generator_row + 1) % GENERATOR_ROWS,
            KeyCode::Left | KeyCode::Right => {
                let forward = key.code == KeyCode::Right;
                let (value, options) = match self.generator_row {
                    0 => (&mut self.generator_class, class_options),
                    1 => (&mut self.generator_quality, quality_options),
                    _ => (&mut self.generator_quest, quest_options),
                };
                *value = if forward { (*value + 1) % options } else { (*value + options - 1) % options };
            }
            KeyCode::Enter => {
                if self.generator_row == 2 {
                    let quest_type = GENERATED_QUEST_TYPES[self.generator_quest];
                    game.generate_quest(quest_type);
                } else {
                    game.generate_item(self.selected_class(), self.selected_quality());
                }
            }
            _ => {}
        }
    }

    pub(super) fn selected_class(&self) -> Option<ItemClass> {
        self.generator_class.checked_sub(1).and_then(|i| ItemClass::ALL.get(i).copied())
    }

    pub(super) fn selected_quality(&self) -> Option<Quality> {
        self.generator_quality.checked_sub(1).and_then(|i| Quality::ALL.get(i).copied())
    }

    fn handle_dialog_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        let choices = game
            .dialog()
            .and_then(|d| d.current_node())
            .map_or(0, |node| node.choices.len());

        match key.code {
            KeyCode::Esc => game.close_dialog(),
            KeyCode::Up | KeyCode::Char('w') if choices > 0 => {
                self.dialog_cursor = (self.dialog_cursor + choices - 1) % choices;
            }
            KeyCode::Down | KeyCode::Char('s') if choices > 0 => {
                self.dialog_cursor = (self.dialog_cursor + 1) % choices;
            }
            KeyCode::Char(c) if c.is_ascii_digit() && choices > 0 => {
                let picked = c.to_digit(10).and_then(|d| (d as usize).checked_sub(1));
                if let Some(index) = picked.filter(|&i| i < choices) {
                    self.dialog_cursor = 0;
                    game.choose_dialog_option(index);
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if choices == 0 {
                    game.advance_dialog();
                } else {
                    let index = self.dialog_cursor.min(choices - 1);
                    self.dialog_cursor = 0;
                    game.choose_dialog_option(index);
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_system_menu_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.system_cursor = (self.system_cursor + SYSTEM_MENU.len() - 1) % SYSTEM_MENU.len();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.system_cursor = (self.system_cursor + 1) % SYSTEM_MENU.len();
            }
            KeyCode::Esc => game.panels_mut().escape(),
            KeyCode::Enter => match self.system_cursor {
                0 => game.panels_mut().escape(),
                1 => self.open_slot_menu(SlotMode::Save),
                2 => self.open_slot_menu(SlotMode::Load),
                _ => {
                    game.panels_mut().close_all();
                    game.set_state(GameState::MainMenu);
                    self.menu_cursor = 0;
                }
            },
            _ => {}
        }
        Ok(false)
    }

    // ------------------------------------------------------------------
    // Other screens
    // ------------------------------------------------------------------

    fn handle_pause_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('p') => game.toggle_pause(),
            KeyCode::Char('q') => game.set_state(GameState::MainMenu),
            _ => {}
        }
        Ok(false)
    }

    fn handle_game_over_input(&mut self, key: KeyEvent, game: &mut Game) -> Result<bool> {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            game.set_state(GameState::MainMenu);
            self.menu_cursor = 0;
        }
        Ok(false)
    }

    fn handle_slot_input(&mut self, key: KeyEvent, game: &mut Game, menu: SlotMenu) -> Result<bool> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                let selected = if menu.selected > 0 { menu.selected - 1 } else { SAVE_SLOTS - 1 };
                self.slot_menu = Some(SlotMenu { selected, ..menu });
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let selected = (menu.selected + 1) % SAVE_SLOTS;
                self.slot_menu = Some(SlotMenu { selected, ..menu });
            }
            KeyCode::Char('d') => {
                if let Err(e) = self.saves.delete(menu.selected) {
                    log::warn!("Failed to delete slot {}: {}", menu.selected, e);
                }
            }
            KeyCode::Esc => self.slot_menu = None,
            KeyCode::Enter => {
                self.slot_menu = None;
                match menu.mode {
                    SlotMode::Save => self.save_to_slot(game, menu.selected),
                    SlotMode::Load => self.load_from_slot(game, menu.selected),
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn save_to_slot(&mut self, game: &mut Game, slot: u8) {
        match self.saves.save_game(game, slot) {
            Ok(()) => {
                game.panels_mut().close_all();
                game.add_message(format!("Game saved to slot {}", slot + 1), MessageCategory::System);
            }
            Err(e) => {
                log::warn!("Save to slot {} failed: {}", slot, e);
                game.add_message(format!("Failed to save: {}", e), MessageCategory::Warning);
            }
        }
    }

    fn load_from_slot(&mut self, game: &mut Game, slot: u8) {
        if !self.saves.exists(slot) {
            self.report_load_failure(game, format!("Slot {} is empty", slot + 1));
            return;
        }
        let result = self.saves.load(slot).and_then(|save| game.restore_from_save(save));
        match result {
            Ok(()) => {
                self.reset_cursors();
                self.notice = None;
            }
            Err(e) => {
                log::warn!("Load from slot {} failed: {}", slot, e);
                self.report_load_failure(game, format!("Failed to load: {}", e));
            }
        }
    }

    fn report_load_failure(&mut self, game: &mut Game, text: String) {
        if game.state() == &GameState::MainMenu {
            self.notice = Some(text);
        } else {
            game.add_message(text, MessageCategory::Warning);
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(SaveStore::default_location())
    }
}

/// Use a consumable or wear anything else
fn activate_slot(game: &mut Game, index: usize) {
    let Some(consumable) = game.inventory().and_then(|inv| inv.get(index).map(|item| item.is_consumable())) else {
        return;
    };
    if consumable {
        if let Err(e) = game.use_consumable(index) {
            game.add_message(format!("Cannot use that: {}", e), MessageCategory::Warning);
        }
    } else if let Err(e) = game.equip_from_inventory(index) {
        game.add_message(format!("Cannot equip: {}", e), MessageCategory::Warning);
    }
}

fn unequip(game: &mut Game, slot: EquipSlot) {
    if let Err(e) = game.unequip_to_inventory(slot) {
        game.add_message(format!("Cannot unequip: {}", e), MessageCategory::Warning);
    }
}

fn next_quest_tab(tab: QuestType) -> QuestType {
    let i = QuestType::ALL.iter().position(|t| *t == tab).unwrap_or(0);
    QuestType::ALL[(i + 1) % QuestType::ALL.len()]
}

fn previous_quest_tab(tab: QuestType) -> QuestType {
    let len = QuestType::ALL.len();
    let i = QuestType::ALL.iter().position(|t| *t == tab).unwrap_or(0);
    QuestType::ALL[(i + len - 1) % len]
}

/// Quests listed under a tab: active and finished ones, plus unstarted
/// ones the player could take right now. Hidden quests only show once
/// they are running.
pub(super) fn quest_entries(game: &Game, tab: QuestType) -> Vec<&Quest> {
    let ctx = game.story().context(game.player_level());
    let available: Vec<&str> = game
        .quests()
        .available_quests(&ctx)
        .into_iter()
        .map(|q| q.id.as_str())
        .collect();

    let mut entries: Vec<&Quest> = game
        .quests()
        .quests_by_type(tab)
        .into_iter()
        .filter(|q| match q.status {
            QuestStatus::NotStarted => tab != QuestType::Hidden && available.contains(&q.id.as_str()),
            _ => true,
        })
        .collect();
    entries.sort_by_key(|q| (status_rank(q.status), q.chain_position.unwrap_or(0), q.id.clone()));
    entries
}

fn status_rank(status: QuestStatus) -> u8 {
    match status {
        QuestStatus::Completed => 0,
        QuestStatus::InProgress => 1,
        QuestStatus::NotStarted => 2,
        QuestStatus::Failed => 3,
        QuestStatus::TurnedIn => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::tests::test_game;
    use crate::items::{ItemKind, GRID_COLUMNS};

    fn press(app: &mut App, game: &mut Game, code: KeyCode) -> bool {
        app.handle_input(KeyEvent::new(code, KeyModifiers::NONE), game).unwrap()
    }

    fn test_app(dir: &tempfile::TempDir) -> App {
        App::new(SaveStore::new(dir.path()))
    }

    #[test]
    fn test_ctrl_q_quits_anywhere() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.handle_input(key, &mut game).unwrap());
    }

    #[test]
    fn test_panel_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();

        press(&mut app, &mut game, KeyCode::Char('e'));
        assert!(game.panels().inventory && game.panels().equipment);
        assert_eq!(app.bag_focus, BagFocus::Equipment);

        press(&mut app, &mut game, KeyCode::Char('g'));
        assert!(game.panels().generator && !game.panels().equipment);

        press(&mut app, &mut game, KeyCode::Char('q'));
        assert!(game.panels().quest_log);

        press(&mut app, &mut game, KeyCode::Esc);
        assert!(game.panels().system_menu);
        // Modal menu swallows panel keys
        press(&mut app, &mut game, KeyCode::Char('q'));
        assert!(game.panels().quest_log);
        press(&mut app, &mut game, KeyCode::Esc);
        assert!(!game.panels().system_menu);
    }

    #[test]
    fn test_arrows_move_only_without_panels() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();

        press(&mut app, &mut game, KeyCode::Char('i'));
        let before = game.player_position();
        press(&mut app, &mut game, KeyCode::Right);
        assert_eq!(game.player_position(), before);
        assert_eq!(app.inventory_cursor, GridCursor::new(1, 0));
    }

    /// Put a fresh weapon in the bag and return its slot
    fn generated_weapon(game: &mut Game) -> (usize, crate::items::ItemId) {
        let item = game.generate_item(Some(ItemClass::Weapon), None).unwrap();
        assert!(matches!(item.kind, ItemKind::Weapon { .. }));
        let index = game.inventory().unwrap().items().find(|(_, it)| it.id == item.id).unwrap().0;
        (index, item.id)
    }

    #[test]
    fn test_enter_equips_from_grid() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();
        let (index, id) = generated_weapon(&mut game);

        press(&mut app, &mut game, KeyCode::Char('i'));
        app.inventory_cursor = GridCursor::new(index % GRID_COLUMNS, index / GRID_COLUMNS);
        press(&mut app, &mut game, KeyCode::Enter);
        assert_eq!(game.equipment().unwrap().get(EquipSlot::Weapon).map(|i| i.id), Some(id));
    }

    #[test]
    fn test_equipment_enter_unequips() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();
        let (index, _) = generated_weapon(&mut game);
        game.equip_from_inventory(index).unwrap();
        let count = game.inventory().unwrap().count();

        press(&mut app, &mut game, KeyCode::Char('e'));
        app.equipment_cursor = EquipSlot::ALL.iter().position(|s| *s == EquipSlot::Weapon).unwrap();
        press(&mut app, &mut game, KeyCode::Enter);
        assert!(game.equipment().unwrap().is_empty(EquipSlot::Weapon));
        assert_eq!(game.inventory().unwrap().count(), count + 1);
    }

    #[test]
    fn test_mouse_clicks_equip_and_unequip() {
        use ratatui::{backend::TestBackend, Terminal};

        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();
        let (index, id) = generated_weapon(&mut game);
        let glyph = game.inventory().unwrap().get(index).unwrap().glyph();
        press(&mut app, &mut game, KeyCode::Char('i'));

        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| app.render(frame, &game)).unwrap();
        let screen = Rect::new(0, 0, 100, 40);
        let layout = bag_layout(screen);

        // Middle of the item's 3-wide cell, inside the grid border
        let column = layout.grid.x + 1 + (index % GRID_COLUMNS) as u16 * 3 + 1;
        let row = layout.grid.y + 1 + (index / GRID_COLUMNS) as u16;
        assert_eq!(terminal.backend().buffer()[(column, row)].symbol(), glyph.to_string());

        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        app.handle_mouse(click(column, row), &mut game, screen);
        assert_eq!(game.equipment().unwrap().get(EquipSlot::Weapon).map(|i| i.id), Some(id));

        let weapon_row = EquipSlot::ALL.iter().position(|s| *s == EquipSlot::Weapon).unwrap();
        let count = game.inventory().unwrap().count();
        app.handle_mouse(click(layout.side.x + 3, layout.side.y + 1 + weapon_row as u16), &mut game, screen);
        assert!(game.equipment().unwrap().is_empty(EquipSlot::Weapon));
        assert_eq!(game.inventory().unwrap().count(), count + 1);
        assert_eq!(app.bag_focus, BagFocus::Equipment);
    }

    #[test]
    fn test_generator_rolls_chosen_class() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();
        let weapons = |game: &Game| {
            game.inventory()
                .unwrap()
                .items()
                .filter(|(_, item)| matches!(item.kind, ItemKind::Weapon { .. }))
                .count()
        };
        let before = weapons(&game);

        press(&mut app, &mut game, KeyCode::Char('g'));
        // Class row: any -> Weapon
        press(&mut app, &mut game, KeyCode::Right);
        assert_eq!(app.selected_class(), Some(ItemClass::Weapon));
        press(&mut app, &mut game, KeyCode::Enter);
        assert_eq!(weapons(&game), before + 1);
    }

    #[test]
    fn test_generator_quest_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();

        press(&mut app, &mut game, KeyCode::Char('g'));
        press(&mut app, &mut game, KeyCode::Down);
        press(&mut app, &mut game, KeyCode::Down);
        // Main -> Side
        press(&mut app, &mut game, KeyCode::Right);
        press(&mut app, &mut game, KeyCode::Enter);
        assert_eq!(game.generated_quests().count(), 1);
        assert_eq!(game.generated_quests().next().unwrap().quest_type, QuestType::Side);
    }

    #[test]
    fn test_quest_log_tabs_and_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();

        press(&mut app, &mut game, KeyCode::Char('q'));
        let main = quest_entries(&game, QuestType::Main);
        assert_eq!(main.first().map(|q| q.id.as_str()), Some("mq_01_mysterious_arrival"));

        press(&mut app, &mut game, KeyCode::Tab);
        assert_eq!(app.quest_tab, QuestType::Side);
        let side = quest_entries(&game, QuestType::Side);
        let Some(position) = side.iter().position(|q| q.status == QuestStatus::NotStarted) else {
            return;
        };
        let id = side[position].id.clone();
        app.quest_cursor = position;
        press(&mut app, &mut game, KeyCode::Enter);
        assert_ne!(game.quests().get_quest(&id).unwrap().status, QuestStatus::NotStarted);
    }

    #[test]
    fn test_dialog_number_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();
        assert!(game.start_dialog("thorne_report", Some("captain_thorne")));
        assert!(game.panels().dialog);

        // Out of range choice does nothing
        press(&mut app, &mut game, KeyCode::Char('9'));
        assert_eq!(game.dialog().unwrap().current_node_id(), "initial");

        press(&mut app, &mut game, KeyCode::Char('1'));
        assert_ne!(game.dialog().unwrap().current_node_id(), "initial");

        press(&mut app, &mut game, KeyCode::Esc);
        assert!(game.dialog().is_none());
        assert!(!game.panels().dialog);
    }

    #[test]
    fn test_save_and_load_through_menus() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();

        // System menu -> Save Game -> slot 1
        press(&mut app, &mut game, KeyCode::Esc);
        press(&mut app, &mut game, KeyCode::Down);
        press(&mut app, &mut game, KeyCode::Enter);
        assert_eq!(app.slot_menu(), Some(SlotMenu { mode: SlotMode::Save, selected: 0 }));
        press(&mut app, &mut game, KeyCode::Enter);
        assert!(app.saves().exists(0));
        assert!(!game.panels().any_open());

        // Back to the title screen, then load it
        press(&mut app, &mut game, KeyCode::Esc);
        for _ in 0..3 {
            press(&mut app, &mut game, KeyCode::Down);
        }
        press(&mut app, &mut game, KeyCode::Enter);
        assert_eq!(game.state(), &GameState::MainMenu);

        press(&mut app, &mut game, KeyCode::Char('l'));
        press(&mut app, &mut game, KeyCode::Enter);
        assert_eq!(game.state(), &GameState::Playing);
        assert!(game.messages().iter().any(|m| m.text == "Game loaded."));
    }

    #[test]
    fn test_empty_slot_load_sets_notice() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();
        game.set_state(GameState::MainMenu);

        press(&mut app, &mut game, KeyCode::Char('l'));
        press(&mut app, &mut game, KeyCode::Down);
        press(&mut app, &mut game, KeyCode::Enter);
        assert_eq!(game.state(), &GameState::MainMenu);
        assert_eq!(app.notice.as_deref(), Some("Slot 2 is empty"));
    }

    #[test]
    fn test_title_screen_cycles_difficulty() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();
        game.set_state(GameState::MainMenu);
        assert_eq!(game.settings().difficulty, Difficulty::Medium);

        press(&mut app, &mut game, KeyCode::Char('d'));
        assert_eq!(game.settings().difficulty, Difficulty::Hard);
        assert_eq!(game.settings().monster_speed_multiplier, 1.2);
        press(&mut app, &mut game, KeyCode::Char('d'));
        assert_eq!(game.settings().difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_game_over_returns_to_menu() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let mut game = test_game();
        game.player_died("slain");
        press(&mut app, &mut game, KeyCode::Enter);
        assert_eq!(game.state(), &GameState::MainMenu);
    }
}
