//! Screen drawing for `App`

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::app::{
    quest_entries, App, BagFocus, SlotMode, GENERATED_QUEST_TYPES, MAIN_MENU, SYSTEM_MENU,
};
use super::widgets::{quality_color, render_grid_help, render_item_details, GridInventoryWidget};
use crate::ecs::{Animation, AnimationState, Position, Renderable};
use crate::entities::{npc_in_range, Npc};
use crate::game::{Game, GameState, SIGHT_RADIUS};
use crate::items::{EquipSlot, Quality};
use crate::progression::level_title;
use crate::quests::{ObjectiveKind, Quest, QuestStatus, QuestType};

/// Truncate a string to fit within max_len characters, adding "…" if truncated
fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        name.to_string()
    } else if max_len <= 1 {
        "…".to_string()
    } else {
        let truncated: String = name.chars().take(max_len - 1).collect();
        format!("{}…", truncated)
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

fn status_color(status: QuestStatus) -> Color {
    match status {
        QuestStatus::NotStarted => Color::Gray,
        QuestStatus::InProgress => Color::White,
        QuestStatus::Completed => Color::Green,
        QuestStatus::Failed => Color::Red,
        QuestStatus::TurnedIn => Color::DarkGray,
    }
}

/// Where the bag overlay puts its parts. Shared with mouse handling so
/// clicks land on what was drawn.
pub(super) struct BagLayout {
    pub grid: Rect,
    pub details: Rect,
    pub help: Rect,
    /// Equipment list or generator
    pub side: Rect,
}

pub(super) fn bag_layout(screen: Rect) -> BagLayout {
    let area = centered_rect(80, 70, screen);
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    // Left: grid over details
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(12), Constraint::Length(9), Constraint::Length(5)])
        .split(halves[0]);

    BagLayout { grid: left[0], details: left[1], help: left[2], side: halves[1] }
}

/// Equipment row under a screen cell of the equipment box
pub(super) fn equipment_row_at(area: Rect, column: u16, row: u16) -> Option<usize> {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    if column < inner.x || column >= inner.x + inner.width || row < inner.y {
        return None;
    }
    let index = (row - inner.y) as usize;
    (index < EquipSlot::ALL.len()).then_some(index)
}

impl App {
    pub fn render(&self, frame: &mut Frame, game: &Game) {
        // Clear the entire screen first to prevent artifacts
        frame.render_widget(Clear, frame.area());

        match game.state() {
            GameState::MainMenu => self.render_main_menu(frame, game),
            GameState::Playing => self.render_playing(frame, game),
            GameState::Paused => self.render_pause(frame, game),
            GameState::GameOver { cause } => self.render_game_over(frame, game, cause),
            GameState::Quit => {}
        }

        if self.slot_menu.is_some() {
            self.render_slot_menu(frame);
        }
    }

    fn render_main_menu(&self, frame: &mut Frame, game: &Game) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(40),
                Constraint::Percentage(30),
            ])
            .split(area);

        let title = vec![
            Line::from(""),
            Line::from(Span::styled(
                "T I L E Q U E S T",
                Style::default().fg(Color::Rgb(220, 190, 90)).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "A stranger arrives in a quiet village...",
                Style::default().fg(Color::Rgb(100, 100, 100)),
            )),
        ];
        frame.render_widget(Paragraph::new(title).alignment(Alignment::Center), chunks[0]);

        let mut menu = vec![Line::from("")];
        for (i, entry) in MAIN_MENU.iter().enumerate() {
            let style = if i == self.menu_cursor {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let prefix = if i == self.menu_cursor { "> " } else { "  " };
            menu.push(Line::from(Span::styled(format!("{}{}", prefix, entry), style)));
            menu.push(Line::from(""));
        }
        menu.push(Line::from(Span::styled(
            format!("[D] Difficulty: {}", game.settings().difficulty.name()),
            Style::default().fg(Color::Gray),
        )));
        if let Some(notice) = &self.notice {
            menu.push(Line::from(Span::styled(notice.as_str(), Style::default().fg(Color::LightRed))));
        }
        frame.render_widget(Paragraph::new(menu).alignment(Alignment::Center), chunks[1]);

        let version = Paragraph::new(format!("v{}", env!("CARGO_PKG_VERSION")))
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(version, chunks[2]);
    }

    fn render_playing(&self, frame: &mut Frame, game: &Game) {
        let area = frame.area();

        // Main layout: sidebar on right
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(28)])
            .split(area);

        // Map area with message log at bottom
        let left_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(20), Constraint::Length(7)])
            .split(chunks[0]);

        self.render_map(frame, game, left_chunks[0]);
        self.render_messages(frame, game, left_chunks[1]);
        self.render_sidebar(frame, game, chunks[1]);

        let panels = game.panels();
        if panels.inventory || panels.equipment || panels.generator {
            self.render_bag_overlay(frame, game);
        }
        if panels.quest_log {
            self.render_quest_log(frame, game);
        }
        if panels.dialog {
            self.render_dialog(frame, game);
        }
        if panels.system_menu {
            self.render_system_menu(frame);
        }
    }

    fn render_map(&self, frame: &mut Frame, game: &Game, area: Rect) {
        let map = game.map();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Tilequest - seed {} ", game.seed()))
            .border_style(Style::default().fg(Color::Rgb(90, 110, 80)));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(camera) = game.player_position() else {
            return;
        };
        let view_width = inner.width as i32;
        let view_height = inner.height as i32;
        let cam_x = camera.x - view_width / 2;
        let cam_y = camera.y - view_height / 2;

        let to_screen = |pos: Position| -> Option<(u16, u16)> {
            let sx = pos.x - cam_x;
            let sy = pos.y - cam_y;
            if sx < 0 || sy < 0 || sx >= view_width || sy >= view_height {
                return None;
            }
            Some((inner.x + sx as u16, inner.y + sy as u16))
        };

        let buf = frame.buffer_mut();
        for screen_y in 0..view_height {
            for screen_x in 0..view_width {
                let map_x = cam_x + screen_x;
                let map_y = cam_y + screen_y;
                let Some(tile) = map.get_tile(map_x, map_y) else {
                    continue;
                };
                if !tile.explored {
                    continue;
                }
                let lit = camera.chebyshev_distance(&Position::new(map_x, map_y)) <= SIGHT_RADIUS;
                let cell_pos = (inner.x + screen_x as u16, inner.y + screen_y as u16);
                if let Some(cell) = buf.cell_mut(cell_pos) {
                    cell.set_char(tile.glyph()).set_fg(rgb(tile.fg_color(lit)));
                }
            }
        }

        // Markers around the current main quest's unfinished destinations
        if let Some(quest) = game.story().current_main_quest(game.quests()) {
            for objective in quest.objectives.iter().filter(|o| !o.completed) {
                let ObjectiveKind::Explore { location_id, .. } = &objective.kind else {
                    continue;
                };
                for marker in game.locations().objective_markers(map, location_id) {
                    let explored = map.get_tile(marker.x, marker.y).is_some_and(|t| t.explored);
                    if let (true, Some(cell_pos)) = (explored, to_screen(marker)) {
                        if let Some(cell) = buf.cell_mut(cell_pos) {
                            cell.set_char('?').set_fg(Color::Yellow);
                        }
                    }
                }
            }
        }

        // Entities in sight, lowest render order first
        let mut entities: Vec<(Position, Renderable, Option<Animation>)> = game
            .world()
            .query::<(&Position, &Renderable, Option<&Animation>)>()
            .iter()
            .filter(|(_, (pos, _, _))| pos.chebyshev_distance(&camera) <= SIGHT_RADIUS)
            .map(|(_, (pos, render, anim))| (*pos, render.clone(), anim.copied()))
            .collect();
        entities.sort_by_key(|(_, render, _)| render.render_order);

        for (pos, render, anim) in entities {
            let Some(cell_pos) = to_screen(pos) else {
                continue;
            };
            let fg = match anim.map(|a| a.state) {
                Some(AnimationState::Hurt) => Color::Red,
                Some(AnimationState::Attacking) => Color::White,
                _ => rgb(render.fg),
            };
            if let Some(cell) = buf.cell_mut(cell_pos) {
                cell.set_char(render.glyph).set_fg(fg);
            }
        }
    }

    fn render_messages(&self, frame: &mut Frame, game: &Game, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Messages ")
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(area);

        let messages: Vec<Line> = game
            .messages()
            .iter()
            .rev()
            .take(inner.height as usize)
            .rev()
            .map(|msg| Line::from(Span::styled(msg.text.as_str(), Style::default().fg(rgb(msg.category.color())))))
            .collect();

        let para = Paragraph::new(messages).block(block);
        frame.render_widget(para, area);
    }

    fn render_sidebar(&self, frame: &mut Frame, game: &Game, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Status ")
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(area);
        frame.render_widget(block, area);
        let width = inner.width as usize;

        let health = game.player_health().unwrap_or(crate::ecs::Health::new(100));
        let xp = game.player_experience().unwrap_or_default();

        let hp_color = match health.percentage() {
            p if p > 0.6 => Color::Green,
            p if p > 0.3 => Color::Yellow,
            _ => Color::Red,
        };

        let label = Style::default().fg(Color::Gray);
        let mut lines = vec![
            Line::from(Span::styled("Hero", Style::default().fg(Color::White).add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(
                format!("Level {} {}", xp.level, level_title(xp.level)),
                Style::default().fg(Color::Cyan),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("HP   ", label),
                Span::styled(format!("{}/{}", health.current, health.max), Style::default().fg(hp_color)),
            ]),
            Line::from(vec![
                Span::styled("XP   ", label),
                Span::styled(format!("{}/{}", xp.current_xp, xp.xp_to_next), Style::default().fg(Color::Magenta)),
            ]),
            Line::from(vec![
                Span::styled("Gold ", label),
                Span::styled(game.player_gold().to_string(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(vec![
                Span::styled("Atk  ", label),
                Span::raw(game.player_attack().to_string()),
                Span::styled("  Def ", label),
                Span::raw(game.player_defense().to_string()),
            ]),
            Line::from(""),
            Line::from(Span::styled("Quest", Style::default().fg(Color::White).add_modifier(Modifier::BOLD))),
        ];

        match game.story().current_main_quest(game.quests()) {
            Some(quest) => {
                lines.push(Line::from(Span::styled(
                    truncate_name(&quest.title, width),
                    Style::default().fg(Color::Yellow),
                )));
                for objective in &quest.objectives {
                    let mark = if objective.completed { "x" } else { " " };
                    let text = format!("[{}] {} {}/{}", mark, objective.description, objective.current, objective.required);
                    let color = if objective.completed { Color::DarkGray } else { Color::White };
                    lines.push(Line::from(Span::styled(truncate_name(&text, width), Style::default().fg(color))));
                }
                if let Some(hint) = self.quest_hint(game, quest) {
                    lines.push(Line::from(Span::styled(truncate_name(&hint, width), Style::default().fg(Color::Cyan))));
                }
                if quest.status == QuestStatus::Completed {
                    lines.push(Line::from(Span::styled("Ready to turn in", Style::default().fg(Color::Green))));
                }
            }
            None => lines.push(Line::from(Span::styled("None", Style::default().fg(Color::DarkGray)))),
        }

        let nearby = game
            .player_position()
            .and_then(|pos| npc_in_range(game.world(), pos))
            .and_then(|e| game.world().get::<&Npc>(e).ok().map(|npc| npc.full_name()));
        if let Some(name) = nearby {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                truncate_name(&format!("[t] {}", name), width),
                Style::default().fg(Color::Rgb(180, 180, 255)),
            )));
        }

        if let Some(loc) = game
            .player_position()
            .and_then(|pos| game.locations().location_at(pos))
        {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(truncate_name(&loc.area_name, width), Style::default().fg(Color::Green))));
        }

        let help = [
            "[i] Bag  [q] Quests",
            "[g] Generator [t] Talk",
            "[p] Pause [Esc] Menu",
        ];
        let used = lines.len();
        let free = (inner.height as usize).saturating_sub(used + help.len());
        lines.extend(std::iter::repeat(Line::from("")).take(free));
        for text in help {
            lines.push(Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    /// Navigation hint for the first unfinished explore objective
    fn quest_hint(&self, game: &Game, quest: &Quest) -> Option<String> {
        let pos = game.player_position()?;
        quest.objectives.iter().filter(|o| !o.completed).find_map(|o| match &o.kind {
            ObjectiveKind::Explore { location_id, .. } => Some(game.locations().navigation_hint(pos, location_id)),
            _ => None,
        })
    }

    fn render_bag_overlay(&self, frame: &mut Frame, game: &Game) {
        let (Some(inventory), Some(equipment)) = (game.inventory(), game.equipment()) else {
            return;
        };
        let panels = game.panels();
        frame.render_widget(Clear, centered_rect(80, 70, frame.area()));
        let layout = bag_layout(frame.area());

        let grid_focused = !panels.generator && !panels.quest_log && self.bag_focus == BagFocus::Inventory;
        let cursor = grid_focused.then_some(self.inventory_cursor);
        frame.render_widget(GridInventoryWidget::new(&inventory).cursor(cursor), layout.grid);

        if let Some(item) = inventory.get(self.inventory_cursor.index()) {
            render_item_details(item, layout.details, frame.buffer_mut());
        }
        render_grid_help(layout.help, frame.buffer_mut());

        if panels.generator {
            self.render_generator(frame, layout.side);
            return;
        }

        // Right: equipment slots
        let equip_focused = !panels.quest_log && self.bag_focus == BagFocus::Equipment;
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Equipment ")
            .border_style(Style::default().fg(if equip_focused { Color::Yellow } else { Color::Rgb(100, 100, 120) }));
        let inner = block.inner(layout.side);
        frame.render_widget(block, layout.side);

        let mut lines = Vec::new();
        for (i, slot) in EquipSlot::ALL.iter().enumerate() {
            let selected = equip_focused && i == self.equipment_cursor;
            let prefix = if selected { "> " } else { "  " };
            let (text, color) = match equipment.get(*slot) {
                Some(item) => (item.display_name(), quality_color(item.quality)),
                None => ("(empty)".to_string(), Color::DarkGray),
            };
            let mut style = Style::default().fg(color);
            if selected {
                style = style.add_modifier(Modifier::BOLD);
            }
            lines.push(Line::from(vec![
                Span::styled(format!("{}{:<7}", prefix, slot.name()), Style::default().fg(Color::Gray)),
                Span::styled(truncate_name(&text, inner.width.saturating_sub(10) as usize), style),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "Attack +{}  Defense +{}  Dex +{}",
                equipment.total_attack(),
                equipment.total_defense(),
                equipment.total_dexterity()
            ),
            Style::default().fg(Color::Cyan),
        )));
        if let Some(item) = equip_focused.then(|| equipment.get(EquipSlot::ALL[self.equipment_cursor])).flatten() {
            lines.push(Line::from(""));
            for stat in item.stats_display() {
                lines.push(Line::from(Span::styled(stat, Style::default().fg(Color::White))));
            }
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("[Enter/Click] Unequip  [Tab] Switch", Style::default().fg(Color::DarkGray))));

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_generator(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Generator ")
            .border_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let class = self.selected_class().map_or("Any", |c| c.name());
        let quality = self.selected_quality();
        let quality_style = Style::default().fg(quality.map_or(Color::White, quality_color));
        let quest = GENERATED_QUEST_TYPES[self.generator_quest].name();

        let rows: [(&str, String, Style); 3] = [
            ("Class", class.to_string(), Style::default().fg(Color::White)),
            ("Quality", quality.map_or("Any", |q: Quality| q.name()).to_string(), quality_style),
            ("Quest", quest.to_string(), Style::default().fg(Color::Cyan)),
        ];

        let mut lines = vec![Line::from("")];
        for (i, (label, value, style)) in rows.into_iter().enumerate() {
            let selected = i == self.generator_row;
            let prefix = if selected { "> " } else { "  " };
            let label_style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{}{:<8}", prefix, label), label_style),
                Span::styled(format!("< {} >", value), style),
            ]));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            "[←→] Change  [Enter] Generate",
            Style::default().fg(Color::DarkGray),
        )));

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_quest_log(&self, frame: &mut Frame, game: &Game) {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Quest Log ")
            .border_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(5), Constraint::Length(1)])
            .split(inner);

        let tabs: Vec<Span> = QuestType::ALL
            .iter()
            .flat_map(|t| {
                let style = if *t == self.quest_tab {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                } else {
                    Style::default().fg(Color::Gray)
                };
                [Span::styled(t.name(), style), Span::raw("  ")]
            })
            .collect();
        frame.render_widget(Paragraph::new(Line::from(tabs)), rows[0]);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[1]);

        let entries = quest_entries(game, self.quest_tab);
        let list_width = cols[0].width.saturating_sub(2) as usize;
        let mut list = Vec::new();
        if entries.is_empty() {
            list.push(Line::from(Span::styled("No quests", Style::default().fg(Color::DarkGray))));
        }
        for (i, quest) in entries.iter().enumerate() {
            let selected = i == self.quest_cursor;
            let prefix = if selected { "> " } else { "  " };
            let mut style = Style::default().fg(status_color(quest.status));
            if selected {
                style = style.add_modifier(Modifier::BOLD);
            }
            list.push(Line::from(Span::styled(
                format!("{}{}", prefix, truncate_name(&quest.title, list_width.saturating_sub(2))),
                style,
            )));
        }
        frame.render_widget(Paragraph::new(list), cols[0]);

        if let Some(quest) = entries.get(self.quest_cursor) {
            self.render_quest_details(frame, game, quest, cols[1]);
        }

        let help = Paragraph::new("[Tab] Type  [↑↓] Select  [Enter] Start / Turn in  [q] Close")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[2]);
    }

    fn render_quest_details(&self, frame: &mut Frame, game: &Game, quest: &Quest, area: Rect) {
        let mut lines = vec![
            Line::from(Span::styled(quest.title.as_str(), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))),
            Line::from(vec![
                Span::styled(quest.status.name(), Style::default().fg(status_color(quest.status))),
                Span::raw("  "),
                Span::styled(quest.difficulty.name(), Style::default().fg(rgb(quest.difficulty.color()))),
                Span::styled(format!("  Lv {}", quest.level_requirement), Style::default().fg(Color::Gray)),
            ]),
            Line::from(""),
            Line::from(Span::styled(quest.description.as_str(), Style::default().fg(Color::White))),
            Line::from(""),
        ];

        for objective in &quest.objectives {
            let mark = if objective.completed { "x" } else { " " };
            let color = if objective.completed { Color::DarkGray } else { Color::White };
            lines.push(Line::from(Span::styled(
                format!("[{}] {} ({}/{})", mark, objective.description, objective.current, objective.required),
                Style::default().fg(color),
            )));
        }
        if quest.status == QuestStatus::InProgress {
            if let Some(hint) = self.quest_hint(game, quest) {
                lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Cyan))));
            }
            if let Some(remaining) = quest.time_remaining() {
                lines.push(Line::from(Span::styled(
                    format!("Time left: {:.0}s", remaining),
                    Style::default().fg(Color::LightRed),
                )));
            }
        }

        if !quest.rewards.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Rewards", Style::default().fg(Color::Gray))));
            for reward in &quest.rewards {
                lines.push(Line::from(Span::styled(
                    format!("  {}", reward.description),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        let block = Block::default().borders(Borders::LEFT).border_style(Style::default().fg(Color::DarkGray));
        frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
    }

    fn render_dialog(&self, frame: &mut Frame, game: &Game) {
        let Some(session) = game.dialog() else {
            return;
        };
        let full = frame.area();
        let height = (full.height / 3).max(10).min(full.height);
        let area = Rect {
            x: full.x + 2,
            y: full.y + full.height - height,
            width: full.width.saturating_sub(4),
            height,
        };
        frame.render_widget(Clear, area);

        let title = if session.npc_title().is_empty() {
            format!(" {} ", session.npc_name())
        } else {
            format!(" {}, {} ", session.npc_name(), session.npc_title())
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Cyan));

        let mut lines = Vec::new();
        if let Some(node) = session.current_node() {
            for text in &node.text {
                lines.push(Line::from(Span::styled(text.as_str(), Style::default().fg(Color::White))));
            }
            lines.push(Line::from(""));
            for (i, choice) in node.choices.iter().enumerate() {
                let selected = i == self.dialog_cursor;
                let style = if selected {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                lines.push(Line::from(Span::styled(format!("{}. {}", i + 1, choice.text), style)));
            }
            if node.choices.is_empty() {
                lines.push(Line::from(Span::styled("[Enter] Continue", Style::default().fg(Color::DarkGray))));
            }
        }

        frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
    }

    fn render_system_menu(&self, frame: &mut Frame) {
        let area = centered_rect(30, 30, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Menu ")
            .border_style(Style::default().fg(Color::White));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![Line::from("")];
        for (i, entry) in SYSTEM_MENU.iter().enumerate() {
            let selected = i == self.system_cursor;
            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let prefix = if selected { "> " } else { "  " };
            lines.push(Line::from(Span::styled(format!("{}{}", prefix, entry), style)));
        }
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
    }

    fn render_pause(&self, frame: &mut Frame, game: &Game) {
        // Render game in background
        self.render_playing(frame, game);

        let area = centered_rect(30, 30, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" PAUSED ")
            .border_style(Style::default().fg(Color::White));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let menu = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("[P] Resume", Style::default().fg(Color::White))),
            Line::from(""),
            Line::from(Span::styled("[Q] Quit to Menu", Style::default().fg(Color::Gray))),
        ])
        .alignment(Alignment::Center);

        frame.render_widget(menu, inner);
    }

    fn render_slot_menu(&self, frame: &mut Frame) {
        let Some(menu) = self.slot_menu else {
            return;
        };
        let area = centered_rect(50, 50, frame.area());
        frame.render_widget(Clear, area);

        let (title, prompt, action) = match menu.mode {
            SlotMode::Save => (" SAVE GAME ", "Select a slot to save:", "[Enter] Save"),
            SlotMode::Load => (" LOAD GAME ", "Select a slot to load:", "[Enter] Load"),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Yellow));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(prompt, Style::default().fg(Color::Gray))),
            Line::from(""),
        ];

        for (slot, summary) in self.saves.list() {
            let is_selected = slot == menu.selected;
            let prefix = if is_selected { "> " } else { "  " };
            let style = if is_selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let slot_text = match summary {
                Some(s) => format!(
                    "{}Slot {}: Level {} - {}",
                    prefix,
                    slot + 1,
                    s.level,
                    s.main_quest.as_deref().unwrap_or("no active quest")
                ),
                None => format!("{}Slot {}: Empty", prefix, slot + 1),
            };

            lines.push(Line::from(Span::styled(slot_text, style)));
            lines.push(Line::from(""));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{}  [D] Delete  [Esc] Cancel", action),
            Style::default().fg(Color::DarkGray),
        )));

        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
    }

    fn render_game_over(&self, frame: &mut Frame, game: &Game, cause: &str) {
        let area = frame.area();

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "YOU HAVE FALLEN",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Reached level {}", game.player_level())),
            Line::from(""),
            Line::from(Span::styled(cause, Style::default().fg(Color::DarkGray))),
            Line::from(""),
            Line::from(""),
            Line::from(Span::styled(
                "Press [Enter] to continue",
                Style::default().fg(Color::Gray),
            )),
        ];

        let para = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));

        frame.render_widget(para, area);
    }
}

/// Create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::tests::test_game;
    use crate::save::SaveStore;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(app: &App, game: &Game) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| app.render(frame, game)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Sword", 10), "Sword");
        assert_eq!(truncate_name("Masterwork Sword", 6), "Maste…");
        assert_eq!(truncate_name("Sword", 1), "…");
    }

    #[test]
    fn test_playing_screen_shows_player_and_quest() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(SaveStore::new(dir.path()));
        let game = test_game();
        let text = screen_text(&app, &game);
        assert!(text.contains('@'));
        assert!(text.contains("Status"));
        assert!(text.contains("A Mysterious Arrival"));
    }

    #[test]
    fn test_overlays_render() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(SaveStore::new(dir.path()));
        let mut game = test_game();

        game.panels_mut().toggle_inventory();
        let text = screen_text(&app, &game);
        assert!(text.contains("Inventory"));
        assert!(text.contains("Equipment"));

        game.panels_mut().toggle_generator();
        let text = screen_text(&app, &game);
        assert!(text.contains("Generator"));
        assert!(!text.contains("Equipment"));

        game.panels_mut().toggle_quest_log();
        let text = screen_text(&app, &game);
        assert!(text.contains("Quest Log"));
    }

    #[test]
    fn test_dialog_shows_numbered_choices() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(SaveStore::new(dir.path()));
        let mut game = test_game();
        assert!(game.start_dialog("thorne_report", Some("captain_thorne")));
        let text = screen_text(&app, &game);
        assert!(text.contains("1. "));
    }

    #[test]
    fn test_main_menu_and_game_over() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(SaveStore::new(dir.path()));
        let mut game = test_game();

        game.set_state(GameState::MainMenu);
        let text = screen_text(&app, &game);
        assert!(text.contains("New Game"));
        assert!(text.contains("Difficulty: Medium"));

        game.player_died("slain by a Wraith");
        let text = screen_text(&app, &game);
        assert!(text.contains("YOU HAVE FALLEN"));
        assert!(text.contains("slain by a Wraith"));
    }
}
