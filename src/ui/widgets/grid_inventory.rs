//! Grid inventory widget for ratatui
//!
//! Draws the bag as a fixed grid of slots, `GRID_COLUMNS` wide.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use crate::items::{Inventory, Item, Quality, GRID_COLUMNS};

/// Grid cursor position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridCursor {
    pub x: usize,
    pub y: usize,
}

impl GridCursor {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn move_up(&mut self) {
        if self.y > 0 {
            self.y -= 1;
        }
    }

    pub fn move_down(&mut self, rows: usize) {
        if self.y + 1 < rows {
            self.y += 1;
        }
    }

    pub fn move_left(&mut self) {
        if self.x > 0 {
            self.x -= 1;
        }
    }

    pub fn move_right(&mut self) {
        if self.x + 1 < GRID_COLUMNS {
            self.x += 1;
        }
    }

    /// Slot index under the cursor
    pub fn index(&self) -> usize {
        self.y * GRID_COLUMNS + self.x
    }
}

/// Rows needed to show every slot of a bag
pub fn grid_rows(capacity: usize) -> usize {
    capacity.div_ceil(GRID_COLUMNS)
}

/// Grid cell under a screen position, for a grid drawn into `area`
pub fn slot_at(area: Rect, capacity: usize, column: u16, row: u16) -> Option<GridCursor> {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    if column < inner.x || row < inner.y || row >= inner.y + inner.height {
        return None;
    }
    let x = ((column - inner.x) / 3) as usize;
    let y = (row - inner.y) as usize;
    // Cells that do not fit whole are not drawn
    if x >= GRID_COLUMNS || inner.x + x as u16 * 3 + 2 >= inner.x + inner.width {
        return None;
    }
    let cursor = GridCursor::new(x, y);
    (y < grid_rows(capacity) && cursor.index() < capacity).then_some(cursor)
}

/// Widget for rendering the slot grid
pub struct GridInventoryWidget<'a> {
    inventory: &'a Inventory,
    cursor: Option<GridCursor>,
    title: &'a str,
}

impl<'a> GridInventoryWidget<'a> {
    pub fn new(inventory: &'a Inventory) -> Self {
        Self {
            inventory,
            cursor: None,
            title: " Inventory ",
        }
    }

    /// Highlight a cell. Without a cursor the grid is drawn unfocused.
    pub fn cursor(mut self, cursor: Option<GridCursor>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    fn cell_style(&self, index: usize, is_cursor: bool) -> (char, Style) {
        match self.inventory.get(index) {
            Some(item) => {
                let mut style = Style::default().fg(quality_color(item.quality));
                if is_cursor {
                    style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
                }
                (item.glyph(), style)
            }
            None => {
                let mut style = Style::default().fg(Color::Rgb(60, 60, 70));
                if is_cursor {
                    style = style.bg(Color::Rgb(40, 40, 50)).fg(Color::White);
                }
                ('·', style)
            }
        }
    }
}

impl<'a> Widget for GridInventoryWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.cursor.is_some() { Color::Yellow } else { Color::Rgb(100, 100, 120) };
        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        let inner = block.inner(area);
        block.render(area, buf);

        let rows = grid_rows(self.inventory.capacity());
        for y in 0..rows {
            for x in 0..GRID_COLUMNS {
                let index = y * GRID_COLUMNS + x;
                if index >= self.inventory.capacity() {
                    break;
                }
                let is_cursor = self.cursor == Some(GridCursor::new(x, y));
                let (glyph, style) = self.cell_style(index, is_cursor);

                // Cells are 3 wide so glyphs do not run together
                let cell_x = inner.x + (x as u16 * 3);
                let cell_y = inner.y + y as u16;

                if cell_x + 2 < inner.x + inner.width && cell_y < inner.y + inner.height {
                    if let Some(cell) = buf.cell_mut((cell_x, cell_y)) {
                        cell.set_char(' ').set_style(style);
                    }
                    if let Some(cell) = buf.cell_mut((cell_x + 1, cell_y)) {
                        cell.set_char(glyph).set_style(style);
                    }
                    if let Some(cell) = buf.cell_mut((cell_x + 2, cell_y)) {
                        cell.set_char(' ').set_style(style);
                    }
                }
            }
        }

        let footer_y = inner.y + rows as u16 + 1;
        if footer_y < inner.y + inner.height {
            let footer = format!("{}/{} slots  {} gold", self.inventory.count(), self.inventory.capacity(), self.inventory.gold());
            buf.set_string(inner.x, footer_y, footer, Style::default().fg(Color::DarkGray));
        }
    }
}

pub fn quality_color(quality: Quality) -> Color {
    let (r, g, b) = quality.color();
    Color::Rgb(r, g, b)
}

/// Tooltip for the item under the cursor
pub fn render_item_details(item: &Item, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .title(" Item Details ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(100, 100, 120)));

    let inner = block.inner(area);
    block.render(area, buf);

    let bottom = inner.y + inner.height;
    let mut y = inner.y;

    let name_style = Style::default()
        .fg(quality_color(item.quality))
        .add_modifier(Modifier::BOLD);
    if y < bottom {
        buf.set_string(inner.x, y, item.display_name(), name_style);
        y += 1;
    }

    if y < bottom {
        let quality_text = format!("[{}]", item.quality.name());
        buf.set_string(inner.x, y, quality_text, Style::default().fg(quality_color(item.quality)));
        y += 1;
    }

    y += 1;
    for line in item.stats_display() {
        if y >= bottom {
            break;
        }
        buf.set_string(inner.x, y, line, Style::default().fg(Color::White));
        y += 1;
    }
}

/// Key hints under the grid
pub fn render_grid_help(area: Rect, buf: &mut Buffer) {
    let help_lines = [
        ("↑↓←→", "Move cursor"),
        ("Enter", "Equip / use"),
        ("X", "Drop item"),
        ("Tab", "Switch to equipment"),
        ("I", "Close"),
    ];

    let mut y = area.y;
    for (key, desc) in help_lines {
        if y >= area.y + area.height {
            break;
        }
        let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(Color::DarkGray);

        buf.set_string(area.x, y, key, key_style);
        buf.set_string(area.x + 6, y, desc, desc_style);
        y += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ItemKind, WeaponType, DEFAULT_CAPACITY};

    #[test]
    fn test_cursor_stays_on_grid() {
        let rows = grid_rows(DEFAULT_CAPACITY);
        assert_eq!(rows, 8);

        let mut cursor = GridCursor::default();
        cursor.move_up();
        cursor.move_left();
        assert_eq!(cursor, GridCursor::new(0, 0));

        for _ in 0..10 {
            cursor.move_right();
            cursor.move_down(rows);
        }
        assert_eq!(cursor, GridCursor::new(GRID_COLUMNS - 1, rows - 1));
        assert_eq!(cursor.index(), DEFAULT_CAPACITY - 1);
    }

    #[test]
    fn test_render_draws_item_glyph() {
        let mut inventory = Inventory::new(10);
        let item = Item::new(1, ItemKind::Weapon { weapon_type: WeaponType::Sword, attack_power: 10 }, Quality::Standard);
        let glyph = item.glyph();
        inventory.set_slot(6, Some(item)).unwrap();

        let area = Rect::new(0, 0, 20, 6);
        let mut buf = Buffer::empty(area);
        GridInventoryWidget::new(&inventory)
            .cursor(Some(GridCursor::new(1, 1)))
            .render(area, &mut buf);

        // Slot 6 is column 1, row 1; inside the border at x = 1 + 3 + 1
        assert_eq!(buf[(5, 2)].symbol(), glyph.to_string());
        assert_eq!(buf[(2, 1)].symbol(), "·");
    }

    #[test]
    fn test_slot_at_maps_screen_to_cells() {
        let area = Rect::new(0, 0, 20, 6);
        assert_eq!(slot_at(area, 10, 5, 2), Some(GridCursor::new(1, 1)));
        assert_eq!(slot_at(area, 10, 1, 1), Some(GridCursor::new(0, 0)));
        // Border, past the last column, past the last slot
        assert_eq!(slot_at(area, 10, 0, 1), None);
        assert_eq!(slot_at(area, 10, 17, 1), None);
        assert_eq!(slot_at(area, 10, 1, 3), None);
    }
}
