//! UI widgets

pub mod grid_inventory;

pub use grid_inventory::{
    grid_rows, quality_color, render_grid_help, render_item_details, slot_at, GridCursor, GridInventoryWidget,
};
