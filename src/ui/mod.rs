//! User Interface module
//!
//! Terminal UI using ratatui: key dispatch in `app`, drawing in `view`.

pub mod app;
mod view;
pub mod widgets;

pub use app::{App, BagFocus, SlotMenu, SlotMode};
