//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling for overlays and both screens
//! - `events` - Background task event processing
//! - `helpers` - Task spawners and browser launch
//! - `render` - Screen and overlay dispatch
//! - `sidebar`, `articles`, `reader`, `status` - Panel widgets
//! - `dialogs` - Add, edit, assign, confirm and path dialogs
//! - `help` - Keybinding overlay
//! - `style` - Semantic style roles

mod articles;
mod dialogs;
mod events;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod reader;
mod render;
mod sidebar;
mod status;
mod style;

pub use loop_runner::{run, Action};
