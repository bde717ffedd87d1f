//! Terminal client for the VolumeRead self-hosted feed reader.
//!
//! The backend owns polling, persistence and OPML parsing. This crate pulls
//! its JSON snapshot and paged article lists over REST, keeps all view state
//! in [`app::App`], and renders it with ratatui.

pub mod api;
pub mod app;
pub mod config;
pub mod content;
pub mod filter;
pub mod keybindings;
pub mod preferences;
pub mod storage;
pub mod transfer;
pub mod ui;
pub mod util;
pub mod view;
