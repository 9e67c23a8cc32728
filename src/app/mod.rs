//! Application shell for ChatApp
//!
//! - `core`: ChatApp struct, startup and user-action handlers
//! - `update`: per-frame loop choosing between join, chat and error screens

pub mod core;
pub mod update;

pub use core::ChatApp;
