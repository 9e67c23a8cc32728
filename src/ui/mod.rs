//! UI rendering modules for the chat client.
//!
//! This module contains all egui-based UI rendering code, organized by component:
//! - `join`: Name picker shown before entering the room
//! - `header`: Room label, identity and live feed indicator
//! - `messages`: Message list, bubbles and inline links/images
//! - `composer`: Bottom input row
//! - `status_toasts`: Transient error notices
//! - `theme`: Color schemes and styling

pub mod composer;
pub mod header;
pub mod join;
pub mod messages;
pub mod status_toasts;
pub mod theme;

pub use composer::render_composer;
pub use header::render_header;
pub use join::render_join_screen;
pub use messages::{render_messages, BubbleAction, PreviewCache};
pub use status_toasts::render_status_toasts;
pub use theme::{apply_app_style, ChatTheme};
