//! Oomfie Chat client library.
//!
//! This module re-exports the core components for testing and extension.

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod images;
pub mod input_state;
pub mod logging;
pub mod model;
pub mod protocol;
pub mod reconciler;
pub mod session;
pub mod ui;
pub mod validation;

pub use error::{ChatError, Result};
