//! Oomfie Chat - a single-room chat client built with egui
//!
//! Architecture:
//! - Main thread: runs the egui UI and owns the chat session
//! - Backend thread: runs a Tokio runtime for REST and realtime I/O
//! - Communication via crossbeam channels (lock-free, sync-safe)
//!
//! `oomfie-chat --store-key` reads the backend API key from stdin and saves
//! it to the system keyring instead of starting the UI.

use std::io::BufRead;

use anyhow::Context;
use eframe::egui;

use oomfie_chat::app::ChatApp;
use oomfie_chat::{config, logging};

fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    if std::env::args().nth(1).as_deref() == Some("--store-key") {
        return store_key();
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting oomfie-chat");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 720.0])
            .with_min_inner_size([320.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Oomfie Chat",
        options,
        Box::new(|cc| Ok(Box::new(ChatApp::new(cc)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run the UI: {e}"))
}

fn store_key() -> anyhow::Result<()> {
    let mut key = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut key)
        .context("reading API key from stdin")?;
    let key = key.trim();
    anyhow::ensure!(!key.is_empty(), "no API key given on stdin");

    config::save_anon_key(key).context("saving API key to the keyring")?;
    tracing::info!("API key stored in the system keyring");
    Ok(())
}
