/// Backend submodules for the hosted chat store
///
/// - `connection`: websocket and TLS setup
/// - `rest`: bulk read, insert and patch over HTTP
/// - `realtime`: Phoenix-channel live feed
/// - `subscription`: cancellable handle over a live feed
/// - `hosted`: the `ChatBackend` used in production
/// - `main_loop`: Tokio event loop bridging the UI channels
mod connection;
mod hosted;
mod main_loop;
pub mod realtime;
mod rest;
mod subscription;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Message, MessagePatch, NewMessage};

pub use connection::create_tls_connector;
pub use hosted::HostedBackend;
pub use main_loop::{run_backend, POLL_INTERVAL};
pub use subscription::{FeedItem, FeedSender, Subscription};

/// The remote store the chat talks to.
///
/// There is no row-removal call; user-facing delete is a
/// [`MessagePatch::SoftDelete`].
#[async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    /// All messages in `room`, ordered by ascending `created_at`.
    async fn fetch_messages(&self, room: &str) -> Result<Vec<Message>>;

    /// Insert a row; the backend assigns `id` and `created_at`.
    async fn insert_message(&self, new: &NewMessage) -> Result<()>;

    /// Patch the row with `id`.
    async fn update_message(&self, id: i64, patch: &MessagePatch) -> Result<()>;

    /// Open the live change feed for `room`.
    async fn subscribe(&self, room: &str) -> Result<Subscription>;

    /// Raw bytes behind an image URL found in a message body.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
}
