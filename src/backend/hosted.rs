//! The production backend: REST for reads and writes, websocket for the feed.

use async_trait::async_trait;

use super::rest::RestClient;
use super::subscription::Subscription;
use super::{realtime, ChatBackend};
use crate::config::BackendConfig;
use crate::error::Result;
use crate::model::{Message, MessagePatch, NewMessage};

pub struct HostedBackend {
    rest: RestClient,
    config: BackendConfig,
}

impl HostedBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        Ok(Self {
            rest: RestClient::new(config.clone())?,
            config,
        })
    }
}

#[async_trait]
impl ChatBackend for HostedBackend {
    async fn fetch_messages(&self, room: &str) -> Result<Vec<Message>> {
        self.rest.fetch_messages(room).await
    }

    async fn insert_message(&self, new: &NewMessage) -> Result<()> {
        self.rest.insert_message(new).await
    }

    async fn update_message(&self, id: i64, patch: &MessagePatch) -> Result<()> {
        self.rest.update_message(id, patch).await
    }

    async fn subscribe(&self, room: &str) -> Result<Subscription> {
        realtime::subscribe(&self.config, room).await
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        self.rest.fetch_bytes(url).await
    }
}
