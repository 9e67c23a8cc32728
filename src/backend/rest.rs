//! PostgREST-style HTTP calls against the `messages` table.

use reqwest::{RequestBuilder, Response};

use crate::config::BackendConfig;
use crate::error::{ChatError, Result};
use crate::images::MAX_IMAGE_BYTES;
use crate::model::{Message, MessagePatch, NewMessage};

const TABLE: &str = "messages";

pub struct RestClient {
    http: reqwest::Client,
    config: BackendConfig,
}

impl RestClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("oomfie-chat/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }

    /// All rows for `room`, oldest first. Rows without an id are dropped.
    pub async fn fetch_messages(&self, room: &str) -> Result<Vec<Message>> {
        let room_filter = format!("eq.{}", room);
        let req = self.authed(self.http.get(self.config.rest_url(TABLE))).query(&[
            ("select", "*"),
            ("room", room_filter.as_str()),
            ("order", "created_at.asc"),
        ]);

        let rows: Vec<serde_json::Value> = check_status(req.send().await?).await?.json().await?;
        let total = rows.len();
        let messages: Vec<Message> = rows.into_iter().filter_map(Message::from_record).collect();
        tracing::debug!(total, kept = messages.len(), "fetched messages");
        Ok(messages)
    }

    pub async fn insert_message(&self, new: &NewMessage) -> Result<()> {
        let req = self
            .authed(self.http.post(self.config.rest_url(TABLE)))
            .header("Prefer", "return=minimal")
            .json(&[new]);
        check_status(req.send().await?).await?;
        Ok(())
    }

    pub async fn update_message(&self, id: i64, patch: &MessagePatch) -> Result<()> {
        let id_filter = format!("eq.{}", id);
        let req = self
            .authed(self.http.patch(self.config.rest_url(TABLE)))
            .query(&[("id", id_filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(&patch.to_json());
        check_status(req.send().await?).await?;
        Ok(())
    }

    /// GET an arbitrary URL without backend credentials. Bodies larger than
    /// `MAX_IMAGE_BYTES` are refused, with or without a `Content-Length`.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut resp = check_status(self.http.get(url).send().await?).await?;
        let declared = resp.content_length().map(|len| len as usize);
        check_image_len(declared.unwrap_or(0))?;
        let mut bytes = Vec::with_capacity(declared.unwrap_or(0));
        while let Some(chunk) = resp.chunk().await? {
            check_image_len(bytes.len() + chunk.len())?;
            bytes.extend_from_slice(&chunk);
        }
        tracing::debug!(url, len = bytes.len(), "fetched image");
        Ok(bytes)
    }
}

fn check_image_len(len: usize) -> Result<()> {
    if len > MAX_IMAGE_BYTES {
        return Err(ChatError::ImageTooLarge(len));
    }
    Ok(())
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ChatError::Status {
        status: status.as_u16(),
        body,
    })
}
