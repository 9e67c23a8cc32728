//! Realtime change feed over a Phoenix-channels websocket.
//!
//! The server speaks the Phoenix v1 JSON framing: every frame is an object
//! with `topic`, `event`, `payload`, `ref` and `join_ref`. We join a single
//! channel with a `postgres_changes` filter for the room, keep the socket
//! alive with heartbeats on the `phoenix` topic, and turn incoming
//! `postgres_changes` payloads into [`ChangeEvent`]s.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::connection::{connect_websocket, WsStream};
use super::subscription::{FeedSender, Subscription};
use crate::config::BackendConfig;
use crate::error::{ChatError, Result};
use crate::model::{ChangeEvent, Message};

/// Interval between `phoenix` heartbeats
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

const JOIN_REF: &str = "1";
const MESSAGES_TABLE: &str = "messages";

/// One Phoenix protocol frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PhoenixFrame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

impl PhoenixFrame {
    /// `phx_join` for the room's `postgres_changes` channel.
    pub fn join(topic: &str, room: &str, access_token: &str) -> Self {
        Self {
            topic: topic.to_string(),
            event: "phx_join".to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "self": false, "ack": false },
                    "presence": { "key": "" },
                    "postgres_changes": [{
                        "event": "*",
                        "schema": "public",
                        "table": MESSAGES_TABLE,
                        "filter": format!("room=eq.{}", room),
                    }],
                },
                "access_token": access_token,
            }),
            reference: Some(JOIN_REF.to_string()),
            join_ref: Some(JOIN_REF.to_string()),
        }
    }

    pub fn leave(topic: &str, reference: u64) -> Self {
        Self {
            topic: topic.to_string(),
            event: "phx_leave".to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
            join_ref: Some(JOIN_REF.to_string()),
        }
    }

    pub fn heartbeat(reference: u64) -> Self {
        Self {
            topic: "phoenix".to_string(),
            event: "heartbeat".to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
            join_ref: None,
        }
    }

    fn to_ws(&self) -> Result<WsMessage> {
        Ok(WsMessage::text(serde_json::to_string(self)?))
    }
}

/// Channel topic for a room.
pub fn channel_topic(room: &str) -> String {
    format!("realtime:room-{}", room)
}

/// What an inbound frame means for our channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A row change on the joined channel
    Change(ChangeEvent),
    /// Reply to our `phx_join`
    JoinReply { ok: bool, detail: String },
    /// The server closed or errored the channel
    ChannelClosed(String),
    /// Heartbeat replies, presence, system notices, other topics
    Ignored,
}

/// Decode one text frame relative to the channel `topic`.
pub fn decode_frame(topic: &str, text: &str) -> Inbound {
    let frame: PhoenixFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring undecodable realtime frame");
            return Inbound::Ignored;
        }
    };

    if frame.topic != topic {
        return Inbound::Ignored;
    }

    match frame.event.as_str() {
        "postgres_changes" => match parse_change(&frame.payload) {
            Some(event) => Inbound::Change(event),
            None => Inbound::Ignored,
        },
        "phx_reply" if frame.reference.as_deref() == Some(JOIN_REF) => {
            let ok = frame.payload.get("status").and_then(Value::as_str) == Some("ok");
            let detail = frame
                .payload
                .get("response")
                .map(|r| r.to_string())
                .unwrap_or_default();
            Inbound::JoinReply { ok, detail }
        }
        "phx_close" => Inbound::ChannelClosed("channel closed by server".to_string()),
        "phx_error" => Inbound::ChannelClosed("channel error".to_string()),
        "system" => {
            let status = frame.payload.get("status").and_then(Value::as_str);
            if status == Some("error") {
                let message = frame
                    .payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown system error");
                Inbound::ChannelClosed(message.to_string())
            } else {
                tracing::debug!(payload = %frame.payload, "realtime system notice");
                Inbound::Ignored
            }
        }
        _ => Inbound::Ignored,
    }
}

/// Map a `postgres_changes` payload to a change event.
///
/// `INSERT`/`UPDATE` carry the full row in `record`; `DELETE` only
/// guarantees the primary key in `old_record`.
pub fn parse_change(payload: &Value) -> Option<ChangeEvent> {
    let data = payload.get("data")?;
    if data.get("table").and_then(Value::as_str) != Some(MESSAGES_TABLE) {
        return None;
    }

    match data.get("type").and_then(Value::as_str)? {
        "INSERT" => Message::from_record(data.get("record")?.clone()).map(ChangeEvent::Insert),
        "UPDATE" => Message::from_record(data.get("record")?.clone()).map(ChangeEvent::Update),
        "DELETE" => {
            let id = data.get("old_record")?.get("id")?.as_i64()?;
            Some(ChangeEvent::Delete { id })
        }
        other => {
            tracing::debug!(kind = other, "ignoring unknown change type");
            None
        }
    }
}

/// Connect, join the room's channel and hand back the live feed.
///
/// Returns once the server has acknowledged the join; the socket is then
/// driven by a background task until the handle is cancelled or dropped.
pub async fn subscribe(config: &BackendConfig, room: &str) -> Result<Subscription> {
    let mut ws = connect_websocket(&config.realtime_url()).await?;
    let topic = channel_topic(room);

    ws.send(PhoenixFrame::join(&topic, room, &config.anon_key).to_ws()?)
        .await?;
    await_join(&mut ws, &topic).await?;
    tracing::info!(topic = %topic, "joined realtime channel");

    let (feed, subscription) = Subscription::channel();
    tokio::spawn(drive_channel(ws, topic, feed));
    Ok(subscription)
}

async fn await_join(ws: &mut WsStream, topic: &str) -> Result<()> {
    while let Some(frame) = ws.next().await {
        match frame? {
            WsMessage::Text(text) => match decode_frame(topic, text.as_str()) {
                Inbound::JoinReply { ok: true, .. } => return Ok(()),
                Inbound::JoinReply { ok: false, detail } => {
                    return Err(ChatError::JoinRejected(detail))
                }
                Inbound::ChannelClosed(reason) => return Err(ChatError::JoinRejected(reason)),
                // Changes cannot precede the join reply on the same channel
                Inbound::Change(_) | Inbound::Ignored => {}
            },
            WsMessage::Close(_) => return Err(ChatError::ClosedBeforeJoin),
            _ => {}
        }
    }
    Err(ChatError::ClosedBeforeJoin)
}

/// Pump frames into the feed until cancelled, then leave and close.
async fn drive_channel(ws: WsStream, topic: String, feed: FeedSender) {
    let (mut sink, mut stream) = ws.split();
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    // The first tick fires immediately; the join just proved liveness
    heartbeat.tick().await;
    let mut next_ref: u64 = 2;

    loop {
        tokio::select! {
            _ = feed.cancelled() => {
                let leave = PhoenixFrame::leave(&topic, next_ref);
                if let Ok(msg) = leave.to_ws() {
                    let _ = sink.send(msg).await;
                }
                let _ = sink.close().await;
                tracing::info!(topic = %topic, "left realtime channel");
                return;
            }
            _ = heartbeat.tick() => {
                let beat = PhoenixFrame::heartbeat(next_ref);
                next_ref += 1;
                let sent = match beat.to_ws() {
                    Ok(msg) => sink.send(msg).await.map_err(ChatError::from),
                    Err(e) => Err(e),
                };
                if let Err(e) = sent {
                    tracing::warn!(error = %e, "realtime heartbeat failed");
                    feed.fail(e);
                    return;
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => match decode_frame(&topic, text.as_str()) {
                    Inbound::Change(event) => {
                        tracing::debug!(id = event.id(), "realtime change");
                        // A refused send means the subscriber is gone; the cancel branch tears down
                        let _ = feed.send(event);
                    }
                    Inbound::ChannelClosed(reason) => {
                        tracing::warn!(topic = %topic, reason = %reason, "realtime channel closed");
                        feed.fail(ChatError::JoinRejected(reason));
                        let _ = sink.close().await;
                        return;
                    }
                    Inbound::JoinReply { .. } | Inbound::Ignored => {}
                },
                Some(Ok(WsMessage::Close(_))) | None => {
                    tracing::info!(topic = %topic, "realtime socket closed by server");
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "realtime socket error");
                    feed.fail(e.into());
                    return;
                }
            }
        }
    }
}
