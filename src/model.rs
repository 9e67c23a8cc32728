//! Chat message rows and the change events delivered by the live feed.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A row of the `messages` table.
///
/// Only `id` is mandatory. Every other column falls back to its default so a
/// partially populated record still renders instead of being rejected.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub room: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_deleted: bool,
}

impl Message {
    /// Build a message from a JSON record, returning `None` when the record
    /// carries no usable id.
    pub fn from_record(record: serde_json::Value) -> Option<Self> {
        match serde_json::from_value::<Message>(record) {
            Ok(msg) => Some(msg),
            Err(e) => {
                tracing::warn!(error = %e, "dropping unreadable message record");
                None
            }
        }
    }

    /// Short `HH:MM` label for the bubble footer.
    pub fn time_label(&self) -> Option<String> {
        self.created_at
            .map(|ts| ts.with_timezone(&chrono::Local).format("%H:%M").to_string())
    }
}

/// Insert payload: the backend fills in `id`, `created_at` and `is_deleted`.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct NewMessage {
    pub room: String,
    pub sender: String,
    pub body: String,
}

/// Column changes this client is allowed to make to an existing row.
#[derive(Clone, Debug, PartialEq)]
pub enum MessagePatch {
    /// Flip `is_deleted` to true; the row stays in storage.
    SoftDelete,
    /// Replace the body text.
    Body(String),
}

impl MessagePatch {
    /// JSON body for the PATCH request.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MessagePatch::SoftDelete => serde_json::json!({ "is_deleted": true }),
            MessagePatch::Body(body) => serde_json::json!({ "body": body }),
        }
    }

    /// Apply the patch to a local copy, mirroring what the backend will store.
    #[cfg(test)]
    pub(crate) fn apply_to(&self, msg: &mut Message) {
        match self {
            MessagePatch::SoftDelete => msg.is_deleted = true,
            MessagePatch::Body(body) => msg.body = body.clone(),
        }
    }
}

/// A row-level change pushed by the live feed.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeEvent {
    Insert(Message),
    Update(Message),
    /// Physical removal. Only the primary key is guaranteed on delete payloads.
    Delete { id: i64 },
}

impl ChangeEvent {
    pub fn id(&self) -> i64 {
        match self {
            ChangeEvent::Insert(m) | ChangeEvent::Update(m) => m.id,
            ChangeEvent::Delete { id } => *id,
        }
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept RFC 3339 as well as the Postgres text form
/// (`2024-05-01 10:00:00.123+00`); anything else becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_timestamp))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(ts) = DateTime::parse_from_str(raw, fmt) {
            return Some(ts.with_timezone(&Utc));
        }
    }
    // Timestamp without zone: treat as UTC
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_full_record() {
        let msg: Message = serde_json::from_value(serde_json::json!({
            "id": 7,
            "room": "lobby",
            "sender": "alice",
            "body": "hello",
            "created_at": "2024-05-01T10:00:00.5+00:00",
            "is_deleted": false
        }))
        .unwrap();
        assert_eq!(msg.id, 7);
        assert_eq!(msg.sender, "alice");
        assert_eq!(
            msg.created_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + chrono::Duration::milliseconds(500))
        );
        assert!(!msg.is_deleted);
    }

    #[test]
    fn test_missing_fields_default() {
        let msg = Message::from_record(serde_json::json!({ "id": 3, "is_deleted": null })).unwrap();
        assert_eq!(msg.id, 3);
        assert_eq!(msg.body, "");
        assert_eq!(msg.sender, "");
        assert_eq!(msg.created_at, None);
        assert!(!msg.is_deleted);
    }

    #[test]
    fn test_null_columns_default() {
        let msg = Message::from_record(serde_json::json!({
            "id": 1,
            "room": null,
            "sender": "alice",
            "body": null,
            "created_at": null,
            "is_deleted": null
        }))
        .unwrap();
        assert_eq!(msg.id, 1);
        assert_eq!(msg.room, "");
        assert_eq!(msg.sender, "alice");
        assert_eq!(msg.body, "");
        assert_eq!(msg.created_at, None);
        assert!(!msg.is_deleted);
    }

    #[test]
    fn test_record_without_id_is_dropped() {
        assert!(Message::from_record(serde_json::json!({ "body": "orphan" })).is_none());
        assert!(Message::from_record(serde_json::json!({ "id": "seven" })).is_none());
    }

    #[test]
    fn test_bad_timestamp_is_absent() {
        let msg = Message::from_record(serde_json::json!({ "id": 1, "created_at": "yesterday" })).unwrap();
        assert_eq!(msg.created_at, None);
    }

    #[test]
    fn test_parse_timestamp_postgres_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01 10:00:00+00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_patch_json() {
        assert_eq!(MessagePatch::SoftDelete.to_json(), serde_json::json!({ "is_deleted": true }));
        assert_eq!(
            MessagePatch::Body("new".into()).to_json(),
            serde_json::json!({ "body": "new" })
        );
    }

    #[test]
    fn test_new_message_serializes_three_columns() {
        let new = NewMessage {
            room: "lobby".into(),
            sender: "bob".into(),
            body: "hi".into(),
        };
        assert_eq!(
            serde_json::to_value(&new).unwrap(),
            serde_json::json!({ "room": "lobby", "sender": "bob", "body": "hi" })
        );
    }
}
