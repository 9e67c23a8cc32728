use eframe::egui::ColorImage;

use crate::model::{ChangeEvent, Message, MessagePatch, NewMessage};

/// Actions sent from the UI to the Backend
#[derive(Debug, Clone)]
pub enum BackendAction {
    /// The chat view became active: bulk-load the room and open the live feed
    Mount { generation: u64, room: String },
    /// The chat view went away: cancel the live feed and discard in-flight loads
    Unmount,
    /// Insert a new message
    Send(NewMessage),
    /// Patch an existing message (edit body or soft delete)
    Update { id: i64, patch: MessagePatch },
    /// Download and decode an inline image preview
    FetchImage(String),
    /// Stop the backend loop
    Shutdown,
}

/// Which user request a `RequestFinished` event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Send,
    Edit,
    Delete,
}

impl RequestKind {
    pub fn for_patch(patch: &MessagePatch) -> Self {
        match patch {
            MessagePatch::SoftDelete => RequestKind::Delete,
            MessagePatch::Body(_) => RequestKind::Edit,
        }
    }
}

/// Events sent from the Backend to the UI
#[derive(Debug, Clone)]
pub enum GuiEvent {
    /// Bulk load finished
    Loaded { generation: u64, messages: Vec<Message> },
    /// Bulk load failed
    LoadFailed { generation: u64, error: String },
    /// The live feed is joined and delivering events
    Subscribed { generation: u64 },
    /// A live row change
    Change { generation: u64, event: ChangeEvent },
    /// The live feed ended (server close, transport error, or failed join)
    SubscriptionClosed { generation: u64, reason: Option<String> },
    /// A send/edit/delete request completed
    RequestFinished { kind: RequestKind, error: Option<String> },
    /// An image preview finished loading; `None` if it could not be shown
    ImageLoaded { url: String, image: Option<ColorImage> },
}
