//! The chat session: one explicitly constructed object that owns the
//! reconciler, the display name, the backend channels and the
//! mount/unmount lifecycle of the chat view.
//!
//! The session is the only thing that mutates the reconciler, and it does so
//! from `process_events` on the UI thread. User actions are forwarded to the
//! backend; their effects come back through the live feed.

use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};
use eframe::egui::ColorImage;

use crate::backend::{run_backend, ChatBackend};
use crate::error::{ChatError, Result};
use crate::model::{Message, MessagePatch, NewMessage};
use crate::protocol::{BackendAction, GuiEvent, RequestKind};
use crate::reconciler::Reconciler;
use crate::validation;

/// How long status toasts stay on screen
pub const STATUS_TTL_SECS: u64 = 4;

/// Connection state of the live feed, for the header indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Connecting,
    Live,
    Closed(Option<String>),
}

pub struct ChatSession {
    room: String,
    display_name: Option<String>,
    reconciler: Reconciler,

    action_tx: Sender<BackendAction>,
    event_rx: Receiver<GuiEvent>,
    backend_thread: Option<JoinHandle<()>>,

    /// Incremented on every mount; events from older mounts are dropped
    generation: u64,
    mounted: bool,
    loading: bool,
    sending: bool,
    feed: FeedStatus,

    /// Finished image previews waiting to become textures
    loaded_images: Vec<(String, Option<ColorImage>)>,

    /// Status toast messages with creation time (auto-expire)
    pub status_messages: Vec<(String, Instant)>,
}

impl ChatSession {
    /// Spawn the backend thread for `backend` and build a session on top of it.
    pub fn start<B: ChatBackend>(backend: B, room: impl Into<String>) -> Self {
        let (action_tx, action_rx) = unbounded::<BackendAction>();
        let (event_tx, event_rx) = unbounded::<GuiEvent>();

        let handle = thread::Builder::new()
            .name("oomfie-backend".into())
            .spawn(move || run_backend(backend, action_rx, event_tx));

        let mut session = Self::with_channels(action_tx, event_rx, room);
        match handle {
            Ok(handle) => session.backend_thread = Some(handle),
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn backend thread");
                session.push_status(format!("Backend failed to start: {}", e));
            }
        }
        session
    }

    /// Build a session over existing channels (the backend runs elsewhere).
    pub fn with_channels(
        action_tx: Sender<BackendAction>,
        event_rx: Receiver<GuiEvent>,
        room: impl Into<String>,
    ) -> Self {
        Self {
            room: room.into(),
            display_name: None,
            reconciler: Reconciler::new(),
            action_tx,
            event_rx,
            backend_thread: None,
            generation: 0,
            mounted: false,
            loading: false,
            sending: false,
            feed: FeedStatus::Idle,
            loaded_images: Vec::new(),
            status_messages: Vec::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Activate the chat view: bulk-load and subscribe. No-op if mounted.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.generation += 1;
        self.mounted = true;
        self.loading = true;
        self.feed = FeedStatus::Connecting;
        self.reconciler.reset();
        tracing::debug!(generation = self.generation, "mounting chat view");
        self.dispatch(BackendAction::Mount {
            generation: self.generation,
            room: self.room.clone(),
        });
    }

    /// Deactivate the chat view and release the live feed.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.loading = false;
        self.feed = FeedStatus::Idle;
        self.dispatch(BackendAction::Unmount);
    }

    /// Stop the backend thread. The session is inert afterwards.
    pub fn shutdown(&mut self) {
        self.unmount();
        let _ = self.action_tx.send(BackendAction::Shutdown);
        if let Some(handle) = self.backend_thread.take() {
            if handle.join().is_err() {
                tracing::error!("backend thread panicked");
            }
        }
    }

    // ---------------------------------------------------------------------
    // Identity
    // ---------------------------------------------------------------------

    /// Set the display name. Returns the trimmed name that was stored.
    pub fn join(&mut self, name: &str) -> Result<String> {
        let name = validation::validate_display_name(name)?;
        self.display_name = Some(name.clone());
        Ok(name)
    }

    /// Restore a previously persisted name, ignoring invalid values.
    pub fn restore_name(&mut self, saved: Option<&str>) {
        if let Some(saved) = saved {
            match validation::validate_display_name(saved) {
                Ok(name) => self.display_name = Some(name),
                Err(e) => tracing::warn!(error = %e, "ignoring saved display name"),
            }
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Whether `msg` was sent under our display name.
    pub fn is_own(&self, msg: &Message) -> bool {
        self.display_name.as_deref() == Some(msg.sender.as_str())
    }

    // ---------------------------------------------------------------------
    // User actions
    // ---------------------------------------------------------------------

    /// Send a message. Refused while another send is in flight, before
    /// joining, or for blank text.
    pub fn send(&mut self, text: &str) -> Result<()> {
        if self.sending {
            return Err(ChatError::Validation("Still sending".to_string()));
        }
        let sender = self
            .display_name
            .clone()
            .ok_or_else(|| ChatError::Validation("Join before sending".to_string()))?;
        let body = validation::validate_body(text)?;

        self.sending = true;
        self.dispatch(BackendAction::Send(NewMessage {
            room: self.room.clone(),
            sender,
            body,
        }));
        Ok(())
    }

    /// Replace the body of message `id`.
    pub fn edit(&mut self, id: i64, text: &str) -> Result<()> {
        let body = validation::validate_body(text)?;
        self.dispatch(BackendAction::Update {
            id,
            patch: MessagePatch::Body(body),
        });
        Ok(())
    }

    /// Soft-delete message `id`.
    pub fn delete(&mut self, id: i64) {
        self.dispatch(BackendAction::Update {
            id,
            patch: MessagePatch::SoftDelete,
        });
    }

    /// Ask the backend for an inline image preview.
    pub fn request_image(&mut self, url: &str) {
        self.dispatch(BackendAction::FetchImage(url.to_string()));
    }

    /// Previews that arrived since the last call.
    pub fn take_loaded_images(&mut self) -> Vec<(String, Option<ColorImage>)> {
        std::mem::take(&mut self.loaded_images)
    }

    fn dispatch(&mut self, action: BackendAction) {
        if self.action_tx.send(action).is_err() {
            tracing::error!("backend channel closed");
            self.sending = false;
            self.push_status(ChatError::BackendGone.to_string());
        }
    }

    // ---------------------------------------------------------------------
    // Event processing
    // ---------------------------------------------------------------------

    /// Drain pending backend events. Returns true if the message list changed.
    pub fn process_events(&mut self) -> bool {
        let before = self.reconciler.revision();
        while let Ok(event) = self.event_rx.try_recv() {
            self.process_single_event(event);
        }
        self.reconciler.revision() != before
    }

    fn process_single_event(&mut self, event: GuiEvent) {
        match event {
            GuiEvent::RequestFinished { kind, error } => {
                if kind == RequestKind::Send {
                    self.sending = false;
                }
                if let Some(error) = error {
                    let label = match kind {
                        RequestKind::Send => "Send failed",
                        RequestKind::Edit => "Edit failed",
                        RequestKind::Delete => "Delete failed",
                    };
                    self.push_status(format!("{}: {}", label, error));
                }
            }

            // Previews are keyed by URL, not by mount
            GuiEvent::ImageLoaded { url, image } => {
                self.loaded_images.push((url, image));
            }

            GuiEvent::Loaded { generation, messages } => {
                if !self.is_current(generation) {
                    tracing::debug!(generation, "dropping stale bulk load");
                    return;
                }
                self.loading = false;
                self.reconciler.seed(messages);
            }

            GuiEvent::LoadFailed { generation, error } => {
                if !self.is_current(generation) {
                    return;
                }
                self.loading = false;
                // Live events keep flowing onto an empty list
                self.reconciler.seed(Vec::new());
                self.push_status(format!("Could not load messages: {}", error));
            }

            GuiEvent::Subscribed { generation } => {
                if self.is_current(generation) {
                    self.feed = FeedStatus::Live;
                }
            }

            GuiEvent::Change { generation, event } => {
                if !self.is_current(generation) {
                    return;
                }
                tracing::debug!(id = event.id(), "applying live change");
                self.reconciler.apply(event);
            }

            GuiEvent::SubscriptionClosed { generation, reason } => {
                if !self.is_current(generation) {
                    return;
                }
                if let Some(reason) = &reason {
                    self.push_status(format!("Live updates stopped: {}", reason));
                }
                self.feed = FeedStatus::Closed(reason);
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.mounted && generation == self.generation
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn messages(&self) -> &[Message] {
        self.reconciler.messages()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn feed_status(&self) -> &FeedStatus {
        &self.feed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn push_status(&mut self, message: String) {
        self.status_messages.push((message, Instant::now()));
    }

    /// Purge status messages older than the given duration.
    pub fn purge_old_status_messages(&mut self, max_age_secs: u64) {
        self.status_messages
            .retain(|(_, created)| created.elapsed().as_secs() < max_age_secs);
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.unmount();
        let _ = self.action_tx.send(BackendAction::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChangeEvent;

    fn msg(id: i64, sender: &str, body: &str) -> Message {
        Message {
            id,
            room: "lobby".into(),
            sender: sender.into(),
            body: body.into(),
            created_at: None,
            is_deleted: false,
        }
    }

    fn session() -> (ChatSession, Receiver<BackendAction>, Sender<GuiEvent>) {
        let (action_tx, action_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        (
            ChatSession::with_channels(action_tx, event_rx, "lobby"),
            action_rx,
            event_tx,
        )
    }

    #[test]
    fn test_mount_dispatches_generation() {
        let (mut s, actions, _events) = session();
        s.mount();
        s.mount(); // idempotent while mounted
        assert!(s.is_loading());
        match actions.try_recv().unwrap() {
            BackendAction::Mount { generation, room } => {
                assert_eq!(generation, 1);
                assert_eq!(room, "lobby");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(actions.try_recv().is_err());
    }

    #[test]
    fn test_loaded_seeds_and_clears_loading() {
        let (mut s, _actions, events) = session();
        s.mount();
        events
            .send(GuiEvent::Loaded {
                generation: 1,
                messages: vec![msg(1, "a", "hi")],
            })
            .unwrap();
        assert!(s.process_events());
        assert!(!s.is_loading());
        assert_eq!(s.messages().len(), 1);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let (mut s, _actions, events) = session();
        s.mount();
        s.unmount();
        s.mount();
        assert_eq!(s.generation(), 2);

        events
            .send(GuiEvent::Loaded {
                generation: 1,
                messages: vec![msg(1, "a", "old")],
            })
            .unwrap();
        events
            .send(GuiEvent::Change {
                generation: 1,
                event: ChangeEvent::Insert(msg(2, "a", "old")),
            })
            .unwrap();
        assert!(!s.process_events());
        assert!(s.is_loading());
        assert!(s.messages().is_empty());
    }

    #[test]
    fn test_load_after_unmount_is_discarded() {
        let (mut s, _actions, events) = session();
        s.mount();
        s.unmount();
        events
            .send(GuiEvent::Loaded {
                generation: 1,
                messages: vec![msg(1, "a", "late")],
            })
            .unwrap();
        s.process_events();
        assert!(s.messages().is_empty());
        assert!(!s.reconciler().is_seeded());
    }

    #[test]
    fn test_send_requires_name_and_text() {
        let (mut s, actions, _events) = session();
        assert!(s.send("hello").is_err());
        s.join("  alice ").unwrap();
        assert_eq!(s.display_name(), Some("alice"));
        assert!(s.send("   ").is_err());
        assert!(!s.is_sending());
        assert!(actions.try_recv().is_err());
    }

    #[test]
    fn test_sending_flag_blocks_duplicate_send() {
        let (mut s, actions, events) = session();
        s.join("alice").unwrap();
        s.send(" hello ").unwrap();
        assert!(s.is_sending());
        assert!(s.send("again").is_err());

        match actions.try_recv().unwrap() {
            BackendAction::Send(new) => {
                assert_eq!(new.body, "hello");
                assert_eq!(new.sender, "alice");
                assert_eq!(new.room, "lobby");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(actions.try_recv().is_err());

        events
            .send(GuiEvent::RequestFinished {
                kind: RequestKind::Send,
                error: Some("boom".into()),
            })
            .unwrap();
        s.process_events();
        assert!(!s.is_sending());
        assert_eq!(s.status_messages.len(), 1);
        assert!(s.send("again").is_ok());
    }

    #[test]
    fn test_edit_and_delete_dispatch_patches() {
        let (mut s, actions, _events) = session();
        s.edit(4, " new text ").unwrap();
        assert!(s.edit(4, "  ").is_err());
        s.delete(5);

        assert!(matches!(
            actions.try_recv().unwrap(),
            BackendAction::Update { id: 4, patch: MessagePatch::Body(ref b) } if b == "new text"
        ));
        assert!(matches!(
            actions.try_recv().unwrap(),
            BackendAction::Update { id: 5, patch: MessagePatch::SoftDelete }
        ));
    }

    #[test]
    fn test_is_own_matches_display_name() {
        let (mut s, _actions, _events) = session();
        let m = msg(1, "alice", "hi");
        assert!(!s.is_own(&m));
        s.restore_name(Some("alice"));
        assert!(s.is_own(&m));
        assert!(!s.is_own(&msg(2, "bob", "hi")));
    }

    #[test]
    fn test_restore_name_ignores_invalid() {
        let (mut s, _actions, _events) = session();
        s.restore_name(Some("   "));
        assert_eq!(s.display_name(), None);
        s.restore_name(None);
        assert_eq!(s.display_name(), None);
    }

    #[test]
    fn test_subscription_status() {
        let (mut s, _actions, events) = session();
        s.mount();
        assert_eq!(s.feed_status(), &FeedStatus::Connecting);
        events.send(GuiEvent::Subscribed { generation: 1 }).unwrap();
        s.process_events();
        assert_eq!(s.feed_status(), &FeedStatus::Live);
        events
            .send(GuiEvent::SubscriptionClosed {
                generation: 1,
                reason: Some("socket error".into()),
            })
            .unwrap();
        s.process_events();
        assert_eq!(s.feed_status(), &FeedStatus::Closed(Some("socket error".into())));
        assert_eq!(s.status_messages.len(), 1);
    }

    #[test]
    fn test_dead_backend_resets_sending() {
        let (mut s, actions, _events) = session();
        drop(actions);
        s.join("alice").unwrap();
        s.send("hi").unwrap();
        assert!(!s.is_sending());
        assert_eq!(s.status_messages.len(), 1);
    }

    #[test]
    fn test_image_results_are_queued_for_the_ui() {
        let (mut s, actions, events) = session();
        s.request_image("https://x.com/a.png");
        assert!(matches!(
            actions.try_recv().unwrap(),
            BackendAction::FetchImage(url) if url == "https://x.com/a.png"
        ));

        events
            .send(GuiEvent::ImageLoaded {
                url: "https://x.com/a.png".into(),
                image: None,
            })
            .unwrap();
        // Previews never count as a list change
        assert!(!s.process_events());
        let loaded = s.take_loaded_images();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "https://x.com/a.png");
        assert!(s.take_loaded_images().is_empty());
    }
}
