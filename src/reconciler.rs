//! Merges the bulk-loaded message list with the live change feed.
//!
//! The reconciler owns a single ordered `Vec<Message>`. Three independent
//! inputs mutate it: the one-off bulk load (`seed`), and the live feed's
//! insert/update/delete notifications. Delivery is at-least-once with no
//! ordering guarantee relative to the bulk snapshot, so every operation is
//! idempotent and tolerates events for rows it has never seen.
//!
//! Events that arrive through [`Reconciler::apply`] before the first `seed`
//! are buffered and replayed once the snapshot lands, so nothing the live
//! feed delivers while the fetch is in flight is lost.

use std::collections::{HashSet, VecDeque};

use crate::model::{ChangeEvent, Message};

/// Live events held while the bulk load is outstanding. The oldest are
/// dropped past this bound.
pub const MAX_PENDING_EVENTS: usize = 1000;

/// In-memory ordered view of the room.
#[derive(Debug, Default)]
pub struct Reconciler {
    messages: Vec<Message>,
    /// Live events received before the snapshot was applied.
    pending: VecDeque<ChangeEvent>,
    seeded: bool,
    /// Bumped on every effective change.
    revision: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with the fetched snapshot.
    ///
    /// The snapshot is expected in ascending `created_at` order and is kept
    /// as-is. Buffered live events are replayed on top of it afterwards.
    pub fn seed(&mut self, initial: Vec<Message>) {
        let mut seen = HashSet::with_capacity(initial.len());
        self.messages = initial.into_iter().filter(|m| seen.insert(m.id)).collect();
        self.seeded = true;
        self.revision += 1;

        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "replaying live events received before seed");
        }
        for event in pending {
            self.apply_event(event);
        }
    }

    /// Append `msg` unless an entry with the same id already exists.
    pub fn apply_insert(&mut self, msg: Message) -> bool {
        if self.position(msg.id).is_some() {
            return false;
        }
        self.messages.push(msg);
        self.revision += 1;
        true
    }

    /// Replace the entry with `msg.id` in place. Unknown ids are ignored.
    pub fn apply_update(&mut self, msg: Message) -> bool {
        match self.position(msg.id) {
            Some(idx) => {
                self.messages[idx] = msg;
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Remove the entry with `id`, if present.
    pub fn apply_delete(&mut self, id: i64) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.messages.remove(idx);
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Dispatch a live-feed event. Buffers until the first `seed`.
    pub fn apply(&mut self, event: ChangeEvent) -> bool {
        if !self.seeded {
            if self.pending.len() == MAX_PENDING_EVENTS {
                tracing::warn!(limit = MAX_PENDING_EVENTS, "dropping oldest buffered live event");
                self.pending.pop_front();
            }
            self.pending.push_back(event);
            return false;
        }
        self.apply_event(event)
    }

    fn apply_event(&mut self, event: ChangeEvent) -> bool {
        match event {
            ChangeEvent::Insert(msg) => self.apply_insert(msg),
            ChangeEvent::Update(msg) => self.apply_update(msg),
            ChangeEvent::Delete { id } => self.apply_delete(id),
        }
    }

    /// Forget everything, including buffered events.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.pending.clear();
        self.seeded = false;
        self.revision += 1;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: i64) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn msg(id: i64, body: &str) -> Message {
        Message {
            id,
            room: "lobby".into(),
            sender: "alice".into(),
            body: body.into(),
            created_at: Some(Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap()),
            is_deleted: false,
        }
    }

    fn ids(r: &Reconciler) -> Vec<i64> {
        r.messages().iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_seed_then_insert_appends() {
        let mut r = Reconciler::new();
        r.seed(vec![msg(1, "hi")]);
        assert!(r.apply_insert(msg(2, "yo")));
        assert_eq!(ids(&r), vec![1, 2]);
    }

    #[test]
    fn test_duplicate_insert_after_seed_is_noop() {
        let mut r = Reconciler::new();
        r.seed(vec![msg(1, "hi")]);
        let before = r.revision();
        assert!(!r.apply_insert(msg(1, "hi")));
        assert_eq!(r.len(), 1);
        assert_eq!(r.messages()[0].body, "hi");
        assert_eq!(r.revision(), before);
    }

    #[test]
    fn test_insert_sequence_keeps_one_entry_per_id() {
        let mut r = Reconciler::new();
        for id in [3, 1, 3, 2, 1, 1, 4, 2] {
            r.apply_insert(msg(id, "x"));
        }
        assert_eq!(ids(&r), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_update_unknown_id_never_inserts() {
        let mut r = Reconciler::new();
        r.seed(vec![]);
        assert!(!r.apply_update(msg(5, "x")));
        assert!(r.is_empty());
    }

    #[test]
    fn test_update_replaces_in_place() {
        let mut r = Reconciler::new();
        r.seed(vec![msg(1, "a"), msg(2, "b"), msg(3, "c")]);

        let mut edited = msg(2, "edited");
        // Even a changed timestamp must not move the entry
        edited.created_at = Some(Utc.timestamp_opt(1_800_000_000, 0).unwrap());
        assert!(r.apply_update(edited));

        assert_eq!(ids(&r), vec![1, 2, 3]);
        assert_eq!(r.get(2).unwrap().body, "edited");
    }

    #[test]
    fn test_soft_delete_keeps_identity() {
        let mut r = Reconciler::new();
        r.seed(vec![msg(1, "secret")]);
        let mut deleted = msg(1, "secret");
        deleted.is_deleted = true;
        assert!(r.apply_update(deleted));

        let m = r.get(1).unwrap();
        assert!(m.is_deleted);
        assert_eq!(m.sender, "alice");
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut r = Reconciler::new();
        r.seed(vec![msg(1, "a"), msg(2, "b")]);
        assert!(r.apply_delete(1));
        assert!(!r.apply_delete(1));
        assert_eq!(ids(&r), vec![2]);
        assert!(!r.apply_delete(99));
    }

    #[test]
    fn test_seed_overwrites_and_dedups() {
        let mut r = Reconciler::new();
        r.apply_insert(msg(9, "stale"));
        r.seed(vec![msg(1, "a"), msg(2, "b"), msg(1, "dup")]);
        assert_eq!(ids(&r), vec![1, 2]);
        assert_eq!(r.get(1).unwrap().body, "a");
    }

    #[test]
    fn test_events_before_seed_are_replayed() {
        let mut r = Reconciler::new();
        // Arrives while the bulk fetch is still in flight
        assert!(!r.apply(ChangeEvent::Insert(msg(3, "new"))));
        assert!(!r.apply(ChangeEvent::Update(msg(1, "edited"))));
        // Already contained in the snapshot
        assert!(!r.apply(ChangeEvent::Insert(msg(2, "b"))));
        assert!(r.is_empty());
        assert_eq!(r.pending_len(), 3);

        r.seed(vec![msg(1, "a"), msg(2, "b")]);

        assert_eq!(r.pending_len(), 0);
        assert_eq!(ids(&r), vec![1, 2, 3]);
        assert_eq!(r.get(1).unwrap().body, "edited");
    }

    #[test]
    fn test_pending_buffer_is_bounded() {
        let mut r = Reconciler::new();
        let total = MAX_PENDING_EVENTS as i64 + 5;
        for id in 1..=total {
            r.apply(ChangeEvent::Insert(msg(id, "x")));
        }
        assert_eq!(r.pending_len(), MAX_PENDING_EVENTS);

        r.seed(vec![]);
        assert_eq!(r.len(), MAX_PENDING_EVENTS);
        assert_eq!(r.messages()[0].id, 6);
        assert_eq!(r.messages().last().unwrap().id, total);
    }

    #[test]
    fn test_apply_after_seed_dispatches() {
        let mut r = Reconciler::new();
        r.seed(vec![msg(1, "a")]);
        assert!(r.apply(ChangeEvent::Insert(msg(2, "b"))));
        assert!(r.apply(ChangeEvent::Delete { id: 1 }));
        assert!(!r.apply(ChangeEvent::Delete { id: 1 }));
        assert_eq!(ids(&r), vec![2]);
    }

    #[test]
    fn test_reset_clears_pending_and_seeded() {
        let mut r = Reconciler::new();
        r.apply(ChangeEvent::Insert(msg(1, "a")));
        r.reset();
        assert!(!r.is_seeded());
        assert_eq!(r.pending_len(), 0);
        r.seed(vec![]);
        assert!(r.is_empty());
    }

    #[test]
    fn test_revision_tracks_changes_only() {
        let mut r = Reconciler::new();
        r.seed(vec![msg(1, "a")]);
        let rev = r.revision();
        r.apply_update(msg(42, "nope"));
        r.apply_delete(42);
        assert_eq!(r.revision(), rev);
        r.apply_insert(msg(2, "b"));
        assert_eq!(r.revision(), rev + 1);
    }
}
