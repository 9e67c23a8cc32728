//! Cancellable handle over a live change feed.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{ChatError, Result};
use crate::model::ChangeEvent;

/// Item type produced by a feed transport: a change, or the error that ended it.
pub type FeedItem = Result<ChangeEvent>;

/// A live feed of row changes for one room.
///
/// `next` yields events in transport order until the feed ends. Cancelling
/// (explicitly or by dropping the handle) tells the transport task to leave
/// the channel and close its socket.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::UnboundedReceiver<FeedItem>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn new(events: mpsc::UnboundedReceiver<FeedItem>, cancel: CancellationToken) -> Self {
        Self { events, cancel }
    }

    /// Create a handle plus the sending half a transport task feeds.
    pub fn channel() -> (FeedSender, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        (
            FeedSender {
                tx,
                cancel: cancel.clone(),
            },
            Subscription::new(rx, cancel),
        )
    }

    /// Next change, `Some(Err(_))` once if the transport failed, then `None`.
    pub async fn next(&mut self) -> Option<FeedItem> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            item = self.events.recv() => item,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Transport side of a [`Subscription`].
#[derive(Clone, Debug)]
pub struct FeedSender {
    tx: mpsc::UnboundedSender<FeedItem>,
    cancel: CancellationToken,
}

impl FeedSender {
    /// Forward a change. Returns `false` once the subscriber has gone away.
    pub fn send(&self, event: ChangeEvent) -> bool {
        !self.cancel.is_cancelled() && self.tx.send(Ok(event)).is_ok()
    }

    /// Report the error that ends the feed.
    pub fn fail(&self, error: ChatError) {
        let _ = self.tx.send(Err(error));
    }

    /// Resolves when the subscriber cancels or drops its handle.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Message;

    fn insert(id: i64) -> ChangeEvent {
        ChangeEvent::Insert(Message {
            id,
            room: String::new(),
            sender: String::new(),
            body: String::new(),
            created_at: None,
            is_deleted: false,
        })
    }

    #[tokio::test]
    async fn test_events_then_end() {
        let (feed, mut sub) = Subscription::channel();
        assert!(feed.send(insert(1)));
        assert!(feed.send(ChangeEvent::Delete { id: 1 }));
        drop(feed);

        assert_eq!(sub.next().await.unwrap().unwrap().id(), 1);
        assert!(matches!(sub.next().await, Some(Ok(ChangeEvent::Delete { id: 1 }))));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_failure_is_reported() {
        let (feed, mut sub) = Subscription::channel();
        feed.fail(ChatError::ClosedBeforeJoin);
        drop(feed);
        assert!(matches!(sub.next().await, Some(Err(ChatError::ClosedBeforeJoin))));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_cancels_transport() {
        let (feed, sub) = Subscription::channel();
        assert!(!feed.is_cancelled());
        drop(sub);
        assert!(feed.is_cancelled());
        assert!(!feed.send(insert(2)));
        // Resolves immediately once cancelled
        feed.cancelled().await;
    }

    #[tokio::test]
    async fn test_cancel_stops_delivery() {
        let (feed, mut sub) = Subscription::channel();
        feed.send(insert(1));
        sub.cancel();
        assert!(sub.is_cancelled());
        assert!(sub.next().await.is_none());
    }
}
