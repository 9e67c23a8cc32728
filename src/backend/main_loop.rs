//! Backend main event loop: drains UI actions and runs network tasks.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use eframe::egui::ColorImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::ChatBackend;
use crate::images;
use crate::protocol::{BackendAction, GuiEvent, RequestKind};

/// How often the loop checks for new actions from the UI
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Grace period for the live feed to leave its channel on shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// State for the currently mounted chat view
struct Mounted {
    generation: u64,
    cancel: CancellationToken,
    feed: JoinHandle<()>,
}

impl Mounted {
    fn teardown(self) -> JoinHandle<()> {
        self.cancel.cancel();
        tracing::info!(generation = self.generation, "chat view unmounted");
        self.feed
    }
}

/// Run the backend event loop on a tokio runtime
pub fn run_backend<B: ChatBackend>(
    backend: B,
    action_rx: Receiver<BackendAction>,
    event_tx: Sender<GuiEvent>,
) {
    // Create a Tokio runtime for this thread
    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to create Tokio runtime");
            return;
        }
    };

    rt.block_on(async move {
        let backend = Arc::new(backend);
        let mut mounted: Option<Mounted> = None;

        loop {
            // Check for actions from the UI (non-blocking)
            loop {
                let action = match action_rx.try_recv() {
                    Ok(action) => action,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        tracing::debug!("UI channel closed, stopping backend");
                        shutdown(mounted.take()).await;
                        return;
                    }
                };

                match action {
                    BackendAction::Mount { generation, room } => {
                        if let Some(previous) = mounted.take() {
                            previous.teardown();
                        }
                        mounted = Some(mount(&backend, &event_tx, generation, room));
                    }

                    BackendAction::Unmount => {
                        if let Some(current) = mounted.take() {
                            current.teardown();
                        }
                    }

                    BackendAction::Send(new) => {
                        let backend = Arc::clone(&backend);
                        let event_tx = event_tx.clone();
                        tokio::spawn(async move {
                            let result = backend.insert_message(&new).await;
                            report(&event_tx, RequestKind::Send, result);
                        });
                    }

                    BackendAction::Update { id, patch } => {
                        let backend = Arc::clone(&backend);
                        let event_tx = event_tx.clone();
                        tokio::spawn(async move {
                            let kind = RequestKind::for_patch(&patch);
                            let result = backend.update_message(id, &patch).await;
                            report(&event_tx, kind, result);
                        });
                    }

                    BackendAction::FetchImage(url) => {
                        let backend = Arc::clone(&backend);
                        let event_tx = event_tx.clone();
                        tokio::spawn(async move {
                            let image = load_image(backend.as_ref(), &url).await;
                            let _ = event_tx.send(GuiEvent::ImageLoaded { url, image });
                        });
                    }

                    BackendAction::Shutdown => {
                        shutdown(mounted.take()).await;
                        return;
                    }
                }
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    });
}

/// Start the bulk load and the live feed for a freshly mounted view.
fn mount<B: ChatBackend>(
    backend: &Arc<B>,
    event_tx: &Sender<GuiEvent>,
    generation: u64,
    room: String,
) -> Mounted {
    tracing::info!(generation, room = %room, "chat view mounted");
    let cancel = CancellationToken::new();

    // Bulk load. A result that lands after unmount is dropped here.
    {
        let backend = Arc::clone(backend);
        let event_tx = event_tx.clone();
        let cancel = cancel.clone();
        let room = room.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => None,
                result = backend.fetch_messages(&room) => Some(result),
            };
            let Some(result) = result else {
                tracing::debug!(generation, "discarding bulk load after unmount");
                return;
            };
            if cancel.is_cancelled() {
                tracing::debug!(generation, "discarding bulk load after unmount");
                return;
            }
            let event = match result {
                Ok(messages) => {
                    tracing::info!(generation, count = messages.len(), "bulk load complete");
                    GuiEvent::Loaded { generation, messages }
                }
                Err(e) => {
                    tracing::warn!(generation, error = %e, "bulk load failed");
                    GuiEvent::LoadFailed {
                        generation,
                        error: e.to_string(),
                    }
                }
            };
            let _ = event_tx.send(event);
        });
    }

    // Live feed
    let feed = {
        let backend = Arc::clone(backend);
        let event_tx = event_tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let subscribed = tokio::select! {
                _ = cancel.cancelled() => return,
                subscribed = backend.subscribe(&room) => subscribed,
            };
            let mut subscription = match subscribed {
                Ok(subscription) => subscription,
                Err(e) => {
                    tracing::warn!(generation, error = %e, "live feed subscription failed");
                    let _ = event_tx.send(GuiEvent::SubscriptionClosed {
                        generation,
                        reason: Some(e.to_string()),
                    });
                    return;
                }
            };
            let _ = event_tx.send(GuiEvent::Subscribed { generation });

            let reason = loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        subscription.cancel();
                        return;
                    }
                    item = subscription.next() => match item {
                        Some(Ok(event)) => {
                            let _ = event_tx.send(GuiEvent::Change { generation, event });
                        }
                        Some(Err(e)) => break Some(e.to_string()),
                        None => break None,
                    }
                }
            };
            if cancel.is_cancelled() {
                return;
            }
            tracing::info!(generation, reason = ?reason, "live feed ended");
            let _ = event_tx.send(GuiEvent::SubscriptionClosed { generation, reason });
        })
    };

    Mounted {
        generation,
        cancel,
        feed,
    }
}

async fn shutdown(mounted: Option<Mounted>) {
    if let Some(current) = mounted {
        let feed = current.teardown();
        // Give the feed a moment to leave its channel cleanly
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, feed).await;
    }
    tracing::info!("backend stopped");
}

/// Fetch and decode a preview off the UI thread. Failures are logged and
/// reported as `None` so the UI can fall back to a link.
async fn load_image<B: ChatBackend>(backend: &B, url: &str) -> Option<ColorImage> {
    let bytes = match backend.fetch_image(url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(url, error = %e, "image fetch failed");
            return None;
        }
    };
    let decoded =
        tokio::task::spawn_blocking(move || images::decode_preview(&bytes, images::PREVIEW_MAX_WIDTH))
            .await;
    match decoded {
        Ok(Ok(image)) => Some(image),
        Ok(Err(e)) => {
            tracing::warn!(url, error = %e, "image decode failed");
            None
        }
        Err(e) => {
            tracing::error!(url, error = %e, "image decode task panicked");
            None
        }
    }
}

fn report(event_tx: &Sender<GuiEvent>, kind: RequestKind, result: crate::error::Result<()>) {
    let error = match result {
        Ok(()) => {
            tracing::debug!(?kind, "request finished");
            None
        }
        Err(e) => {
            tracing::warn!(?kind, error = %e, "request failed");
            Some(e.to_string())
        }
    };
    let _ = event_tx.send(GuiEvent::RequestFinished { kind, error });
}
