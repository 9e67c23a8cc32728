//! Core ChatApp struct definition and initialization

use crate::backend::HostedBackend;
use crate::config::{self, BackendConfig, Settings};
use crate::error::Result;
use crate::input_state::InputState;
use crate::session::ChatSession;
use crate::ui::{self, BubbleAction, ChatTheme, PreviewCache};

pub struct ChatApp {
    /// None when the backend could not be configured
    pub session: Option<ChatSession>,
    pub startup_error: Option<String>,

    pub input: InputState,
    pub previews: PreviewCache,
    pub settings: Settings,
    pub theme: ChatTheme,

    /// Reconciler revision last rendered; a change triggers auto-scroll
    pub last_revision: u64,
}

impl ChatApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = config::load_settings().unwrap_or_default();
        let theme = ChatTheme::by_name(&settings.theme);

        ui::apply_app_style(&cc.egui_ctx, &theme);

        let (session, startup_error) = match start_session(&settings) {
            Ok(session) => (Some(session), None),
            Err(e) => {
                tracing::error!(error = %e, "backend unavailable");
                (None, Some(e.to_string()))
            }
        };

        Self::with_session(session, startup_error, settings, theme)
    }

    /// Assemble the app around an already started session.
    pub fn with_session(
        session: Option<ChatSession>,
        startup_error: Option<String>,
        settings: Settings,
        theme: ChatTheme,
    ) -> Self {
        let mut app = Self {
            session,
            startup_error,
            input: InputState::new(),
            previews: PreviewCache::new(),
            settings,
            theme,
            last_revision: 0,
        };
        if let Some(session) = app.session.as_mut() {
            session.restore_name(app.settings.chat_name.as_deref());
        }
        app
    }

    /// Whether the chat view (rather than the join screen) should show.
    pub fn has_joined(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.display_name().is_some())
    }

    /// Confirm the draft name from the join screen and persist it.
    pub fn handle_join(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.join(&self.input.draft_name) {
            Ok(name) => {
                tracing::info!(name = %name, "joined");
                self.input.draft_name.clear();
                self.settings.chat_name = Some(name);
                if let Err(e) = config::save_settings(&self.settings) {
                    tracing::warn!(error = %e, "failed to persist settings");
                }
            }
            Err(e) => session.push_status(e.to_string()),
        }
    }

    /// Send the composer text. A locally refused message stays in the
    /// composer. Once dispatched the composer clears whether or not the
    /// request later succeeds; failures surface as toasts.
    pub fn handle_send(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.send(&self.input.message_input) {
            Ok(()) => self.input.message_input.clear(),
            Err(e) => session.push_status(e.to_string()),
        }
    }

    pub fn handle_bubble_action(&mut self, action: BubbleAction) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match action {
            BubbleAction::BeginEdit(id) => {
                if let Some(msg) = session.reconciler().get(id) {
                    self.input.begin_edit(msg);
                }
            }
            BubbleAction::CancelEdit => self.input.cancel_edit(),
            BubbleAction::SaveEdit => {
                let Some((id, text)) = self.input.pending_edit() else {
                    self.input.cancel_edit();
                    return;
                };
                match session.edit(id, text) {
                    Ok(()) => self.input.cancel_edit(),
                    Err(e) => session.push_status(e.to_string()),
                }
            }
            BubbleAction::Delete(id) => {
                if self.input.editing == Some(id) {
                    self.input.cancel_edit();
                }
                session.delete(id);
            }
            BubbleAction::LoadImage(url) => session.request_image(&url),
        }
    }
}

fn start_session(settings: &Settings) -> Result<ChatSession> {
    let backend_config = BackendConfig::resolve(settings)?;
    let room = backend_config.room.clone();
    let backend = HostedBackend::new(backend_config)?;
    Ok(ChatSession::start(backend, room))
}
