//! Transient input state: composer text, join draft and the inline editor.
//!
//! Nothing here feeds the reconciler. Submitting only produces the text the
//! session should forward to the backend.

use crate::model::Message;

#[derive(Default, Debug)]
pub struct InputState {
    /// Current message being composed
    pub message_input: String,

    /// Name typed on the join screen
    pub draft_name: String,

    /// Message currently open in the inline editor
    pub editing: Option<i64>,

    /// Text of the inline editor
    pub edit_text: String,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the composer holds something worth sending.
    pub fn can_send(&self, sending: bool) -> bool {
        !sending && !self.message_input.trim().is_empty()
    }

    /// Whether the join button should be enabled.
    pub fn can_join(&self) -> bool {
        !self.draft_name.trim().is_empty()
    }

    /// Open `msg` in the inline editor, seeded with its current body.
    pub fn begin_edit(&mut self, msg: &Message) {
        self.editing = Some(msg.id);
        self.edit_text = msg.body.clone();
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.edit_text.clear();
    }

    /// Id and text of the open editor, if the text is not blank.
    pub fn pending_edit(&self) -> Option<(i64, &str)> {
        let id = self.editing?;
        let text = self.edit_text.trim();
        if text.is_empty() {
            None
        } else {
            Some((id, text))
        }
    }
}
