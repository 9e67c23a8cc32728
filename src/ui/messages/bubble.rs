//! What a single message bubble shows, independent of egui.

use crate::model::Message;

use super::format::{parse_segments, Segment};

/// Placeholder shown in place of a soft-deleted body
pub const DELETED_PLACEHOLDER: &str = "Message deleted";

#[derive(Debug, Clone, PartialEq)]
pub enum BubbleBody<'a> {
    /// Soft-deleted: the body is never shown
    Deleted,
    /// Our message, currently open in the inline editor
    Editing,
    Content(Vec<Segment<'a>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BubbleView<'a> {
    pub id: i64,
    pub own: bool,
    /// Sender label, omitted on our own messages
    pub sender: Option<&'a str>,
    pub body: BubbleBody<'a>,
    /// Edit/Delete affordances
    pub show_actions: bool,
    pub time: Option<String>,
}

/// Build the view for `msg` as seen by `display_name`, with `editing` the
/// id currently open in the editor, if any.
pub fn bubble_view<'a>(
    msg: &'a Message,
    display_name: Option<&str>,
    editing: Option<i64>,
) -> BubbleView<'a> {
    let own = display_name == Some(msg.sender.as_str());

    let body = if msg.is_deleted {
        BubbleBody::Deleted
    } else if own && editing == Some(msg.id) {
        BubbleBody::Editing
    } else {
        BubbleBody::Content(parse_segments(&msg.body))
    };

    BubbleView {
        id: msg.id,
        own,
        sender: if own { None } else { Some(msg.sender.as_str()) },
        show_actions: own && matches!(body, BubbleBody::Content(_)),
        body,
        time: msg.time_label(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: i64, sender: &str, body: &str, is_deleted: bool) -> Message {
        Message {
            id,
            room: "lobby".into(),
            sender: sender.into(),
            body: body.into(),
            created_at: None,
            is_deleted,
        }
    }

    #[test]
    fn test_other_message_shows_sender_and_content() {
        let m = msg(1, "bob", "hi http://x.com", false);
        let view = bubble_view(&m, Some("alice"), None);
        assert!(!view.own);
        assert_eq!(view.sender, Some("bob"));
        assert!(!view.show_actions);
        assert_eq!(
            view.body,
            BubbleBody::Content(vec![Segment::Text("hi "), Segment::Link("http://x.com")])
        );
    }

    #[test]
    fn test_own_message_hides_sender_and_offers_actions() {
        let m = msg(1, "alice", "hi", false);
        let view = bubble_view(&m, Some("alice"), None);
        assert!(view.own);
        assert_eq!(view.sender, None);
        assert!(view.show_actions);
    }

    #[test]
    fn test_deleted_body_is_suppressed() {
        let m = msg(1, "bob", "secret text", true);
        let view = bubble_view(&m, Some("alice"), None);
        assert_eq!(view.body, BubbleBody::Deleted);
        assert_eq!(view.id, 1);
        assert_eq!(view.sender, Some("bob"));

        // Our own deleted message: no actions, no editor
        let mine = msg(2, "alice", "oops", true);
        let view = bubble_view(&mine, Some("alice"), Some(2));
        assert_eq!(view.body, BubbleBody::Deleted);
        assert!(!view.show_actions);
    }

    #[test]
    fn test_editing_only_applies_to_own_message() {
        let mine = msg(3, "alice", "draft", false);
        let view = bubble_view(&mine, Some("alice"), Some(3));
        assert_eq!(view.body, BubbleBody::Editing);
        assert!(!view.show_actions);

        let theirs = msg(3, "bob", "draft", false);
        let view = bubble_view(&theirs, Some("alice"), Some(3));
        assert!(matches!(view.body, BubbleBody::Content(_)));
    }

    #[test]
    fn test_no_display_name_means_nothing_is_own() {
        let m = msg(1, "", "anon", false);
        let view = bubble_view(&m, None, None);
        assert!(!view.own);
        assert_eq!(view.sender, Some(""));
    }
}
