//! Conversation history projection.
//!
//! Derives, from a session's message list, the minimal exchange history
//! needed to seed a fresh conversation context: role and text only, error
//! notices excluded. Attachments and generated images are not replayed:
//! the textual record is enough for topical continuity, and shipping image
//! bytes on every rebuild would be needlessly costly.

use crate::client::HistoryTurn;
use crate::session::Message;

/// Project a message list into the exchange history used to seed a
/// conversation context. The result always replaces the previous context
/// wholesale; it is never patched incrementally.
pub fn project_history(messages: &[Message]) -> Vec<HistoryTurn> {
    messages
        .iter()
        .filter(|m| !m.is_error)
        .map(|m| HistoryTurn {
            role: m.role,
            text: m.content.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    #[test]
    fn empty_history_for_empty_session() {
        assert!(project_history(&[]).is_empty());
    }

    #[test]
    fn preserves_order_and_roles() {
        let messages = vec![
            Message::user("first question", Vec::new()),
            reply("first answer"),
            Message::user("second question", Vec::new()),
        ];

        let history = project_history(&messages);

        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].text, "first question");
        assert_eq!(history[1].role, Role::Model);
        assert_eq!(history[2].text, "second question");
    }

    #[test]
    fn error_messages_are_excluded() {
        let messages = vec![
            Message::user("hello", Vec::new()),
            Message::error("generation failed"),
            reply("recovered answer"),
        ];

        let history = project_history(&messages);

        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|turn| turn.text != "generation failed"));
    }

    #[test]
    fn attachments_and_images_are_not_replayed() {
        let mut with_image = reply("here is a picture");
        with_image.image = Some("data:image/png;base64,AAAA".to_string());
        let messages = vec![
            Message::user("draw a cat", vec!["data:image/png;base64,BBBB".to_string()]),
            with_image,
        ];

        let history = project_history(&messages);

        assert_eq!(history[0].text, "draw a cat");
        assert_eq!(history[1].text, "here is a picture");
    }

    fn reply(content: &str) -> Message {
        let mut message = Message::streaming_placeholder();
        message.content = content.to_string();
        message.is_streaming = false;
        message
    }
}
