use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::ImageDataUri;

/// Identity of a transcript entry.
///
/// Ids are derived from the creation time in unix milliseconds and are kept
/// strictly increasing by the session store, so ordering by id is ordering
/// by insertion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Returns an id derived from `now` that sorts after `previous`.
    pub fn next_after(previous: Option<MessageId>, now: OffsetDateTime) -> Self {
        let millis = (now.unix_timestamp_nanos() / 1_000_000).max(0) as u64;
        match previous {
            Some(MessageId(last)) if millis <= last => MessageId(last + 1),
            _ => MessageId(millis),
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who wrote a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person using the widget.
    User,

    /// The assistant, either the local welcome or a completion reply.
    Assistant,
}

/// One entry in the chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Identity, unique and increasing within a session.
    pub id: MessageId,

    /// The text of the message; empty when only an image was sent.
    pub text: String,

    /// Who wrote the message.
    pub sender: Sender,

    /// Creation time, used for display only.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,

    /// An attached image, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageDataUri>,
}

impl Message {
    /// Creates a message stamped with `timestamp`.
    pub fn new(
        id: MessageId,
        text: impl Into<String>,
        sender: Sender,
        timestamp: OffsetDateTime,
        image: Option<ImageDataUri>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            sender,
            timestamp,
            image,
        }
    }

    /// Returns true if the user wrote this message.
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// Returns true if the assistant wrote this message.
    pub fn is_assistant(&self) -> bool {
        self.sender == Sender::Assistant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};
    use time::macros::datetime;

    #[test]
    fn ids_follow_the_clock() {
        let now = datetime!(2024-03-01 09:30:00 UTC);
        let id = MessageId::next_after(None, now);
        assert_eq!(id.0, 1_709_285_400_000);
    }

    #[test]
    fn ids_stay_increasing_within_a_millisecond() {
        let now = datetime!(2024-03-01 09:30:00 UTC);
        let first = MessageId::next_after(None, now);
        let second = MessageId::next_after(Some(first), now);
        let third = MessageId::next_after(Some(second), now);
        assert!(first < second && second < third);
        assert_eq!(third.0, first.0 + 2);
    }

    #[test]
    fn message_serialization() {
        let message = Message::new(
            MessageId(7),
            "Hello",
            Sender::Assistant,
            datetime!(2024-03-01 09:30:00 UTC),
            None,
        );
        let json = to_value(&message).unwrap();
        assert_eq!(
            json,
            json!({
                "id": 7,
                "text": "Hello",
                "sender": "assistant",
                "timestamp": "2024-03-01T09:30:00Z"
            })
        );
    }
}
