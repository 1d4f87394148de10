//! Chat message types.
//!
//! This module defines the messages sent to a completion endpoint: roles,
//! content segments, and the append-only [`Conversation`] sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System instructions.
    System,
    /// End-user input.
    User,
    /// Model output echoed back into the conversation.
    Assistant,
    /// Tool invocation results.
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// One part of a multi-part message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// An image, referenced by URL or inlined as base64 data.
    Image {
        /// URL or `data:` URI of the image.
        source: String,
        /// Media type, e.g. `image/png`, when known. A plain URL carries
        /// none; the provider resolves the type when it fetches the image.
        #[serde(skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
    },
    /// Audio inlined as base64 data.
    Audio {
        /// Base64-encoded audio bytes.
        data: String,
        /// Media type, e.g. `audio/wav`.
        media_type: String,
    },
}

impl Segment {
    /// Create a text segment.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an image segment from a URL.
    #[must_use]
    pub fn image_url(url: impl Into<String>) -> Self {
        Self::Image {
            source: url.into(),
            media_type: None,
        }
    }

    /// Create an image segment from raw bytes.
    #[must_use]
    pub fn image_bytes(bytes: &[u8], media_type: impl Into<String>) -> Self {
        use base64::Engine;
        let media_type = media_type.into();
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self::Image {
            source: format!("data:{};base64,{}", media_type, encoded),
            media_type: Some(media_type),
        }
    }

    /// Create an audio segment from raw bytes.
    #[must_use]
    pub fn audio_bytes(bytes: &[u8], media_type: impl Into<String>) -> Self {
        use base64::Engine;
        Self::Audio {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.into(),
        }
    }

    /// Get the text content if this is a text segment.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored the message.
    pub role: Role,
    /// The content segments. A plain-text message has one text segment.
    pub segments: Vec<Segment>,
    /// When this message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message with the given role and segments.
    #[must_use]
    pub fn new(role: Role, segments: Vec<Segment>) -> Self {
        Self {
            role,
            segments,
            timestamp: Utc::now(),
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![Segment::text(text)])
    }

    /// Create a user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Segment::text(text)])
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![Segment::text(text)])
    }

    /// Create a tool message.
    #[must_use]
    pub fn tool(text: impl Into<String>) -> Self {
        Self::new(Role::Tool, vec![Segment::text(text)])
    }

    /// Add a segment.
    #[must_use]
    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Concatenated text content across all text segments.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.segments
            .iter()
            .filter_map(Segment::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    /// Whether the message has any non-text segments.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.segments.iter().any(|s| s.as_text().is_none())
    }
}

/// An ordered sequence of messages.
///
/// Append-only within one attempt; the reask loop snapshots a conversation
/// with [`Conversation::snapshot`] instead of mutating a shared copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation from a single user prompt.
    #[must_use]
    pub fn from_user(text: impl Into<String>) -> Self {
        let mut c = Self::new();
        c.push(Message::user(text));
        c
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append a message, builder style.
    #[must_use]
    pub fn with(mut self, message: Message) -> Self {
        self.push(message);
        self
    }

    /// The messages in order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// An independent copy for building the next attempt.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// The last message, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Iterate over messages with a given role.
    pub fn with_role(&self, role: Role) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.role == role)
    }
}

impl FromIterator<Message> for Conversation {
    fn from_iter<T: IntoIterator<Item = Message>>(iter: T) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let m = Message::system("be brief");
        assert_eq!(m.role, Role::System);
        assert_eq!(m.text_content(), "be brief");
        assert!(!m.is_multipart());
    }

    #[test]
    fn test_multipart_message() {
        let m = Message::user("what is in this image?")
            .with_segment(Segment::image_url("https://example.com/cat.png"));
        assert!(m.is_multipart());
        assert_eq!(m.segments.len(), 2);
    }

    #[test]
    fn test_image_bytes_data_uri() {
        let seg = Segment::image_bytes(&[1, 2, 3], "image/png");
        if let Segment::Image { source, media_type } = seg {
            assert!(source.starts_with("data:image/png;base64,"));
            assert_eq!(media_type.as_deref(), Some("image/png"));
        } else {
            panic!("expected image segment");
        }
    }

    #[test]
    fn test_image_url_claims_no_media_type() {
        let seg = Segment::image_url("https://example.com/photo.jpg");
        if let Segment::Image { source, media_type } = seg {
            assert_eq!(source, "https://example.com/photo.jpg");
            assert_eq!(media_type, None);
        } else {
            panic!("expected image segment");
        }
    }

    #[test]
    fn test_conversation_append_only() {
        let mut c = Conversation::from_user("hello");
        c.push(Message::assistant("hi"));

        let snap = c.snapshot();
        c.push(Message::user("more"));

        assert_eq!(snap.len(), 2);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_conversation_with_role() {
        let c = Conversation::new()
            .with(Message::system("sys"))
            .with(Message::user("u1"))
            .with(Message::user("u2"));

        assert_eq!(c.with_role(Role::User).count(), 2);
        assert_eq!(c.with_role(Role::Assistant).count(), 0);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_serde_roundtrip() {
        let c = Conversation::from_user("hello").with(Message::assistant("hi"));
        let json = serde_json::to_string(&c).unwrap();
        let parsed: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(c, parsed);
    }
}
