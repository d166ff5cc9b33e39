use serde::{Deserialize, Serialize};

use crate::types::ImageDataUri;

/// Role of a message sent to the completion endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Fixed instructions ahead of the conversation.
    System,

    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

/// One part of a multimodal message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// A run of text.
    Text {
        /// The text.
        text: String,
    },

    /// An image, passed by URL (here always a data URI).
    ImageUrl {
        /// The image reference.
        image_url: ImageUrl,
    },
}

/// Wrapper object the endpoint expects around an image URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// The URL of the image.
    pub url: String,
}

/// Content of a message: a bare string, or ordered parts when an image is
/// attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatContent {
    /// A simple string content.
    Text(String),

    /// Text followed by one or more images.
    Parts(Vec<ContentPart>),
}

/// One message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageParam {
    /// The role of the message.
    pub role: ChatRole,

    /// The content of the message.
    pub content: ChatContent,
}

impl ChatMessageParam {
    /// A system instruction.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: ChatContent::Text(content.into()),
        }
    }

    /// A user message, multimodal when `image` is present.
    pub fn user(text: impl Into<String>, image: Option<&ImageDataUri>) -> Self {
        let text = text.into();
        let content = match image {
            Some(image) => ChatContent::Parts(vec![
                ContentPart::Text { text },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.as_str().to_string(),
                    },
                },
            ]),
            None => ChatContent::Text(text),
        };
        Self {
            role: ChatRole::User,
            content,
        }
    }
}

/// Body of `POST chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model identifier.
    pub model: String,

    /// The conversation to complete.
    pub messages: Vec<ChatMessageParam>,

    /// Upper bound on reply tokens.
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatCompletionRequest {
    /// Builds a request with the given model and messages.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessageParam>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens,
            temperature: None,
        }
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageMediaType;
    use serde_json::{json, to_value};

    #[test]
    fn text_only_request() {
        let request = ChatCompletionRequest::new(
            "gpt-4o-mini",
            vec![
                ChatMessageParam::system("Be kind."),
                ChatMessageParam::user("I have a headache", None),
            ],
            500,
        )
        .with_temperature(Some(0.5));

        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "Be kind."},
                    {"role": "user", "content": "I have a headache"}
                ],
                "max_tokens": 500,
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn image_becomes_parts() {
        let image = ImageDataUri::from_bytes(b"Hello World", ImageMediaType::Png);
        let message = ChatMessageParam::user("What is this rash?", Some(&image));
        assert_eq!(
            to_value(&message).unwrap(),
            json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "What is this rash?"},
                    {
                        "type": "image_url",
                        "image_url": {"url": "data:image/png;base64,SGVsbG8gV29ybGQ="}
                    }
                ]
            })
        );
    }

    #[test]
    fn temperature_omitted_when_unset() {
        let request = ChatCompletionRequest::new("m", Vec::new(), 10);
        let json = to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
    }
}
