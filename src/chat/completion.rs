//! Turning one user submission into one assistant reply.

use crate::chat::config::ChatConfig;
use crate::client::Completions;
use crate::error::{Error, Result};
use crate::observability::CHAT_FALLBACKS;
use crate::types::{ChatCompletionRequest, ChatMessageParam, ImageDataUri};

/// Reply used whenever the endpoint cannot produce one.
pub const FALLBACK_REPLY: &str = "I apologize, but I'm having trouble connecting right now. \
Please try again later or contact our support team for immediate assistance.";

/// Source of assistant replies.
///
/// Implementors provide [`request`](CompletionClient::request); the widget
/// calls [`complete`](CompletionClient::complete), which never fails: every
/// error becomes [`FALLBACK_REPLY`], so each submission yields exactly one
/// assistant message.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Ask for a reply to `text`, with an optional attached image.
    async fn request(&self, text: &str, image: Option<&ImageDataUri>) -> Result<String>;

    /// Like `request`, but failures resolve to the fallback reply.
    async fn complete(&self, text: &str, image: Option<&ImageDataUri>) -> String {
        match self.request(text, image).await {
            Ok(reply) => reply,
            Err(err) => {
                CHAT_FALLBACKS.click();
                tracing::warn!(error = %err, "completion failed; answering with fallback");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

/// Build the request body for one submission.
pub fn build_request(
    config: &ChatConfig,
    text: &str,
    image: Option<&ImageDataUri>,
) -> ChatCompletionRequest {
    ChatCompletionRequest::new(
        config.model.clone(),
        vec![
            ChatMessageParam::system(config.system_prompt.clone()),
            ChatMessageParam::user(text, image),
        ],
        config.max_tokens,
    )
    .with_temperature(config.temperature)
}

/// Completion client that sources model and sampling from a [`ChatConfig`].
#[derive(Debug, Clone)]
pub struct ConfigCompletionClient {
    client: Completions,
    config: ChatConfig,
}

impl ConfigCompletionClient {
    /// Wraps an HTTP client with the given configuration.
    pub fn new(client: Completions, config: ChatConfig) -> Self {
        Self { client, config }
    }

    /// Builds the HTTP client from the configuration itself.
    ///
    /// `api_key` of `None` reads `SARTHI_API_KEY`.
    pub fn from_config(api_key: Option<String>, config: ChatConfig) -> Result<Self> {
        let client = Completions::with_options(
            api_key,
            Some(config.base_url.clone()),
            Some(config.timeout),
        )?;
        Ok(Self::new(client, config))
    }

    /// The active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl CompletionClient for ConfigCompletionClient {
    async fn request(&self, text: &str, image: Option<&ImageDataUri>) -> Result<String> {
        let request = build_request(&self.config, text, image);
        let deadline = self.config.timeout;
        let response = tokio::time::timeout(deadline, self.client.send(&request))
            .await
            .map_err(|_| {
                Error::timeout("no reply before the deadline", Some(deadline.as_secs_f64()))
            })??;
        match response.first_content() {
            Some(content) => Ok(content.to_string()),
            None => Err(Error::serialization(
                "response carried no choices[0].message.content",
                None,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatContent, ChatRole, ImageMediaType};

    struct Failing;

    #[async_trait::async_trait]
    impl CompletionClient for Failing {
        async fn request(&self, _: &str, _: Option<&ImageDataUri>) -> Result<String> {
            Err(Error::connection("network unreachable", None))
        }
    }

    struct Echo;

    #[async_trait::async_trait]
    impl CompletionClient for Echo {
        async fn request(&self, text: &str, _: Option<&ImageDataUri>) -> Result<String> {
            Ok(format!("echo: {text}"))
        }
    }

    #[tokio::test]
    async fn failures_become_fallback() {
        assert_eq!(Failing.complete("hello", None).await, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn successes_pass_through() {
        assert_eq!(Echo.complete("hello", None).await, "echo: hello");
    }

    #[test]
    fn request_starts_with_system_prompt() {
        let config = ChatConfig::new().with_temperature(Some(0.3));
        let request = build_request(&config, "My knee hurts", None);
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, 500);
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(
            request.messages[0].content,
            ChatContent::Text(config.system_prompt.clone())
        );
        assert_eq!(request.messages[1].role, ChatRole::User);
        assert_eq!(
            request.messages[1].content,
            ChatContent::Text("My knee hurts".to_string())
        );
    }

    #[test]
    fn request_with_image_uses_parts() {
        let image = ImageDataUri::from_bytes(b"img", ImageMediaType::Jpeg);
        let request = build_request(&ChatConfig::new(), "", Some(&image));
        assert!(matches!(
            &request.messages[1].content,
            ChatContent::Parts(parts) if parts.len() == 2
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_falls_back() {
        let config = ChatConfig::new()
            .with_base_url("http://127.0.0.1:1/v1/")
            .with_timeout(std::time::Duration::from_secs(5));
        let client = ConfigCompletionClient::from_config(Some("test".to_string()), config).unwrap();
        assert!(client.request("hi", None).await.unwrap_err().is_transport());
        assert_eq!(client.complete("hi", None).await, FALLBACK_REPLY);
    }
}
