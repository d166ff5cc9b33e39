//! Configuration types for the chat widget.
//!
//! Command-line parsing goes through `arrrg`; the resolved [`ChatConfig`]
//! carries everything the completion layer and the REPL need.

use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use crate::i18n::Locale;

/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default maximum tokens per reply.
const DEFAULT_MAX_TOKENS: u32 = 500;

/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Persona and safety instruction sent ahead of every user message.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Sarthi, a helpful healthcare AI assistant. \
Provide accurate, helpful health information while always recommending users consult \
healthcare professionals for serious concerns. Keep responses concise and caring.";

/// Command-line arguments for the sarthi-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for replies.
    #[arrrg(optional, "Model to use (default: gpt-4o-mini)", "MODEL")]
    pub model: Option<String>,

    /// Replacement system instruction.
    #[arrrg(optional, "System instruction for the assistant", "PROMPT")]
    pub system: Option<String>,

    /// Maximum tokens per reply.
    #[arrrg(optional, "Max tokens per reply (default: 500)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature, kept as text so the struct stays `Eq`.
    #[arrrg(optional, "Sampling temperature 0.0-2.0 (default: 0.7)", "TEMP")]
    pub temperature: Option<String>,

    /// Endpoint base URL.
    #[arrrg(optional, "Completion API base URL", "URL")]
    pub base_url: Option<String>,

    /// Request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: 30)", "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Interface language.
    #[arrrg(optional, "Interface language: en, hi, pa (default: en)", "LANG")]
    pub locale: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration for a chat widget.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Model identifier sent with every request.
    pub model: String,

    /// Fixed system instruction.
    pub system_prompt: String,

    /// Maximum tokens per reply.
    pub max_tokens: u32,

    /// Optional sampling temperature.
    pub temperature: Option<f32>,

    /// Endpoint base URL.
    pub base_url: String,

    /// Deadline for one completion request.
    pub timeout: Duration,

    /// Interface language for labels.
    pub locale: Locale,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gpt-4o-mini
    /// - Max tokens: 500
    /// - Temperature: 0.7
    /// - Timeout: 30 seconds
    /// - Locale: English
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: Some(DEFAULT_TEMPERATURE),
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            locale: Locale::English,
            use_color: true,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the system instruction.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the maximum tokens per reply.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the endpoint base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the interface language.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        let temperature = match args.temperature.as_deref().map(parse_temperature) {
            Some(Some(value)) => Some(value),
            Some(None) => {
                tracing::warn!("ignoring invalid --temperature; using the default");
                defaults.temperature
            }
            None => defaults.temperature,
        };
        let timeout = match args.timeout_secs {
            Some(0) => {
                tracing::warn!("ignoring --timeout-secs 0; using the default");
                defaults.timeout
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.timeout,
        };
        let locale = match args.locale.as_deref() {
            Some(code) => Locale::from_code(code).unwrap_or_else(|| {
                tracing::warn!(code, "unknown --locale; using English");
                Locale::English
            }),
            None => defaults.locale,
        };

        ChatConfig {
            model: args.model.unwrap_or(defaults.model),
            system_prompt: args.system.unwrap_or(defaults.system_prompt),
            max_tokens: args.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature,
            base_url: args.base_url.unwrap_or(defaults.base_url),
            timeout,
            locale,
            use_color: !args.no_color,
        }
    }
}

fn parse_temperature(value: &str) -> Option<f32> {
    let parsed: f32 = value.trim().parse().ok()?;
    (parsed.is_finite() && (0.0..=2.0).contains(&parsed)).then_some(parsed)
}
