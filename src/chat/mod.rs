//! The floating chat widget and its terminal front end.
//!
//! # Architecture
//!
//! - [`session`]: the append-only transcript and the widget state machines
//! - [`input`]: text, voice and image input feeding one submission
//! - [`completion`]: one reply per submission, falling back on failure
//! - [`render`]: the render surface the widget drives
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing for the REPL

mod commands;
mod completion;
mod config;
mod input;
mod render;
mod session;

pub use commands::{ChatCommand, Paging, help_text, parse_command};
pub use completion::{CompletionClient, ConfigCompletionClient, FALLBACK_REPLY, build_request};
pub use config::{ChatArgs, ChatConfig, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT};
pub use input::{
    ImageSelection, InputCapture, OutboundMessage, PendingImage, RECOGNITION_LOCALE,
    SpeechRecognizer, VoiceCapture, VoiceEvent, VoiceState,
};
pub use render::{PlainTextRenderer, RecordingRenderer, RenderEvent, Renderer, TYPING_INDICATOR};
pub use session::{
    Activity, ChatWidget, PendingReply, Rejection, RequestTicket, SessionStats, SessionStore,
    SubmitOutcome, Submission, Visibility, WELCOME_MESSAGE,
};
