//! Session management for the Sarthi healthcare assistant.
//!
//! The heart of the crate is [`chat::ChatWidget`]: an append-only
//! conversation with a remote chat-completion endpoint, fed by text, voice
//! and image input.  Alongside it live the localized interface strings, the
//! doctor and location directory, and the mocked video consultation.

// Public modules
pub mod chat;
pub mod client;
pub mod consultation;
pub mod directory;
pub mod error;
pub mod i18n;
pub mod types;
pub mod utils;

mod observability;

// Re-exports
pub use client::Completions;
pub use error::{Error, Result};
pub use i18n::{Locale, t};
pub use observability::register_biometrics;
pub use types::*;
