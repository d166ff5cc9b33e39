//! Render surface for the chat widget.
//!
//! The widget pushes every change through a [`Renderer`]: each appended
//! message, the scroll to it, and the typing indicator around an
//! outstanding request.

use std::io::{self, Stdout, Write};

use crate::types::{Message, MessageId, Sender};
use crate::utils::time::clock_label;

/// ANSI escape code for dim text (used for timestamps and the indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text (used for the typing indicator).
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for green text (used for the user's messages).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Carriage return plus erase-line, to remove the typing indicator.
const ANSI_CLEAR_LINE: &str = "\r\x1b[2K";

/// Text of the typing indicator.
pub const TYPING_INDICATOR: &str = "Sarthi is typing...";

/// Trait for rendering the transcript.
pub trait Renderer: Send {
    /// Draw one transcript entry.
    fn print_message(&mut self, message: &Message);

    /// Bring the entry with `id` into view.
    ///
    /// Called after every append with the id of the newest message.
    fn scroll_to(&mut self, id: MessageId);

    /// Show the typing indicator.
    fn start_typing(&mut self);

    /// Remove the typing indicator.
    fn finish_typing(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when the user cancels an outstanding request.
    fn print_interrupted(&mut self);
}

/// Renders the transcript to stdout with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    typing: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            typing: false,
        }
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn clear_typing(&mut self) {
        if self.typing {
            if self.use_color {
                print!("{ANSI_CLEAR_LINE}");
            } else {
                println!();
            }
            self.typing = false;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats one entry the way the terminal shows it, without styling.
pub fn format_message(message: &Message) -> String {
    let who = match message.sender {
        Sender::User => "You",
        Sender::Assistant => "Sarthi",
    };
    let mut line = format!("[{}] {who}: {}", clock_label(message.timestamp), message.text);
    if let Some(image) = &message.image {
        if !message.text.is_empty() {
            line.push(' ');
        }
        line.push_str(&format!("[image: {}]", image.media_type().as_mime()));
    }
    line
}

impl Renderer for PlainTextRenderer {
    fn print_message(&mut self, message: &Message) {
        self.clear_typing();
        let line = format_message(message);
        if self.use_color && message.is_user() {
            println!("{ANSI_GREEN}{line}{ANSI_RESET}");
        } else {
            println!("{line}");
        }
    }

    fn scroll_to(&mut self, _id: MessageId) {
        // The terminal follows the newest line on its own.
        self.flush();
    }

    fn start_typing(&mut self) {
        if self.use_color {
            print!("{ANSI_DIM}{ANSI_ITALIC}{TYPING_INDICATOR}{ANSI_RESET}");
        } else {
            print!("{TYPING_INDICATOR}");
        }
        self.typing = true;
        self.flush();
    }

    fn finish_typing(&mut self) {
        self.clear_typing();
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.clear_typing();
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.clear_typing();
        println!("{info}");
    }

    fn print_interrupted(&mut self) {
        self.clear_typing();
        println!("[cancelled]");
        self.flush();
    }
}

/// Something the widget asked a renderer to do.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// A message was drawn.
    Message(Message),
    /// The view scrolled to a message.
    ScrollTo(MessageId),
    /// The typing indicator appeared.
    TypingStarted,
    /// The typing indicator went away.
    TypingFinished,
    /// An error was shown.
    Error(String),
    /// An informational line was shown.
    Info(String),
    /// A request was cancelled.
    Interrupted,
}

/// A renderer that records every call, for embedding front ends that
/// replay events into their own view (and for tests).
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    /// Events in the order they were issued.
    pub events: Vec<RenderEvent>,
}

impl RecordingRenderer {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while the indicator is showing.
    pub fn is_typing(&self) -> bool {
        self.events
            .iter()
            .rev()
            .find_map(|event| match event {
                RenderEvent::TypingStarted => Some(true),
                RenderEvent::TypingFinished => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// The messages drawn so far.
    pub fn messages(&self) -> Vec<&Message> {
        self.events
            .iter()
            .filter_map(|event| match event {
                RenderEvent::Message(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn print_message(&mut self, message: &Message) {
        self.events.push(RenderEvent::Message(message.clone()));
    }

    fn scroll_to(&mut self, id: MessageId) {
        self.events.push(RenderEvent::ScrollTo(id));
    }

    fn start_typing(&mut self) {
        self.events.push(RenderEvent::TypingStarted);
    }

    fn finish_typing(&mut self) {
        self.events.push(RenderEvent::TypingFinished);
    }

    fn print_error(&mut self, error: &str) {
        self.events.push(RenderEvent::Error(error.to_string()));
    }

    fn print_info(&mut self, info: &str) {
        self.events.push(RenderEvent::Info(info.to_string()));
    }

    fn print_interrupted(&mut self) {
        self.events.push(RenderEvent::Interrupted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImageDataUri, ImageMediaType};
    use time::macros::datetime;

    fn message(sender: Sender, text: &str, image: Option<ImageDataUri>) -> Message {
        Message::new(
            MessageId(1),
            text,
            sender,
            datetime!(2024-03-01 14:07:00 UTC),
            image,
        )
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn format_text_message() {
        let line = format_message(&message(Sender::Assistant, "Drink water.", None));
        assert_eq!(line, "[14:07] Sarthi: Drink water.");
    }

    #[test]
    fn format_image_only_message() {
        let image = ImageDataUri::from_bytes(b"x", ImageMediaType::Png);
        let line = format_message(&message(Sender::User, "", Some(image)));
        assert_eq!(line, "[14:07] You: [image: image/png]");
    }

    #[test]
    fn recorder_tracks_typing() {
        let mut renderer = RecordingRenderer::new();
        assert!(!renderer.is_typing());
        renderer.start_typing();
        assert!(renderer.is_typing());
        renderer.print_info("hello");
        assert!(renderer.is_typing());
        renderer.finish_typing();
        assert!(!renderer.is_typing());
    }
}
