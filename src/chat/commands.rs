//! Slash command parsing for the chat application.
//!
//! Input starting with `/` drives the widget's controls (open/close, image
//! and voice input, language) instead of being sent as a message.

use crate::i18n::{Locale, t};

/// Which way to page the doctor carousel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Paging {
    /// Show the current page.
    Show,
    /// Advance one doctor.
    Next,
    /// Go back one doctor.
    Prev,
}

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Open the widget.
    Open,

    /// Close the widget.
    Close,

    /// Flip the widget between open and closed.
    Toggle,

    /// Select an image file for the next message.
    Image(String),

    /// Drop the selected image.
    ClearImage,

    /// Toggle voice capture.
    Voice,

    /// Switch the interface language.
    Lang(Locale),

    /// List the available languages.
    Languages,

    /// Page through the doctor roster.
    Doctors(Paging),

    /// Search hospitals and booths; `None` lists all of them.
    Find(Option<String>),

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a message.
///
/// # Examples
///
/// ```
/// # use sarthi::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert!(parse_command("/image scan.png").is_some());
/// assert!(parse_command("I have a headache").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "open" => ChatCommand::Open,
        "close" => ChatCommand::Close,
        "toggle" => ChatCommand::Toggle,
        "image" | "img" => match argument {
            Some(arg) if arg.eq_ignore_ascii_case("clear") => ChatCommand::ClearImage,
            Some(path) => ChatCommand::Image(path.to_string()),
            None => ChatCommand::Invalid("/image requires a file path (or 'clear')".to_string()),
        },
        "voice" | "mic" => ChatCommand::Voice,
        "lang" | "language" => match argument {
            Some(code) => match Locale::from_code(code) {
                Some(locale) => ChatCommand::Lang(locale),
                None => ChatCommand::Invalid(format!("Unknown language: {code} (try en, hi, pa)")),
            },
            None => ChatCommand::Languages,
        },
        "doctors" => match argument.map(str::to_lowercase).as_deref() {
            None => ChatCommand::Doctors(Paging::Show),
            Some("next") => ChatCommand::Doctors(Paging::Next),
            Some("prev") => ChatCommand::Doctors(Paging::Prev),
            Some(_) => ChatCommand::Invalid("/doctors expects 'next' or 'prev'".to_string()),
        },
        "find" => ChatCommand::Find(argument.map(str::to_string)),
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands, labelled in `locale`.
pub fn help_text(locale: Locale) -> String {
    format!(
        r#"Available commands:
  /open                  Open the chat ({ask})
  /close                 Close the chat (history is kept)
  /toggle                Open or close the chat
  /image <path>          {image}
  /image clear           Drop the selected image
  /voice                 {mic}
  /lang [en|hi|pa]       Switch language (no argument lists them)
  /doctors [next|prev]   {doctors}
  /find [query]          {hospitals}
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#,
        ask = t(locale, "askSarthi"),
        image = t(locale, "imageUploadTooltip"),
        mic = t(locale, "microphoneTooltip"),
        doctors = t(locale, "doctors"),
        hospitals = t(locale, "findNearbyHospitals"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_visibility() {
        assert_eq!(parse_command("/open"), Some(ChatCommand::Open));
        assert_eq!(parse_command("/CLOSE"), Some(ChatCommand::Close));
        assert_eq!(parse_command("/toggle"), Some(ChatCommand::Toggle));
    }

    #[test]
    fn parse_image() {
        assert_eq!(
            parse_command("/image  rash photo.jpg "),
            Some(ChatCommand::Image("rash photo.jpg".to_string()))
        );
        assert_eq!(parse_command("/image clear"), Some(ChatCommand::ClearImage));
        assert!(matches!(
            parse_command("/image"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_lang() {
        assert_eq!(
            parse_command("/lang hi"),
            Some(ChatCommand::Lang(Locale::Hindi))
        );
        assert_eq!(parse_command("/lang"), Some(ChatCommand::Languages));
        assert!(matches!(
            parse_command("/lang fr"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("fr")
        ));
    }

    #[test]
    fn parse_directory_commands() {
        assert_eq!(
            parse_command("/doctors"),
            Some(ChatCommand::Doctors(Paging::Show))
        );
        assert_eq!(
            parse_command("/doctors NEXT"),
            Some(ChatCommand::Doctors(Paging::Next))
        );
        assert_eq!(
            parse_command("/doctors prev"),
            Some(ChatCommand::Doctors(Paging::Prev))
        );
        assert_eq!(parse_command("/find"), Some(ChatCommand::Find(None)));
        assert_eq!(
            parse_command("/find delhi"),
            Some(ChatCommand::Find(Some("delhi".to_string())))
        );
    }

    #[test]
    fn parse_stats_and_config() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
        assert_eq!(parse_command("/voice"), Some(ChatCommand::Voice));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("I feel dizzy"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/book tomorrow"),
            Some(ChatCommand::Invalid("Unknown command: /book".to_string()))
        );
    }

    #[test]
    fn help_is_localized() {
        assert!(help_text(Locale::English).contains("Upload image for analysis"));
        assert!(help_text(Locale::Hindi).contains("बोलने के लिए क्लिक करें"));
    }
}
