//! Terminal host for the Sarthi chat widget.
//!
//! # Usage
//!
//! ```bash
//! # The credential comes from the environment
//! export SARTHI_API_KEY=...
//! sarthi-chat
//!
//! # Another model, Hindi labels, no colors
//! sarthi-chat --model gpt-4o --locale hi --no-color
//!
//! # Diagnostics go to stderr
//! RUST_LOG=sarthi=debug sarthi-chat
//! ```
//!
//! Lines are sent as messages; lines starting with `/` are commands (see
//! `/help`).  Ctrl+C while Sarthi is typing cancels the request.

use std::sync::{Arc, Mutex};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use sarthi::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatWidget, ConfigCompletionClient, Paging,
    PlainTextRenderer, Rejection, Renderer, SubmitOutcome, Visibility, VoiceState, help_text,
    parse_command,
};
use sarthi::directory::{LocationFinder, LocationKind, doctor_carousel, doctors};
use sarthi::{Locale, t};

type Widget = ChatWidget<ConfigCompletionClient>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("sarthi-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;
    let mut locale = config.locale;

    let client = ConfigCompletionClient::from_config(None, config)?;
    let mut widget = ChatWidget::new(client);
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;
    let mut carousel = doctor_carousel();
    let finder = LocationFinder::new();

    // Token of the request in flight; Ctrl+C cancels it.
    let current = Arc::new(Mutex::new(CancellationToken::new()));
    let handler_current = Arc::clone(&current);
    ctrlc::set_handler(move || {
        if let Ok(token) = handler_current.lock() {
            token.cancel();
        }
    })?;

    println!("{} (model: {})", t(locale, "askSarthi"), widget.client().config().model);
    println!("Type /help for commands, /quit to exit\n");
    widget.open(&mut renderer);

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    let _ = rl.add_history_entry(line);
                }

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Open => widget.open(&mut renderer),
                        ChatCommand::Close => {
                            widget.close();
                            renderer.print_info("Chat closed. /open to continue.");
                        }
                        ChatCommand::Toggle => {
                            if widget.toggle(&mut renderer) == Visibility::Closed {
                                renderer.print_info("Chat closed. /open to continue.");
                            }
                        }
                        ChatCommand::Image(path) => {
                            widget.input_mut().select_image(&path);
                            renderer.print_info(&format!(
                                "Image selected: {path} (sent with your next message)"
                            ));
                        }
                        ChatCommand::ClearImage => {
                            widget.input_mut().clear_image();
                            renderer.print_info("Image cleared.");
                        }
                        ChatCommand::Voice => {
                            if !widget.input().voice().is_available() {
                                renderer.print_info("Voice input is not available in this terminal.");
                            } else {
                                match widget.toggle_voice() {
                                    VoiceState::Recording => renderer.print_info("Listening..."),
                                    VoiceState::Idle => renderer.print_info("Stopped listening."),
                                }
                            }
                        }
                        ChatCommand::Lang(new_locale) => {
                            locale = new_locale;
                            renderer.print_info(&format!("Language: {locale}"));
                        }
                        ChatCommand::Languages => print_languages(locale),
                        ChatCommand::Doctors(paging) => {
                            match paging {
                                Paging::Next => {
                                    carousel.next();
                                }
                                Paging::Prev => {
                                    carousel.prev();
                                }
                                Paging::Show => {}
                            }
                            print_doctors(locale, carousel.page(doctors()));
                        }
                        ChatCommand::Find(query) => {
                            print_locations(locale, &finder, query.as_deref().unwrap_or(""));
                        }
                        ChatCommand::Stats => print_stats(&widget),
                        ChatCommand::ShowConfig => print_config(&widget, locale),
                        ChatCommand::Help => {
                            for line in help_text(locale).lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // An empty line still sends a selected image on its own.
                if line.is_empty() && !widget.input().has_image() {
                    continue;
                }
                widget.input_mut().set_text(line);

                let token = CancellationToken::new();
                if let Ok(mut slot) = current.lock() {
                    *slot = token.clone();
                }
                match widget.submit(&mut renderer, &token).await {
                    Ok(SubmitOutcome::Replied { .. } | SubmitOutcome::Cancelled { .. }) => {}
                    Ok(SubmitOutcome::Rejected(Rejection::Closed)) => {
                        widget.input_mut().take_text();
                        renderer.print_info("Chat is closed. /open to continue.");
                    }
                    Ok(SubmitOutcome::Rejected(Rejection::Cancelled)) => {
                        renderer.print_info("Not sent; your message is still in the input.");
                    }
                    Ok(SubmitOutcome::Rejected(_)) => {}
                    Err(err) => {
                        renderer.print_error(&format!("Message not sent: {err}"));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_stats(widget: &Widget) {
    let stats = widget.stats();
    println!("    Session Statistics:");
    println!("      Messages: {}", stats.message_count);
    println!("      From you: {}", stats.user_messages);
    println!("      From Sarthi: {}", stats.assistant_messages);
    println!(
        "      Window: {}",
        match stats.visibility {
            Visibility::Open => "open",
            Visibility::Closed => "closed",
        }
    );
    println!(
        "      Voice: {}",
        match stats.voice {
            VoiceState::Idle => "idle",
            VoiceState::Recording => "recording",
        }
    );
    println!(
        "      Image selected: {}",
        if stats.image_selected { "yes" } else { "no" }
    );
}

fn print_config(widget: &Widget, locale: Locale) {
    let config = widget.client().config();
    println!("    Current Configuration:");
    println!("      Model: {}", config.model);
    println!("      Max tokens: {}", config.max_tokens);
    println!(
        "      Temperature: {}",
        config
            .temperature
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "default".to_string())
    );
    println!("      Endpoint: {}", config.base_url);
    println!("      Timeout: {}s", config.timeout.as_secs());
    println!("      Language: {locale}");
}

fn print_languages(current: Locale) {
    println!("    Languages:");
    for locale in Locale::ALL {
        let marker = if locale == current { "*" } else { " " };
        println!("    {marker} {} {locale}", locale.code());
    }
}

fn print_doctors(locale: Locale, page: &[sarthi::directory::Doctor]) {
    println!("    {}:", t(locale, "doctors"));
    for doctor in page {
        let availability = if doctor.available {
            "available"
        } else {
            "busy"
        };
        println!(
            "      {} - {} ({:.1}, {availability})",
            doctor.name, doctor.specialty, doctor.rating
        );
    }
}

fn print_locations(locale: Locale, finder: &LocationFinder, query: &str) {
    for (kind, label) in [
        (LocationKind::Hospital, "findNearbyHospitals"),
        (LocationKind::Booth, "sarthiBooth"),
    ] {
        println!("    {}:", t(locale, label));
        let hits = finder.search(kind, query);
        if hits.is_empty() {
            println!("      (no matches)");
        }
        for location in hits {
            println!(
                "      {} - {} ({} km, {})",
                location.name, location.address, location.distance_km, location.phone
            );
            if !location.services.is_empty() {
                println!("        {}", location.services.join(", "));
            }
            match finder.directions_url(location) {
                Ok(url) => println!("        {url}"),
                Err(err) => println!("        (no directions: {err})"),
            }
        }
    }
}
