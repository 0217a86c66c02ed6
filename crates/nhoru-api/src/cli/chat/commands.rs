//! Slash command parsing and help for the chat loop.
//!
//! Commands start with `/` and drive the session lifecycle by hand:
//! `/away` and `/back` stand in for the app moving to and from the
//! background, `/lock` for a screen lock.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Show the conversation so far.
    History,
    /// Show session, connectivity, and delivery state.
    Status,
    /// Enter the background.
    Away,
    /// Return to the foreground.
    Back,
    /// Simulate a screen lock.
    Lock,
    /// Start a new session.
    New,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat.
    Exit,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/history" => Some(ChatCommand::History),
        "/status" => Some(ChatCommand::Status),
        "/away" => Some(ChatCommand::Away),
        "/back" => Some(ChatCommand::Back),
        "/lock" => Some(ChatCommand::Lock),
        "/new" => Some(ChatCommand::New),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/history", "Show the conversation so far"),
        ("/status", "Show session and connection state"),
        ("/away", "Step away (app goes to background)"),
        ("/back", "Come back (app returns to foreground)"),
        ("/lock", "Lock the screen (starts a new session)"),
        ("/new", "Start a new session"),
        ("/clear", "Clear the screen"),
        ("/exit", "End the chat"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (name, description) in rows {
        println!("  {:<10} {}", style(name).cyan(), description);
    }
    println!();
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}
