//! Welcome banner display for chat sessions.

use console::style;

use nhoru_core::chat::persona::INTRO_LINES;
use nhoru_types::session::SessionLimits;

/// Print the welcome banner at the start of a chat.
///
/// Shows the intro lines, then the model and session limits with a hint
/// about slash commands.
pub fn print_welcome_banner(model: &str, session_id: &str, limits: &SessionLimits) {
    println!();
    for line in INTRO_LINES {
        println!("  {}", style(line).cyan());
    }
    println!();
    println!("  {}  {}", style("Model:").bold(), style(model).dim());
    println!(
        "  {}  {}",
        style("Session:").bold(),
        style(&session_id[..8.min(session_id.len())]).dim()
    );
    println!(
        "  {}  {}",
        style("Limits:").bold(),
        style(format!(
            "{} messages per session, {} characters each",
            limits.max_submissions, limits.max_characters
        ))
        .dim()
    );
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}
