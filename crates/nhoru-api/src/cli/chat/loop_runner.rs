//! Main chat loop orchestration.
//!
//! Coordinates the conversation lifecycle: companion startup, welcome
//! banner, the input loop with slash commands, and shutdown of the
//! background tasks.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use nhoru_core::llm::CompletionProvider;
use nhoru_core::service::{CompanionService, SubmitOutcome};
use nhoru_types::chat::Origin;
use nhoru_types::session::SessionSnapshot;

use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::notices::spawn_notice_printer;

/// Run the interactive chat loop.
pub async fn run_chat_loop(state: &AppState) -> anyhow::Result<()> {
    let service = state.start_companion()?;
    let session = service.session();

    print_welcome_banner(
        &state.config.assistant.model,
        &session.id.to_string(),
        &state.config.session,
    );

    let (mut chat_input, writer) = ChatInput::new(prompt_for(&session, true))
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;
    let printer = spawn_notice_printer(service.clone(), writer, state.cancel.child_token());

    loop {
        chat_input.update_prompt(&prompt_for(&service.session(), service.dispatcher().is_online()));

        match chat_input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) => {
                if let Some(cmd) = commands::parse(&text) {
                    match cmd {
                        ChatCommand::Exit => break,
                        ChatCommand::Clear => chat_input.clear(),
                        other => run_command(&service, other).await?,
                    }
                    continue;
                }

                if text.trim().is_empty() {
                    continue;
                }
                submit_message(&service, &text).await?;
            }
        }
    }

    println!("\n  {}", style("Session ended.").dim());
    chat_input.flush();
    state.shutdown();
    let _ = printer.await;
    info!(exchanges = service.history().len(), "chat closed");
    Ok(())
}

/// Prompt text reflecting whether sending is currently possible.
fn prompt_for(session: &SessionSnapshot, online: bool) -> String {
    if !online {
        format!("  {} ", style("offline >").dim())
    } else if session.is_input_disabled {
        format!("  {} ", style("paused >").dim())
    } else {
        format!("  {} ", style("You >").green().bold())
    }
}

fn thinking_spinner() -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}")?);
    spinner.set_message("...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    Ok(spinner)
}

async fn submit_message<P: CompletionProvider>(
    service: &Arc<CompanionService<P>>,
    text: &str,
) -> anyhow::Result<()> {
    service
        .validate_characters(text.trim().chars().count())
        .await?;

    let spinner = thinking_spinner()?;
    let outcome = service.submit(text).await;
    spinner.finish_and_clear();

    match outcome? {
        SubmitOutcome::Ignored => {}
        SubmitOutcome::Offline => {
            println!(
                "\n  {} {}\n",
                style("!").yellow().bold(),
                style("No internet connection. Your message was not sent.").yellow()
            );
        }
        SubmitOutcome::Limited => {
            println!(
                "\n  {}\n",
                style("Input is paused until the session resets.").dim()
            );
        }
        SubmitOutcome::Replied { reply, .. } => {
            println!("\n  {} {}\n", style("nhōru").cyan().bold(), reply);
        }
        SubmitOutcome::Failed(err) => {
            println!(
                "\n  {} {}\n",
                style("!").red().bold(),
                style(err.notice()).red()
            );
        }
    }
    Ok(())
}

async fn run_command<P: CompletionProvider>(
    service: &Arc<CompanionService<P>>,
    cmd: ChatCommand,
) -> anyhow::Result<()> {
    match cmd {
        ChatCommand::Help => commands::print_help(),
        ChatCommand::History => print_history(service),
        ChatCommand::Status => print_status(service),
        ChatCommand::Away => {
            service.enter_background().await?;
            println!("\n  {}\n", style("Stepped away. /back when you return.").dim());
        }
        ChatCommand::Back => {
            if !service.enter_foreground().await? {
                println!("\n  {}\n", style("Welcome back.").dim());
            }
        }
        ChatCommand::Lock => {
            service.screen_locked().await?;
        }
        ChatCommand::New => {
            service.restart().await?;
        }
        ChatCommand::Unknown(name) => {
            println!(
                "\n  {} Unknown command: {}. Type /help for available commands.\n",
                style("?").yellow().bold(),
                style(name).dim()
            );
        }
        ChatCommand::Clear | ChatCommand::Exit => {}
    }
    Ok(())
}

fn print_history<P: CompletionProvider>(service: &CompanionService<P>) {
    let history = service.history();
    println!();
    if history.is_empty() {
        println!("  {}", style("Nothing yet.").dim());
    }
    for exchange in &history {
        let label = match exchange.origin {
            Origin::User => style("You").green(),
            Origin::Assistant => style("nhōru").cyan(),
        };
        println!(
            "  {} {} {}",
            style(exchange.sent_at.with_timezone(&chrono::Local).format("%H:%M")).dim(),
            label.bold(),
            exchange.text
        );
    }
    println!();
}

fn print_status<P: CompletionProvider>(service: &CompanionService<P>) {
    let session = service.session();
    let limits = service.limiter().limits();
    let online = service.dispatcher().is_online();

    println!();
    println!(
        "  {}  {}",
        style("Session:").bold(),
        style(&session.id.to_string()[..8]).dim()
    );
    println!(
        "  {}  {} ({}/{})",
        style("State:").bold(),
        session.phase,
        session.submission_count,
        limits.max_submissions
    );
    println!(
        "  {}  {}",
        style("Network:").bold(),
        if online {
            style("online").green()
        } else {
            style("offline").red()
        }
    );
    if let Some(advisory) = service.advisory() {
        println!("  {}  {}", style("Notice:").bold(), style(advisory).yellow());
    }
    println!();
}
