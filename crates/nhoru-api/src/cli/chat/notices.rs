//! Background printer for session and delivery notices.
//!
//! Watches the limiter's snapshots and the dispatcher's advisory, and
//! prints what changed through the readline `SharedWriter` so output never
//! tears the prompt line.

use std::io::Write;
use std::sync::Arc;

use console::style;
use rustyline_async::SharedWriter;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use nhoru_core::llm::CompletionProvider;
use nhoru_core::service::CompanionService;
use nhoru_types::session::SessionSnapshot;

/// Something worth telling the user after a snapshot change.
#[derive(Debug, PartialEq)]
pub enum Notice {
    /// The input hit the character cap.
    Helper(String),
    /// The limiter posted a system message (cooldown text).
    System(String),
    /// A new session replaced the previous one.
    NewSession,
}

/// Diff two snapshots into the notices a user should see.
pub fn session_notices(prev: &SessionSnapshot, next: &SessionSnapshot) -> Vec<Notice> {
    let mut notices = Vec::new();

    if next.id != prev.id {
        notices.push(Notice::NewSession);
    }
    if !next.helper_text.is_empty() && next.helper_text != prev.helper_text {
        notices.push(Notice::Helper(next.helper_text.clone()));
    }
    if !next.system_message.is_empty() && next.system_message != prev.system_message {
        notices.push(Notice::System(next.system_message.clone()));
    }

    notices
}

fn print_notice(writer: &mut SharedWriter, notice: &Notice) {
    match notice {
        Notice::Helper(text) => {
            let _ = writeln!(writer, "  {}", style(text).yellow());
        }
        Notice::System(text) => {
            let _ = writeln!(writer);
            for line in text.lines() {
                let _ = writeln!(writer, "  {}", style(line).magenta());
            }
            let _ = writeln!(writer);
        }
        Notice::NewSession => {
            let _ = writeln!(
                writer,
                "\n  {} {}\n",
                style("*").cyan().bold(),
                style("A new session has started.").dim()
            );
        }
    }
}

/// Spawn the notice printer. Stops when `cancel` fires.
pub fn spawn_notice_printer<P: CompletionProvider + 'static>(
    service: Arc<CompanionService<P>>,
    mut writer: SharedWriter,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut snapshots = service.limiter().subscribe();
    let mut advisory = service.dispatcher().subscribe_advisory();
    let mut last = snapshots.borrow_and_update().clone();

    if let Some(notice) = *advisory.borrow_and_update() {
        let _ = writeln!(writer, "  {} {}", style("!").yellow().bold(), style(notice).yellow());
    }

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = snapshots.borrow_and_update().clone();
                    for notice in session_notices(&last, &next) {
                        print_notice(&mut writer, &notice);
                    }
                    last = next;
                }
                changed = advisory.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = *advisory.borrow_and_update();
                    if let Some(notice) = current {
                        let _ = writeln!(
                            writer,
                            "  {} {}",
                            style("!").yellow().bold(),
                            style(notice).yellow()
                        );
                    }
                }
            }
        }
    })
}
