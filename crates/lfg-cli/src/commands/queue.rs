//! Interactive queue commands accepted while a simulation runs.
//!
//! ```text
//! add <tank|healer|dps> <amount>   queue more players
//! status                           show queue and instance states
//! help                             list commands
//! quit | exit                      stop reading input
//! ```

use std::io::BufRead;

use lfg_core::{CoreError, Role};
use lfg_scheduler::{Coordinator, SimError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub const HELP: &str = "\
Commands:
  add <tank|healer|dps> <amount>   queue more players
  status                           show queue and instance states
  help                             list commands
  quit | exit                      stop accepting input";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueCommand {
    Add { role: Role, amount: u64 },
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0:?} (try `help`)")]
    Unknown(String),

    #[error("usage: add <tank|healer|dps> <amount>")]
    Usage,

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl QueueCommand {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((head, args)) = words.split_first() else {
            return Ok(None);
        };

        let command = match (head.to_ascii_lowercase().as_str(), args) {
            ("add", [role, amount]) => QueueCommand::Add {
                role: role.parse()?,
                amount: parse_amount(amount)?,
            },
            ("add", _) => return Err(CommandError::Usage),
            ("status", []) => QueueCommand::Status,
            ("help", []) => QueueCommand::Help,
            ("quit" | "exit", []) => QueueCommand::Quit,
            _ => return Err(CommandError::Unknown(line.trim().to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_amount(input: &str) -> Result<u64, CoreError> {
    match input.parse::<u64>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(CoreError::InvalidAmount(input.to_string())),
    }
}

/// Apply a command and return the text to show the user.
///
/// `Quit` is handled by [`serve`] and is a no-op here.
pub async fn execute(command: QueueCommand, coordinator: &Coordinator) -> String {
    match command {
        QueueCommand::Add { role, amount } => match coordinator.add_players(role, amount).await {
            Ok(queue) => format!(
                "Added {amount} {role} ({} {role} queued). Queue: {queue}",
                queue.count(role)
            ),
            Err(SimError::Closed) => "Simulation has finished; players were not added.".to_string(),
            Err(e) => e.to_string(),
        },
        QueueCommand::Status => coordinator.status().await.to_string(),
        QueueCommand::Help => HELP.to_string(),
        QueueCommand::Quit => String::new(),
    }
}

/// Read commands from `lines` until `quit`, `exit` or end of input, then
/// signal `closed`. In-flight parties are unaffected.
pub async fn serve(
    mut lines: mpsc::UnboundedReceiver<String>,
    coordinator: Coordinator,
    closed: oneshot::Sender<()>,
) {
    while let Some(line) = lines.recv().await {
        match QueueCommand::parse(&line) {
            Ok(None) => {}
            Ok(Some(QueueCommand::Quit)) => {
                println!("No longer accepting input; waiting for active parties to finish.");
                break;
            }
            Ok(Some(command)) => {
                println!("{}", execute(command, &coordinator).await);
            }
            Err(e) => {
                warn!(error = %e, "rejected command");
                println!("{e}");
            }
        }
    }
    debug!("interactive input closed");
    let _ = closed.send(());
}

/// Forward stdin lines from a dedicated OS thread.
///
/// The thread is never joined; a read still pending when the simulation
/// ends must not hold up runtime shutdown.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
