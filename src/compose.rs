//! Container-compose child process supervision.
//!
//! The launcher runs `docker compose -f <spec> up` with inherited stdio and
//! waits for it to exit. Exit code 130 is what compose reports after Ctrl-C,
//! so it counts as a normal termination; any other non-zero code is fatal and
//! is reported with the full command line.

use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;
use tokio::process::Command;
use tracing::info;

/// Exit code compose reports when interrupted with SIGINT.
pub const SIGINT_EXIT_CODE: i32 = 130;

#[derive(Debug, Error, Diagnostic)]
pub enum ComposeError {
    #[error("failed to spawn `{command}`: {source}")]
    #[diagnostic(
        code(graphstudio::compose::spawn),
        help("Is docker installed and on PATH?")
    )]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed with exit code {code}: {command}")]
    #[diagnostic(code(graphstudio::compose::command_failed))]
    CommandFailed { code: i32, command: String },
}

pub type Result<T> = std::result::Result<T, ComposeError>;

/// Spawn a child process with inherited stdio and wait for it to exit.
///
/// Exit code 0 and [`SIGINT_EXIT_CODE`] are success; termination by signal
/// (no exit code at all) is treated like an interrupt.
pub async fn run_command(program: &str, args: &[String]) -> Result<()> {
    let command = format!("{program} {}", args.join(" "));
    info!(%command, "spawning child process");

    let mut child = Command::new(program)
        .args(args)
        .spawn()
        .map_err(|source| ComposeError::Spawn {
            command: command.clone(),
            source,
        })?;
    let status = child.wait().await.map_err(|source| ComposeError::Spawn {
        command: command.clone(),
        source,
    })?;

    match status.code() {
        Some(0) | Some(SIGINT_EXIT_CODE) | None => Ok(()),
        Some(code) => Err(ComposeError::CommandFailed { code, command }),
    }
}

/// Bring the compose stack up and wait until it exits.
pub async fn compose_up(compose_file: &Path) -> Result<()> {
    run_command(
        "docker",
        &[
            "compose".to_string(),
            "-f".to_string(),
            compose_file.display().to_string(),
            "up".to_string(),
        ],
    )
    .await
}
