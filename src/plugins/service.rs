//! The long-running workload behind `sshca service`.
//!
//! The chat bot that actually signs certificates is a separate program. When
//! the config names one it runs as a child process for as long as the bot is
//! serving; otherwise the bot just keeps its records published until signalled.

use crate::core::config::{BOT_NAME_ENV, BotConfig};
use crate::core::error::SshcaError;
use tokio::process::Command;
use tracing::info;

pub async fn run_service(config: &BotConfig) -> Result<(), SshcaError> {
    let Some((program, args)) = config
        .service_command
        .as_deref()
        .and_then(|argv| argv.split_first())
    else {
        info!(teams = ?config.teams, "no service_command configured; serving until signalled");
        std::future::pending::<()>().await;
        return Ok(());
    };

    info!(program = %program, "starting CA chat bot");
    // Dropping the future (shutdown signal) kills the child.
    let status = Command::new(program)
        .args(args)
        .env(BOT_NAME_ENV, &config.bot_name)
        .kill_on_drop(true)
        .status()
        .await?;
    if !status.success() {
        return Err(SshcaError::ValidationError(format!(
            "CA chatbot crashed: {}",
            status
        )));
    }
    Ok(())
}
