//! Ties the bot's discovery records to the life of the process.
//!
//! `Idle → Publishing → Serving → Cleaning → Terminated`
//!
//! Once publishing succeeds a [`RetractGuard`] is armed, so every way out of the
//! serving phase (workload returns, workload fails, termination signal, panic)
//! goes through exactly one retract attempt. Cleanup is best-effort: a process
//! killed with SIGKILL or losing power leaves its records behind. Those stale
//! records are overwritten by the next successful publish for the same team, or
//! removed by the bulk wipe; nothing reaps them in the background.

use crate::core::error::SshcaError;
use crate::core::store::GroupStore;
use crate::plugins::publisher;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Publishing,
    Serving,
    Cleaning,
    Terminated,
}

/// How the serving phase ended, for callers that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Completed,
    Signalled,
}

/// Retracts the published records when dropped unless [`RetractGuard::retract`]
/// already ran.
pub struct RetractGuard {
    armed: Option<(Arc<dyn GroupStore>, Vec<String>)>,
}

impl RetractGuard {
    pub fn arm(store: Arc<dyn GroupStore>, teams: Vec<String>) -> Self {
        Self {
            armed: Some((store, teams)),
        }
    }

    /// Run the retract now. Errors are logged, never retried.
    pub fn retract(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some((store, teams)) = self.armed.take() {
            match publisher::retract(store.as_ref(), &teams) {
                Ok(()) => info!(teams = teams.len(), "deleted client configs"),
                Err(err) => error!(error = %err, "failed to delete client config"),
            }
        }
    }
}

impl Drop for RetractGuard {
    fn drop(&mut self) {
        if self.armed.is_some() {
            warn!("leaving serving phase abnormally; deleting client configs");
            self.fire();
        }
    }
}

pub struct Lifecycle {
    store: Arc<dyn GroupStore>,
    teams: Vec<String>,
    bot_name: String,
    channel: String,
    history: Vec<Phase>,
}

impl Lifecycle {
    pub fn new(
        store: Arc<dyn GroupStore>,
        teams: Vec<String>,
        bot_name: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            store,
            teams,
            bot_name: bot_name.into(),
            channel: channel.into(),
            history: vec![Phase::Idle],
        }
    }

    pub fn phase(&self) -> Phase {
        self.history.last().copied().unwrap_or(Phase::Idle)
    }

    /// Every phase entered so far, in order.
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = ?self.phase(), to = ?phase, "lifecycle transition");
        self.history.push(phase);
    }

    /// Publish, serve until `workload` finishes or `shutdown` resolves, then retract.
    ///
    /// A failed publish is fatal and nothing is retracted. The workload is
    /// dropped (cancelled) when `shutdown` wins; its error, if it finished with
    /// one, is returned after cleanup.
    pub async fn run<W, S>(&mut self, workload: W, shutdown: S) -> Result<Exit, SshcaError>
    where
        W: Future<Output = Result<(), SshcaError>>,
        S: Future<Output = ()>,
    {
        self.enter(Phase::Publishing);
        if let Err(err) =
            publisher::publish(self.store.as_ref(), &self.teams, &self.bot_name, &self.channel)
        {
            self.enter(Phase::Terminated);
            return Err(err);
        }
        let guard = RetractGuard::arm(Arc::clone(&self.store), self.teams.clone());

        self.enter(Phase::Serving);
        let outcome = tokio::select! {
            result = workload => result.map(|()| Exit::Completed),
            () = shutdown => {
                info!("closing CA bot...");
                Ok(Exit::Signalled)
            }
        };

        self.enter(Phase::Cleaning);
        guard.retract();
        self.enter(Phase::Terminated);
        outcome
    }
}

/// Resolves on the first SIGINT or SIGTERM delivered to the bot.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(err) => {
            warn!(error = %err, "cannot listen for SIGTERM; only SIGINT will stop the CA bot");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!(signal = "SIGINT", "termination requested"),
        _ = terminate.recv() => info!(signal = "SIGTERM", "termination requested"),
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
