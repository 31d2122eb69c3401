//! Join barrier for independent fan-out tasks.
//!
//! Launch N tasks, then block until all N have completed, collecting one
//! outcome per task. Siblings never cancel each other and complete in any order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tokio::task::JoinSet;

/// Result of one task in a [`TaskGroup`].
#[derive(Debug)]
pub struct TaskOutcome<T> {
    pub label: String,
    /// `Err` carries the panic message when the task did not run to completion.
    pub result: Result<T, String>,
}

pub struct TaskGroup<T> {
    set: JoinSet<TaskOutcome<T>>,
    launched: usize,
}

impl<T: Send + 'static> TaskGroup<T> {
    pub fn new() -> Self {
        Self {
            set: JoinSet::new(),
            launched: 0,
        }
    }

    /// Run `task` on the blocking pool. Must be called within a Tokio runtime.
    pub fn spawn_blocking<F>(&mut self, label: impl Into<String>, task: F)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let label = label.into();
        self.set.spawn_blocking(move || TaskOutcome {
            result: panic::catch_unwind(AssertUnwindSafe(task)).map_err(panic_message),
            label,
        });
        self.launched += 1;
    }

    pub fn len(&self) -> usize {
        self.launched
    }

    pub fn is_empty(&self) -> bool {
        self.launched == 0
    }

    /// Wait for every launched task. `on_complete` observes each outcome as it lands.
    pub async fn join_all<C>(mut self, mut on_complete: C) -> Vec<TaskOutcome<T>>
    where
        C: FnMut(&TaskOutcome<T>),
    {
        let mut outcomes = Vec::with_capacity(self.launched);
        while let Some(joined) = self.set.join_next().await {
            let outcome = joined.unwrap_or_else(|err| TaskOutcome {
                label: String::new(),
                result: Err(err.to_string()),
            });
            on_complete(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }
}

impl<T: Send + 'static> Default for TaskGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("task panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("task panicked: {}", msg)
    } else {
        "task panicked".to_string()
    }
}
