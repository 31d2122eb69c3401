use crate::core::store::StoreError;
use std::fmt;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SshcaError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{} team(s) failed: {}", .0.len(), GroupFailure::join(.0))]
    PartialFailure(Vec<GroupFailure>),
}

/// One group's failure inside a fan-out operation.
#[derive(Debug)]
pub struct GroupFailure {
    pub group: String,
    pub error: StoreError,
}

impl GroupFailure {
    fn join(failures: &[GroupFailure]) -> String {
        let messages = failures.iter().map(|f| f.to_string()).collect::<Vec<_>>();
        crate::core::output::failure_summary(&messages, 3, 120)
    }
}

impl fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.group, self.error)
    }
}
