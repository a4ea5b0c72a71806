use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VbrError {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Config(ConfigError),
    #[error("{0}")]
    Backend(BackendError),
    #[error("{0}")]
    Selection(SelectionError),
    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {0}: {1}")]
    Read(String, String),
    #[error("parse config: {0}")]
    Parse(String),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{program}: {reason}")]
    Spawn { program: String, reason: String },
    #[error("{operation} failed (exit code {code}): {stderr}")]
    Failed {
        operation: String,
        code: i32,
        stderr: String,
    },
    #[error("{operation}: unexpected output: {reason}")]
    Output { operation: String, reason: String },
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("no jobs matched selection")]
    NoMatch,
    #[error("refusing to {0} every job; add a filter or pass --all")]
    Unfiltered(String),
    #[error("list file {0}: {1}")]
    ListFile(String, String),
    #[error("aborted; no jobs were changed")]
    Declined,
}

pub type Result<T> = std::result::Result<T, VbrError>;

impl VbrError {
    pub fn message(msg: impl Into<String>) -> Self {
        VbrError::Message(msg.into())
    }
}

impl From<ConfigError> for VbrError {
    fn from(err: ConfigError) -> Self {
        VbrError::Config(err)
    }
}

impl From<BackendError> for VbrError {
    fn from(err: BackendError) -> Self {
        VbrError::Backend(err)
    }
}

impl From<SelectionError> for VbrError {
    fn from(err: SelectionError) -> Self {
        VbrError::Selection(err)
    }
}
