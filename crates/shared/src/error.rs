use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Status,
    Malformed,
    Validation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LampError {
    #[error("request to lamp backend failed: {0}")]
    Transport(String),
    #[error("lamp backend answered with status {0}")]
    Status(u16),
    #[error("malformed lamp response: {0}")]
    MalformedResponse(String),
    #[error("invalid color: {0} (use #RRGGBB)")]
    InvalidColor(String),
    #[error("invalid time: {0} (use HH:MM)")]
    InvalidTime(String),
}

impl LampError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LampError::Transport(_) => ErrorKind::Transport,
            LampError::Status(_) => ErrorKind::Status,
            LampError::MalformedResponse(_) => ErrorKind::Malformed,
            LampError::InvalidColor(_) | LampError::InvalidTime(_) => ErrorKind::Validation,
        }
    }
}
