// ABOUTME: Authentication composition error types.
// ABOUTME: Covers agent resolution, unreadable keys and the empty method list.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing SSH auth: no agent and no identity keys available")]
    MissingSshAuth,

    #[error("SSH agent not available: {0}")]
    AgentUnavailable(String),

    #[error("failed to connect to SSH agent at {path}: {reason}")]
    AgentConnect { path: PathBuf, reason: String },

    #[error("failed to load key from {path}: {reason}")]
    KeyLoad { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, AuthError>;
