// ABOUTME: SSH-specific error types.
// ABOUTME: Covers dialing, authentication, channel failures and non-zero remote exits.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication failed: no method was accepted")]
    AuthenticationFailed,

    #[error("SSH agent error: {0}")]
    Agent(String),

    #[error("command execution failed: {0}")]
    CommandFailed(String),

    #[error("remote command exited with status {code}: {}", String::from_utf8_lossy(.output).trim())]
    RemoteExit { code: u32, output: Vec<u8> },

    #[error("channel closed unexpectedly without exit status")]
    ChannelClosed,

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
