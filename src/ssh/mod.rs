// ABOUTME: SSH client module for the account server.
// ABOUTME: Sessions authenticate with prebuilt methods and run one command per call.

mod client;
mod error;
mod transport;

pub use client::{CommandOutput, HostKeyPolicy, Session, SessionTarget};
pub use error::{Error, Result};
pub use transport::Transport;
