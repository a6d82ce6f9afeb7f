// ABOUTME: One-shot command transport over SSH.
// ABOUTME: Every invocation dials, authenticates, runs one command and disconnects.

use super::client::{Session, SessionTarget};
use super::error::Result;
use crate::auth::AuthConfig;
use std::sync::Arc;

/// Runs single commands on the account server, one connection per call.
///
/// There is no connection reuse: concurrent invocations each get their own
/// connection and channel, so their outputs cannot interleave.
#[derive(Debug, Clone)]
pub struct Transport {
    target: SessionTarget,
    auth: Arc<AuthConfig>,
}

impl Transport {
    pub fn new(target: SessionTarget, auth: Arc<AuthConfig>) -> Self {
        Self { target, auth }
    }

    /// Run `command`, writing `stdin` to it first when given.
    ///
    /// Returns stdout on exit status 0. A non-zero exit becomes
    /// [`Error::RemoteExit`](super::Error::RemoteExit). The connection is
    /// closed whether or not the command succeeded.
    pub async fn invoke(&self, command: &str, stdin: Option<&[u8]>) -> Result<Vec<u8>> {
        let session = Session::connect(&self.target, &self.auth).await?;

        let result = session.exec(command, stdin).await;

        if let Err(e) = session.disconnect().await {
            tracing::warn!(host = %self.target.host, "SSH disconnect failed: {}", e);
        }

        result?.into_result()
    }
}
