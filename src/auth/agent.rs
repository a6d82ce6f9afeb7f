// ABOUTME: SSH agent socket resolution and connection.
// ABOUTME: An explicit address wins over SSH_AUTH_SOCK; a missing or unreachable socket is an error.

use super::error::{AuthError, Result};
use russh::keys::agent::client::AgentClient;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::net::UnixStream;

pub const AUTH_SOCK_VAR: &str = "SSH_AUTH_SOCK";

/// Resolve the agent socket from an explicit override or `SSH_AUTH_SOCK`.
pub fn resolve_agent_socket(override_addr: Option<&Path>) -> Result<PathBuf> {
    agent_socket_from(override_addr, std::env::var_os(AUTH_SOCK_VAR))
}

fn agent_socket_from(override_addr: Option<&Path>, env: Option<OsString>) -> Result<PathBuf> {
    let non_blank = |p: &Path| !p.as_os_str().to_string_lossy().trim().is_empty();

    if let Some(addr) = override_addr.filter(|p| non_blank(p)) {
        return Ok(addr.to_path_buf());
    }

    env.map(PathBuf::from)
        .filter(|p| non_blank(p))
        .ok_or_else(|| AuthError::AgentUnavailable(format!("no {AUTH_SOCK_VAR} set")))
}

pub(crate) async fn connect(socket: &Path) -> Result<AgentClient<UnixStream>> {
    tracing::debug!(socket = %socket.display(), "connecting to SSH agent");
    AgentClient::connect_uds(socket)
        .await
        .map_err(|e| AuthError::AgentConnect {
            path: socket.to_path_buf(),
            reason: e.to_string(),
        })
}
