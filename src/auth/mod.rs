// ABOUTME: Composition of SSH authentication methods from an agent and on-disk keys.
// ABOUTME: Methods keep their order (agent first) and the list is never empty.

mod agent;
mod error;

pub use agent::{AUTH_SOCK_VAR, resolve_agent_socket};
pub use error::{AuthError, Result};

use crate::keys::KeyDescriptor;
use nonempty::NonEmpty;
use russh::keys::agent::client::AgentClient;
use russh::keys::{PrivateKey, load_secret_key};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::UnixStream;
use tokio::sync::Mutex;

/// Fixed account name used for every SSH connection.
pub const SSH_USER: &str = "charm";

/// One way of proving identity to the server.
pub enum AuthMethod {
    /// Sign with keys held by a running SSH agent.
    Agent {
        socket: PathBuf,
        client: Arc<Mutex<AgentClient<UnixStream>>>,
    },
    /// Sign with a private key read from disk.
    PublicKey { path: PathBuf, key: Arc<PrivateKey> },
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Agent { socket, .. } => f
                .debug_struct("Agent")
                .field("socket", socket)
                .finish_non_exhaustive(),
            AuthMethod::PublicKey { path, key } => f
                .debug_struct("PublicKey")
                .field("path", path)
                .field("algorithm", &key.algorithm())
                .finish(),
        }
    }
}

/// Authentication settings shared by every session a client opens.
#[derive(Debug)]
pub struct AuthConfig {
    user: String,
    methods: NonEmpty<AuthMethod>,
}

impl AuthConfig {
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Methods in the order they are offered to the server.
    pub fn methods(&self) -> &NonEmpty<AuthMethod> {
        &self.methods
    }
}

/// Builds an [`AuthConfig`]. The agent, when requested, is always tried first.
#[derive(Debug, Default)]
pub struct AuthBuilder {
    user: String,
    agent_socket: Option<PathBuf>,
    keys: Vec<KeyDescriptor>,
}

impl AuthBuilder {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            agent_socket: None,
            keys: Vec::new(),
        }
    }

    pub fn agent(mut self, socket: impl Into<PathBuf>) -> Self {
        self.agent_socket = Some(socket.into());
        self
    }

    pub fn key(mut self, key: KeyDescriptor) -> Self {
        self.keys.push(key);
        self
    }

    pub fn keys(mut self, keys: impl IntoIterator<Item = KeyDescriptor>) -> Self {
        self.keys.extend(keys);
        self
    }

    /// Connect to the agent (if any) and load every key.
    ///
    /// Any failure is fatal: an agent that was asked for but cannot be
    /// reached, or a key that cannot be parsed, is never skipped.
    pub async fn build(self) -> Result<AuthConfig> {
        let mut methods = Vec::with_capacity(self.keys.len() + 1);

        if let Some(socket) = self.agent_socket {
            let client = agent::connect(&socket).await?;
            methods.push(AuthMethod::Agent {
                socket,
                client: Arc::new(Mutex::new(client)),
            });
        }

        for desc in &self.keys {
            methods.push(load_key_method(desc)?);
        }

        let methods = NonEmpty::from_vec(methods).ok_or(AuthError::MissingSshAuth)?;
        tracing::debug!(count = methods.len(), "assembled SSH auth methods");

        Ok(AuthConfig {
            user: self.user,
            methods,
        })
    }
}

fn load_key_method(desc: &KeyDescriptor) -> Result<AuthMethod> {
    let key = load_secret_key(&desc.path, None).map_err(|e| AuthError::KeyLoad {
        path: desc.path.clone(),
        reason: e.to_string(),
    })?;
    Ok(AuthMethod::PublicKey {
        path: desc.path.clone(),
        key: Arc::new(key),
    })
}
