// ABOUTME: SSH session management using russh.
// ABOUTME: Handles dialing, ordered authentication and single-command execution.

use super::error::{Error, Result};
use crate::auth::{AuthConfig, AuthMethod};
use russh::client::{self, Config, Handle};
use russh::keys::known_hosts::{check_known_hosts, check_known_hosts_path};
use russh::keys::{PrivateKeyWithHashAlg, ssh_key};
use russh::{ChannelMsg, Disconnect};
use std::path::PathBuf;
use std::sync::Arc;

/// How the server's host key is checked.
///
/// `AcceptAny` trusts every host key. It is the default for the account
/// service, which is reached at a known address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    #[default]
    AcceptAny,
    /// Require a matching entry in a known_hosts file
    /// (`~/.ssh/known_hosts` when `path` is None).
    KnownHosts { path: Option<PathBuf> },
}

/// Where to connect.
#[derive(Debug, Clone)]
pub struct SessionTarget {
    pub host: String,
    pub port: u16,
    pub host_key_policy: HostKeyPolicy,
}

impl SessionTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            host_key_policy: HostKeyPolicy::default(),
        }
    }

    pub fn host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }
}

/// Output from a remote command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: u32,
    /// Standard output.
    pub stdout: Vec<u8>,
    /// Standard error.
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout on success; otherwise a `RemoteExit` carrying stdout then stderr.
    pub fn into_result(self) -> Result<Vec<u8>> {
        if self.success() {
            return Ok(self.stdout);
        }
        let mut output = self.stdout;
        output.extend_from_slice(&self.stderr);
        Err(Error::RemoteExit {
            code: self.exit_code,
            output,
        })
    }
}

/// SSH client handler for russh.
pub(crate) struct SshHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match &self.policy {
            HostKeyPolicy::AcceptAny => {
                tracing::debug!(
                    "accepting host key for {}:{} without verification",
                    self.host,
                    self.port
                );
                Ok(true)
            }
            HostKeyPolicy::KnownHosts { path } => {
                let check_result = match path {
                    Some(path) => {
                        check_known_hosts_path(&self.host, self.port, server_public_key, path)
                    }
                    None => check_known_hosts(&self.host, self.port, server_public_key),
                };
                match check_result {
                    Ok(true) => Ok(true),
                    Ok(false) => {
                        tracing::warn!("unknown host key for {}:{}", self.host, self.port);
                        Ok(false)
                    }
                    Err(e) => {
                        tracing::warn!(
                            "host key verification failed for {}:{}: {}",
                            self.host,
                            self.port,
                            e
                        );
                        Ok(false)
                    }
                }
            }
        }
    }
}

/// An established, authenticated SSH connection.
pub struct Session {
    target: SessionTarget,
    handle: Handle<SshHandler>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.target)
            .field("handle", &"<russh::Handle>")
            .finish()
    }
}

impl Session {
    /// Dial the target and authenticate with the configured methods, in order.
    pub async fn connect(target: &SessionTarget, auth: &AuthConfig) -> Result<Self> {
        tracing::debug!(host = %target.host, port = target.port, "dialing SSH");

        let handler = SshHandler {
            host: target.host.clone(),
            port: target.port,
            policy: target.host_key_policy.clone(),
        };

        let mut handle = client::connect(
            Arc::new(Config::default()),
            (target.host.as_str(), target.port),
            handler,
        )
        .await
        .map_err(|e| {
            if e.to_string().contains("Connection refused") {
                Error::Connection(format!(
                    "connection refused to {}:{}",
                    target.host, target.port
                ))
            } else {
                Error::Connection(e.to_string())
            }
        })?;

        if !Self::authenticate(&mut handle, auth).await? {
            return Err(Error::AuthenticationFailed);
        }

        Ok(Self {
            target: target.clone(),
            handle,
        })
    }

    /// Try each method in order; the first one the server accepts wins.
    async fn authenticate(handle: &mut Handle<SshHandler>, auth: &AuthConfig) -> Result<bool> {
        for method in auth.methods().iter() {
            let accepted = match method {
                AuthMethod::Agent { client, .. } => {
                    let mut agent = client.lock().await;
                    let keys = agent
                        .request_identities()
                        .await
                        .map_err(|e| Error::Agent(format!("failed to list agent keys: {}", e)))?;

                    let mut accepted = false;
                    for key in &keys {
                        match handle
                            .authenticate_publickey_with(auth.user(), key.clone(), None, &mut *agent)
                            .await
                        {
                            Ok(result) if result.success() => {
                                accepted = true;
                                break;
                            }
                            _ => continue,
                        }
                    }
                    accepted
                }
                AuthMethod::PublicKey { key, path } => {
                    let hash_alg = handle
                        .best_supported_rsa_hash()
                        .await
                        .map_err(Error::Protocol)?
                        .flatten();

                    let result = handle
                        .authenticate_publickey(
                            auth.user(),
                            PrivateKeyWithHashAlg::new(Arc::clone(key), hash_alg),
                        )
                        .await
                        .map_err(Error::Protocol)?;

                    if !result.success() {
                        tracing::debug!(key = %path.display(), "key not accepted");
                    }
                    result.success()
                }
            };

            if accepted {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Run one command on a fresh channel, feeding `stdin` (if any) and then EOF.
    pub async fn exec(&self, command: &str, stdin: Option<&[u8]>) -> Result<CommandOutput> {
        tracing::debug!(command, "executing remote command");

        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| Error::CommandFailed(format!("failed to open channel: {}", e)))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| Error::CommandFailed(format!("failed to exec command: {}", e)))?;

        if let Some(input) = stdin {
            channel
                .data(input)
                .await
                .map_err(|e| Error::CommandFailed(format!("failed to write stdin: {}", e)))?;
        }
        // Close stdin even when empty so commands reading to EOF finish.
        channel
            .eof()
            .await
            .map_err(|e| Error::CommandFailed(format!("failed to close stdin: {}", e)))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = 0u32;

        let mut got_exit_status = false;
        let mut got_eof = false;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    stdout.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    if ext == 1 {
                        stderr.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    exit_code = exit_status;
                    got_exit_status = true;
                    if got_eof {
                        break;
                    }
                }
                Some(ChannelMsg::Eof) => {
                    got_eof = true;
                    if got_exit_status {
                        break;
                    }
                }
                Some(ChannelMsg::Close) => {
                    break;
                }
                Some(_) => {}
                None => break,
            }
        }

        // No exit status means the channel died (network failure, server abort).
        if !got_exit_status {
            return Err(Error::ChannelClosed);
        }

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }

    /// Disconnect the session.
    pub async fn disconnect(self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(Error::Protocol)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_returns_stdout_only() {
        let output = CommandOutput {
            exit_code: 0,
            stdout: b"ok\n".to_vec(),
            stderr: b"warning\n".to_vec(),
        };
        assert_eq!(output.into_result().unwrap(), b"ok\n");

        let output = CommandOutput {
            exit_code: 0,
            stdout: Vec::new(),
            stderr: b"warning\n".to_vec(),
        };
        assert!(output.into_result().unwrap().is_empty());
    }

    #[test]
    fn non_zero_exit_keeps_output() {
        let output = CommandOutput {
            exit_code: 2,
            stdout: Vec::new(),
            stderr: b"denied".to_vec(),
        };
        match output.into_result() {
            Err(Error::RemoteExit { code, output }) => {
                assert_eq!(code, 2);
                assert_eq!(output, b"denied");
            }
            other => panic!("expected RemoteExit, got {:?}", other),
        }
    }

    #[test]
    fn targets_accept_any_host_key_by_default() {
        let target = SessionTarget::new("charm.example.com", 35353);
        assert_eq!(target.host_key_policy, HostKeyPolicy::AcceptAny);
    }
}
