// ABOUTME: Account client: resolves identity keys once, then runs account operations.
// ABOUTME: SSH commands go through the one-shot transport; profile calls through the JSON API.

mod token;

use crate::auth::{AuthBuilder, SSH_USER, resolve_agent_socket};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::{HttpApi, JsonApi};
use crate::keys::{self, KeyDescriptor};
use crate::protocol::{self, Command, Reply};
use crate::ssh::{SessionTarget, Transport};
use crate::types::{AccountName, KeySet, PublicKeyRecord, User};
use hyper::Method;
use russh::keys::PublicKey;
use std::path::PathBuf;
use std::sync::Arc;
use token::TokenCache;

/// Audience requested for tokens that authenticate HTTP API calls.
pub const API_AUDIENCE: &str = "charm";

/// A logged-in account client.
///
/// Construction resolves keys (generating one on first use) and assembles the
/// SSH authentication methods. Each operation afterwards opens its own SSH
/// connection, so one `Client` can serve concurrent callers. Dropping it
/// closes the agent connection.
pub struct Client {
    config: Config,
    transport: Transport,
    api: Arc<dyn JsonApi>,
    token: TokenCache,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Build a client that talks HTTP to `config.host:config.http_port`.
    pub async fn new(config: Config) -> Result<Self> {
        let api = Arc::new(HttpApi::new(config.host.clone(), config.http_port));
        Self::with_api(config, api).await
    }

    /// Build a client from `CHARM_*` environment variables.
    pub async fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?).await
    }

    /// Build a client with a custom JSON API implementation.
    pub async fn with_api(config: Config, api: Arc<dyn JsonApi>) -> Result<Self> {
        config.validate()?;

        // Resolve the agent socket before touching the key store so a missing
        // agent fails without generating keys.
        let agent_socket = if config.use_ssh_agent {
            Some(resolve_agent_socket(config.ssh_agent_addr.as_deref())?)
        } else {
            None
        };

        let identities: Vec<KeyDescriptor> = keys::resolve_keys(&config)?;

        let mut builder = AuthBuilder::new(SSH_USER);
        if let Some(socket) = agent_socket {
            builder = builder.agent(socket);
        }
        let auth = builder.keys(identities).build().await?;

        let target = SessionTarget::new(config.host.clone(), config.ssh_port)
            .host_key_policy(config.host_key_policy());

        Ok(Self {
            transport: Transport::new(target, Arc::new(auth)),
            config,
            api,
            token: TokenCache::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory holding this host's keys.
    pub fn data_path(&self) -> Result<PathBuf> {
        Ok(keys::resolve_data_path(&self.config)?)
    }

    async fn run(&self, command: &Command) -> Result<Vec<u8>> {
        let line = command.line()?;
        let stdin = command.stdin()?;
        let output = self.transport.invoke(&line, stdin.as_deref()).await?;

        if command.reply() == Reply::EmptyOnSuccess {
            command.check_empty(&output)?;
        }
        Ok(output)
    }

    /// The account's identity string.
    pub async fn id(&self) -> Result<String> {
        let output = self.run(&Command::Id).await?;
        protocol::decode_text(output)
    }

    /// Issue a JWT for the given audiences.
    pub async fn jwt(&self, audience: &[&str]) -> Result<String> {
        let command = Command::Jwt {
            audience: audience.iter().map(|a| a.to_string()).collect(),
        };
        let output = self.run(&command).await?;
        protocol::decode_text(output)
    }

    /// Plain-text listing of the keys linked to the account.
    pub async fn authorized_keys(&self) -> Result<String> {
        let output = self.run(&Command::Keys).await?;
        protocol::decode_text(output)
    }

    /// Keys linked to the account, with metadata.
    pub async fn authorized_keys_with_metadata(&self) -> Result<KeySet> {
        let output = self.run(&Command::ApiKeys).await?;
        protocol::decode_json(&output)
    }

    /// Link a public key to the account.
    pub async fn link_key(&self, key: &PublicKey) -> Result<()> {
        self.link_key_record(PublicKeyRecord::from_public_key(key)?)
            .await
    }

    /// Link a key given as authorized-keys text (`type base64 [comment]`).
    pub async fn link_key_text(&self, text: &str) -> Result<()> {
        self.link_key_record(PublicKeyRecord::parse(text)?).await
    }

    pub async fn link_key_record(&self, record: PublicKeyRecord) -> Result<()> {
        self.run(&Command::LinkKey(record)).await.map(|_| ())
    }

    /// Remove a key from the account.
    ///
    /// Any output from the server means the key was not removed and yields
    /// [`Error::CouldNotUnlinkKey`].
    pub async fn unlink_key(&self, record: &PublicKeyRecord) -> Result<()> {
        self.run(&Command::UnlinkKey(record.clone()))
            .await
            .map(|_| ())
    }

    /// The account's profile.
    pub async fn bio(&self) -> Result<User> {
        let id = self.id().await?;
        let token = self.auth_token().await?;
        let path = format!("/v1/id/{}", urlencoding::encode(&id));

        let value = self.api.request(Method::GET, &path, &token, None).await?;
        if value.is_null() {
            return Err(Error::NoUserData);
        }
        serde_json::from_value(value).map_err(|e| Error::MalformedResponse(e.to_string()))
    }

    /// Set the account's display name. Invalid names are rejected before any network call.
    pub async fn set_name(&self, name: &str) -> Result<User> {
        let name = AccountName::new(name)?;
        let token = self.auth_token().await?;

        let user = User {
            name: name.into_inner(),
            ..User::default()
        };
        let body = serde_json::to_value(&user).map_err(Error::Encode)?;

        let value = self
            .api
            .request(Method::POST, "/v1/bio", &token, Some(body))
            .await?;
        if value.is_null() {
            return Ok(user);
        }
        serde_json::from_value(value).map_err(|e| Error::MalformedResponse(e.to_string()))
    }

    async fn auth_token(&self) -> Result<String> {
        self.token
            .get_or_issue(|| async { self.jwt(&[API_AUDIENCE]).await })
            .await
    }
}
