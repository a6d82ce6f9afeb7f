// ABOUTME: Client configuration: target host, key selection and agent usage.
// ABOUTME: Loaded from CHARM_* environment variables or a YAML file, immutable once built.

mod env;
mod key_type;

pub use key_type::KeyType;

use crate::error::{Error, Result};
use crate::ssh::HostKeyPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_HOST: &str = "cloud.charm.sh";
pub const DEFAULT_SSH_PORT: u16 = 35353;
pub const DEFAULT_HTTP_PORT: u16 = 35354;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub logfile: Option<PathBuf>,

    #[serde(default)]
    pub key_type: KeyType,

    /// Root under which the per-host data directory is created.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Use exactly this private key instead of discovering one.
    #[serde(default)]
    pub identity_key: Option<PathBuf>,

    #[serde(default)]
    pub use_ssh_agent: bool,

    /// Agent socket; falls back to `SSH_AUTH_SOCK` when unset.
    #[serde(default)]
    pub ssh_agent_addr: Option<PathBuf>,

    /// Pin host keys against this known_hosts file. Unset accepts any host key.
    #[serde(default)]
    pub known_hosts: Option<PathBuf>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_ssh_port() -> u16 {
    DEFAULT_SSH_PORT
}

fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

impl Config {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ssh_port: DEFAULT_SSH_PORT,
            http_port: DEFAULT_HTTP_PORT,
            debug: false,
            logfile: None,
            key_type: KeyType::default(),
            data_dir: None,
            identity_key: None,
            use_ssh_agent: false,
            ssh_agent_addr: None,
            known_hosts: None,
        }
    }

    /// Load configuration from CHARM_* environment variables.
    pub fn from_env() -> Result<Self> {
        Config::default().with_env_overrides()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Replace fields with any CHARM_* variables that are set.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(host) = env::string(env::HOST) {
            self.host = host;
        }
        if let Some(port) = env::parsed(env::SSH_PORT)? {
            self.ssh_port = port;
        }
        if let Some(port) = env::parsed(env::HTTP_PORT)? {
            self.http_port = port;
        }
        if let Some(debug) = env::flag(env::DEBUG)? {
            self.debug = debug;
        }
        if let Some(logfile) = env::string(env::LOGFILE) {
            self.logfile = Some(logfile.into());
        }
        if let Some(key_type) = env::string(env::KEY_TYPE) {
            self.key_type = KeyType::parse_lenient(&key_type);
        }
        if let Some(dir) = env::string(env::DATA_DIR) {
            self.data_dir = Some(dir.into());
        }
        if let Some(key) = env::string(env::IDENTITY_KEY) {
            self.identity_key = Some(key.into());
        }
        if let Some(use_agent) = env::flag(env::USE_SSH_AGENT)? {
            self.use_ssh_agent = use_agent;
        }
        if let Some(addr) = env::string(env::SSH_AGENT_ADDR) {
            self.ssh_agent_addr = Some(addr.into());
        }
        if let Some(path) = env::string(env::KNOWN_HOSTS) {
            self.known_hosts = Some(path.into());
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidConfig("host cannot be empty".to_string()));
        }
        if self.ssh_port == 0 {
            return Err(Error::InvalidConfig("SSH port cannot be 0".to_string()));
        }
        Ok(())
    }

    pub fn ssh_port(mut self, port: u16) -> Self {
        self.ssh_port = port;
        self
    }

    pub fn http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    pub fn key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn identity_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_key = Some(path.into());
        self
    }

    pub fn use_ssh_agent(mut self, enabled: bool) -> Self {
        self.use_ssh_agent = enabled;
        self
    }

    pub fn ssh_agent_addr(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_agent_addr = Some(path.into());
        self
    }

    pub fn known_hosts(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts = Some(path.into());
        self
    }

    pub fn host_key_policy(&self) -> HostKeyPolicy {
        match &self.known_hosts {
            Some(path) => HostKeyPolicy::KnownHosts {
                path: Some(path.clone()),
            },
            None => HostKeyPolicy::AcceptAny,
        }
    }
}
