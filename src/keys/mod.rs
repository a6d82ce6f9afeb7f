// ABOUTME: Per-host key store: data directory resolution, key discovery and generation.
// ABOUTME: Discovery is deterministic and generates at most one keypair when nothing is found.

mod error;
mod generate;

pub use error::{KeyError, Result};
pub use generate::{generate_keypair, public_key_path};

use crate::config::{Config, KeyType};
use std::path::{Path, PathBuf};

/// Application directory name under the user data root.
pub const APP_NAME: &str = "charm";
/// File name prefix of managed keys: `charm_<key type>`.
pub const KEY_PREFIX: &str = "charm";

/// A candidate identity key on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    pub path: PathBuf,
    pub key_type: Option<KeyType>,
}

impl KeyDescriptor {
    pub fn new(path: impl Into<PathBuf>, key_type: KeyType) -> Self {
        Self {
            path: path.into(),
            key_type: Some(key_type),
        }
    }

    /// Describe an arbitrary key file, inferring the type from a `_<type>` suffix.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let key_type = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.rsplit_once('_'))
            .and_then(|(_, suffix)| suffix.parse().ok());
        Self { path, key_type }
    }
}

/// Resolve the per-host data directory.
///
/// An explicit `data_dir` wins (`<data_dir>/<host>`); otherwise the platform
/// user data directory is used (`<data root>/charm/<host>`).
pub fn resolve_data_path(config: &Config) -> Result<PathBuf> {
    if let Some(dir) = &config.data_dir {
        return Ok(expand_home(dir)?.join(&config.host));
    }
    dirs::data_dir()
        .map(|root| root.join(APP_NAME).join(&config.host))
        .ok_or(KeyError::NoDataDir)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    dirs::home_dir()
        .map(|home| home.join(rest))
        .ok_or_else(|| KeyError::NoHomeDir(path.to_path_buf()))
}

/// Keys for one (data directory, key type) pair.
#[derive(Debug, Clone)]
pub struct KeyStore {
    data_path: PathBuf,
    key_type: KeyType,
}

impl KeyStore {
    pub fn new(data_path: impl Into<PathBuf>, key_type: KeyType) -> Self {
        Self {
            data_path: data_path.into(),
            key_type,
        }
    }

    pub fn for_config(config: &Config) -> Result<Self> {
        Ok(Self::new(resolve_data_path(config)?, config.key_type))
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Conventional private key path: `<data path>/charm_<key type>`.
    pub fn key_path(&self) -> PathBuf {
        self.data_path.join(self.file_name())
    }

    fn file_name(&self) -> String {
        format!("{}_{}", KEY_PREFIX, self.key_type)
    }

    /// Find existing keys of this store's type. Returns an empty list when none exist.
    pub fn discover(&self) -> Result<Vec<KeyDescriptor>> {
        let dir = glob::Pattern::escape(&self.data_path.to_string_lossy());
        let pattern = format!("{}/{}_*", dir, KEY_PREFIX);
        let wanted = self.file_name();

        let mut found = Vec::new();
        for entry in glob::glob(&pattern)? {
            let path = entry?;
            if path.file_name().and_then(|n| n.to_str()) == Some(wanted.as_str()) {
                found.push(KeyDescriptor::new(path, self.key_type));
            }
        }
        found.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::debug!(
            dir = %self.data_path.display(),
            key_type = %self.key_type,
            count = found.len(),
            "discovered keys"
        );
        Ok(found)
    }

    /// Discover keys, generating exactly one keypair if none exist.
    ///
    /// Discovery runs at most twice; an empty result after generation is an error.
    pub fn ensure_keys(&self) -> Result<Vec<KeyDescriptor>> {
        let found = self.discover()?;
        if !found.is_empty() {
            return Ok(found);
        }

        generate_keypair(&self.key_path(), self.key_type)?;

        let found = self.discover()?;
        if found.is_empty() {
            return Err(KeyError::GeneratedKeyMissing {
                dir: self.data_path.clone(),
                key_type: self.key_type.to_string(),
            });
        }
        Ok(found)
    }
}

/// Keys to authenticate with: the explicit identity key if configured,
/// otherwise the discovered (or freshly generated) store keys.
pub fn resolve_keys(config: &Config) -> Result<Vec<KeyDescriptor>> {
    if let Some(identity) = &config.identity_key {
        return Ok(vec![KeyDescriptor::from_path(expand_home(identity)?)]);
    }
    KeyStore::for_config(config)?.ensure_keys()
}
