// ABOUTME: Canonical on-wire form of an SSH public key.
// ABOUTME: Renders and parses "<algorithm> <base64>" authorized-key text without comments.

use russh::keys::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublicKeyError {
    #[error("public key text is empty")]
    Empty,

    #[error("public key is missing its key material")]
    MissingMaterial,

    #[error("invalid public key: {0}")]
    Invalid(String),
}

/// A public key as exchanged with the account service: `{"key": "<type> <base64>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKeyRecord {
    key: String,
}

impl PublicKeyRecord {
    /// Build the record for a parsed SSH public key, dropping any comment.
    pub fn from_public_key(key: &PublicKey) -> Result<Self, PublicKeyError> {
        let openssh = key
            .to_openssh()
            .map_err(|e| PublicKeyError::Invalid(e.to_string()))?;
        Self::parse(&openssh)
    }

    /// Parse an authorized-keys style line (`type base64 [comment]`).
    pub fn parse(text: &str) -> Result<Self, PublicKeyError> {
        let mut parts = text.split_whitespace();
        let algorithm = parts.next().ok_or(PublicKeyError::Empty)?;
        let material = parts.next().ok_or(PublicKeyError::MissingMaterial)?;

        let key = format!("{algorithm} {material}");
        PublicKey::from_openssh(&key).map_err(|e| PublicKeyError::Invalid(e.to_string()))?;

        Ok(Self { key })
    }

    pub fn algorithm(&self) -> &str {
        self.key.split(' ').next().unwrap_or_default()
    }

    pub fn material(&self) -> &str {
        self.key.split(' ').nth(1).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for PublicKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}
