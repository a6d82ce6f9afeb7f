// ABOUTME: Application-wide error types for charm-client.
// ABOUTME: Aggregates module errors and the distinguished account protocol failures.

use crate::auth::AuthError;
use crate::http::HttpError;
use crate::keys::KeyError;
use crate::types::{AccountNameError, PublicKeyError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration from {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read key file {path}: {source}")]
    ReadKeyFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Keys(#[from] KeyError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Ssh(#[from] crate::ssh::Error),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("invalid name: {0}")]
    InvalidName(#[from] AccountNameError),

    #[error(transparent)]
    PublicKey(#[from] PublicKeyError),

    #[error("could not unlink key")]
    CouldNotUnlinkKey,

    #[error("key link rejected: {0}")]
    LinkRejected(String),

    #[error("malformed response from server: {0}")]
    MalformedResponse(String),

    #[error("failed to encode request: {0}")]
    Encode(serde_json::Error),

    #[error("no user data received")]
    NoUserData,
}

pub type Result<T> = std::result::Result<T, Error>;
