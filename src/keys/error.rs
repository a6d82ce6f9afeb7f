// ABOUTME: Key resolution error types.
// ABOUTME: Covers data directory lookup, discovery globbing and key generation failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("could not determine a user data directory")]
    NoDataDir,

    #[error("could not determine the home directory to expand {0}")]
    NoHomeDir(PathBuf),

    #[error("invalid key search pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("key discovery failed: {0}")]
    Discovery(#[from] glob::GlobError),

    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to generate key: {0}")]
    Generate(String),

    #[error("failed to write key to {path}: {source}")]
    WriteKey {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no {key_type} key found in {dir} after generating one")]
    GeneratedKeyMissing { dir: PathBuf, key_type: String },
}

pub type Result<T> = std::result::Result<T, KeyError>;
