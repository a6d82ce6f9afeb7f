// ABOUTME: Keypair generation for first-time use.
// ABOUTME: Writes an OpenSSH private key (0600) and its .pub counterpart.

use super::error::{KeyError, Result};
use crate::config::KeyType;
use russh::keys::PrivateKey;
use russh::keys::ssh_key::LineEnding;
use russh::keys::ssh_key::rand_core::OsRng;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Path of the public half for a private key file.
pub fn public_key_path(private_key: &Path) -> PathBuf {
    let mut path = OsString::from(private_key.as_os_str());
    path.push(".pub");
    PathBuf::from(path)
}

/// Generate a new keypair of `key_type` at `path` (private) and `path.pub`.
pub fn generate_keypair(path: &Path, key_type: KeyType) -> Result<PrivateKey> {
    if let Some(parent) = path.parent() {
        create_private_dir(parent)?;
    }

    let private_key = PrivateKey::random(&mut OsRng, key_type.algorithm())
        .map_err(|e| KeyError::Generate(e.to_string()))?;

    let private_pem = private_key
        .to_openssh(LineEnding::LF)
        .map_err(|e| KeyError::Generate(e.to_string()))?;
    write_file(path, private_pem.as_bytes(), 0o600)?;

    let public_line = private_key
        .public_key()
        .to_openssh()
        .map_err(|e| KeyError::Generate(e.to_string()))?;
    let pub_path = public_key_path(path);
    write_file(&pub_path, format!("{public_line}\n").as_bytes(), 0o644)?;

    tracing::info!(
        path = %path.display(),
        key_type = %key_type,
        "generated new SSH keypair"
    );

    Ok(private_key)
}

fn create_private_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| KeyError::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)).map_err(
            |source| KeyError::CreateDirectory {
                path: dir.to_path_buf(),
                source,
            },
        )?;
    }

    Ok(())
}

fn write_file(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let to_error = |source| KeyError::WriteKey {
        path: path.to_path_buf(),
        source,
    };

    std::fs::write(path, contents).map_err(to_error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(to_error)?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}
