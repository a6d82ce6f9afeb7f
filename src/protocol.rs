// ABOUTME: Command vocabulary of the account server and how each reply is read.
// ABOUTME: Every operation is one remote command line with an optional JSON stdin payload.

use crate::error::{Error, Result};
use crate::types::PublicKeyRecord;
use serde::de::DeserializeOwned;

/// How a command reports its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Stdout is the result.
    Payload,
    /// Empty stdout means success; anything else is a failure message.
    EmptyOnSuccess,
}

/// A request to the account server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `id`: the account's identity string.
    Id,
    /// `jwt <audience...>`: a signed token for the given audiences.
    Jwt { audience: Vec<String> },
    /// `keys`: plain-text listing of linked keys.
    Keys,
    /// `api-keys`: linked keys with metadata, as JSON.
    ApiKeys,
    /// `api-add-key <json>`: link a key to the account.
    LinkKey(PublicKeyRecord),
    /// `api-unlink <json>`: remove a key from the account.
    UnlinkKey(PublicKeyRecord),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Id => "id",
            Command::Jwt { .. } => "jwt",
            Command::Keys => "keys",
            Command::ApiKeys => "api-keys",
            Command::LinkKey(_) => "api-add-key",
            Command::UnlinkKey(_) => "api-unlink",
        }
    }

    /// The full command line sent to the server.
    ///
    /// Key commands carry their JSON inline as well as on stdin; servers in
    /// the wild read one or the other.
    pub fn line(&self) -> Result<String> {
        match self {
            Command::Jwt { audience } => Ok(std::iter::once("jwt")
                .chain(audience.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ")),
            Command::LinkKey(key) | Command::UnlinkKey(key) => {
                let json = serde_json::to_string(key).map_err(Error::Encode)?;
                Ok(format!("{} {}", self.name(), json))
            }
            _ => Ok(self.name().to_string()),
        }
    }

    /// Bytes to write on stdin: newline-terminated JSON for key commands.
    pub fn stdin(&self) -> Result<Option<Vec<u8>>> {
        match self {
            Command::LinkKey(key) | Command::UnlinkKey(key) => {
                let mut json = serde_json::to_vec(key).map_err(Error::Encode)?;
                json.push(b'\n');
                Ok(Some(json))
            }
            _ => Ok(None),
        }
    }

    pub fn reply(&self) -> Reply {
        match self {
            Command::LinkKey(_) | Command::UnlinkKey(_) => Reply::EmptyOnSuccess,
            _ => Reply::Payload,
        }
    }

    /// Interpret an `EmptyOnSuccess` reply.
    pub fn check_empty(&self, output: &[u8]) -> Result<()> {
        if output.is_empty() {
            return Ok(());
        }
        match self {
            Command::UnlinkKey(_) => Err(Error::CouldNotUnlinkKey),
            _ => Err(Error::LinkRejected(
                String::from_utf8_lossy(output).trim().to_string(),
            )),
        }
    }
}

/// Decode a text reply.
pub fn decode_text(output: Vec<u8>) -> Result<String> {
    String::from_utf8(output)
        .map_err(|e| Error::MalformedResponse(format!("reply is not UTF-8: {}", e)))
}

/// Decode a JSON reply.
pub fn decode_json<T: DeserializeOwned>(output: &[u8]) -> Result<T> {
    serde_json::from_slice(output).map_err(|e| Error::MalformedResponse(e.to_string()))
}
