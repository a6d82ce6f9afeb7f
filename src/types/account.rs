// ABOUTME: Account data returned by the service: user profile and linked keys.
// ABOUTME: Field names follow the service's JSON encoding.

use super::public_key::PublicKeyRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's profile. An empty `name` means no name has been set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub charm_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<KeyEntry>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

/// A key linked to the account, with server-side metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    #[serde(default)]
    pub id: i64,
    pub key: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl KeyEntry {
    pub fn matches(&self, record: &PublicKeyRecord) -> bool {
        // Stored keys may carry a trailing comment.
        let mut parts = self.key.split_whitespace();
        parts.next() == Some(record.algorithm()) && parts.next() == Some(record.material())
    }
}

/// All keys linked to the account, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    #[serde(default)]
    pub active_key: i64,
    #[serde(default)]
    pub keys: Vec<KeyEntry>,
}

impl KeySet {
    pub fn contains(&self, record: &PublicKeyRecord) -> bool {
        self.keys.iter().any(|k| k.matches(record))
    }

    /// The entry for the key used to authenticate this session, if listed.
    pub fn active(&self) -> Option<&KeyEntry> {
        self.keys.iter().find(|k| k.id == self.active_key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
