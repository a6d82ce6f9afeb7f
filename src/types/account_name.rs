// ABOUTME: Validated account display name.
// ABOUTME: Accepts 1 to 50 ASCII alphanumeric characters and nothing else.

use std::fmt;
use thiserror::Error;

pub const MAX_NAME_LEN: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountNameError {
    #[error("name cannot be empty")]
    Empty,

    #[error("name exceeds maximum length of 50 characters")]
    TooLong,

    #[error("invalid character in name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountName(String);

impl AccountName {
    pub fn new(value: &str) -> Result<Self, AccountNameError> {
        if value.is_empty() {
            return Err(AccountNameError::Empty);
        }

        if let Some(c) = value.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(AccountNameError::InvalidChar(c));
        }

        // Only ASCII survives the check above, so bytes == chars.
        if value.len() > MAX_NAME_LEN {
            return Err(AccountNameError::TooLong);
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns true if `name` is acceptable as an account name.
pub fn validate_name(name: &str) -> bool {
    AccountName::new(name).is_ok()
}
