// ABOUTME: Typed lookups of CHARM_* environment variables.
// ABOUTME: Empty values count as unset; malformed values name the offending variable.

use crate::error::{Error, Result};
use std::str::FromStr;

pub const HOST: &str = "CHARM_HOST";
pub const SSH_PORT: &str = "CHARM_SSH_PORT";
pub const HTTP_PORT: &str = "CHARM_HTTP_PORT";
pub const DEBUG: &str = "CHARM_DEBUG";
pub const LOGFILE: &str = "CHARM_LOGFILE";
pub const KEY_TYPE: &str = "CHARM_KEY_TYPE";
pub const DATA_DIR: &str = "CHARM_DATA_DIR";
pub const IDENTITY_KEY: &str = "CHARM_IDENTITY_KEY";
pub const USE_SSH_AGENT: &str = "CHARM_USE_SSH_AGENT";
pub const SSH_AGENT_ADDR: &str = "CHARM_SSH_AGENT_ADDR";
pub const KNOWN_HOSTS: &str = "CHARM_KNOWN_HOSTS";

pub fn string(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

pub fn parsed<T>(var: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    string(var)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| Error::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("{raw:?}: {e}"),
            })
        })
        .transpose()
}

pub fn flag(var: &str) -> Result<Option<bool>> {
    string(var)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" | "yes" | "on" => Ok(true),
            "0" | "f" | "false" | "no" | "off" => Ok(false),
            _ => Err(Error::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("{raw:?} is not a boolean"),
            }),
        })
        .transpose()
}
