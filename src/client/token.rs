// ABOUTME: Cache for the bearer token used by HTTP account calls.
// ABOUTME: Check-then-issue runs under one lock so concurrent callers issue at most once.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::future::Future;
use tokio::sync::Mutex;

/// Tokens this close to expiry are replaced rather than reused.
const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    inner: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    /// Return the cached token if still fresh, otherwise call `issue` and cache its result.
    pub(crate) async fn get_or_issue<F, Fut>(&self, issue: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let mut cached = self.inner.lock().await;

        if let Some(entry) = cached.as_ref() {
            if Utc::now() + TimeDelta::seconds(EXPIRY_MARGIN_SECS) < entry.expires_at {
                return Ok(entry.token.clone());
            }
        }

        let token = issue().await?;
        *cached = expiry(&token).map(|expires_at| CachedToken {
            token: token.clone(),
            expires_at,
        });
        if cached.is_none() {
            tracing::debug!("token has no readable expiry, not caching");
        }
        Ok(token)
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// The `exp` claim of a JWT. The signature is not checked; the server does that.
fn expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.trim().split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}
