//! Credential types handed between the refresher, the guard and callers.

use chrono::{DateTime, Utc};
use std::fmt;

/// Token set returned by the OAuth token endpoint, with the expiry already
/// resolved against the clock that requested it.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthTokens {
    pub access_token: String,
    /// `None` when the provider did not rotate the refresh token.
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl OAuthTokens {
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        issued_at: DateTime<Utc>,
        expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: issued_at + chrono::Duration::seconds(expires_in),
        }
    }
}

impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A bearer credential that was valid (outside the refresh margin) when it
/// was handed out.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredential {
    pub account_id: i64,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessCredential {
    pub fn token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCredential")
            .field("account_id", &self.account_id)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Outcome of validating one account during [`refresh_all`](crate::TokenGuard::refresh_all).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Token was still valid; nothing was sent.
    Valid,
    Refreshed { expires_at: DateTime<Utc> },
    Failed { message: String },
    /// Account never signed in, so there is nothing to validate.
    Skipped,
}
