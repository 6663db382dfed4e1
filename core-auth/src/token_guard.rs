//! # Token Guard
//!
//! Hands out access credentials that are safe to use for at least the refresh
//! margin. A stored token whose expiry is missing or falls inside the margin is
//! refreshed through the [`TokenRefresher`] and the new credential set is
//! persisted on the account before it is returned.
//!
//! Refreshes are serialized per account: concurrent callers for the same
//! account wait on one refresh and then read the stored result.

use crate::error::{AuthError, Result};
use crate::oauth::TokenRefresher;
use crate::types::{AccessCredential, OAuthTokens, RefreshOutcome};
use bridge_traits::time::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use core_library::models::Account;
use core_library::AccountRepository;
use core_runtime::config::DEFAULT_TOKEN_REFRESH_MARGIN;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// `true` when `expiry` is known and still more than `margin` away.
pub fn is_token_valid(
    expiry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    margin: chrono::Duration,
) -> bool {
    expiry.is_some_and(|expiry| now < expiry - margin)
}

pub struct TokenGuard {
    accounts: AccountRepository,
    refresher: Arc<dyn TokenRefresher>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    margin: chrono::Duration,
    refresh_locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl TokenGuard {
    pub fn new(
        accounts: AccountRepository,
        refresher: Arc<dyn TokenRefresher>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            accounts,
            refresher,
            clock: Arc::new(SystemClock),
            event_bus,
            margin: to_chrono(DEFAULT_TOKEN_REFRESH_MARGIN),
            refresh_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = to_chrono(margin);
        self
    }

    /// Returns a credential for `account_id`, refreshing it first when the
    /// stored expiry is missing or inside the margin.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the account row does not exist
    /// - `MissingRefreshToken` if a refresh is needed and none is stored
    /// - whatever the refresher returned, unchanged; nothing is retried
    #[instrument(skip(self), fields(account_id = account_id))]
    pub async fn ensure_valid(&self, account_id: i64) -> Result<AccessCredential> {
        let lock = self.refresh_lock(account_id).await;
        let _guard = lock.lock().await;

        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound(account_id))?;

        let now = self.clock.now();
        if let (Some(access_token), Some(expires_at)) =
            (account.access_token.as_ref(), account.token_expiry)
        {
            if !access_token.is_empty() && is_token_valid(Some(expires_at), now, self.margin) {
                debug!("Stored access token still valid");
                return Ok(AccessCredential {
                    account_id,
                    access_token: access_token.clone(),
                    expires_at,
                });
            }
        }

        self.refresh_locked(&account, now).await
    }

    /// Validates every stored account that has signed in, refreshing those
    /// whose token is inside the margin. One account failing does not stop
    /// the pass.
    #[instrument(skip(self))]
    pub async fn refresh_all(&self) -> Result<Vec<(i64, RefreshOutcome)>> {
        let accounts = self.accounts.list().await?;
        let mut outcomes = Vec::with_capacity(accounts.len());

        for account in accounts {
            if !account.has_access_token() || account.token_expiry.is_none() {
                outcomes.push((account.id, RefreshOutcome::Skipped));
                continue;
            }

            if is_token_valid(account.token_expiry, self.clock.now(), self.margin) {
                outcomes.push((account.id, RefreshOutcome::Valid));
                continue;
            }

            let outcome = match self.ensure_valid(account.id).await {
                Ok(credential) => RefreshOutcome::Refreshed {
                    expires_at: credential.expires_at,
                },
                Err(e) => {
                    warn!(account_id = account.id, error = %e, "Startup token refresh failed");
                    RefreshOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };
            outcomes.push((account.id, outcome));
        }

        Ok(outcomes)
    }

    async fn refresh_locked(
        &self,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<AccessCredential> {
        let account_id = account.id;

        let refresh_token = match account.refresh_token.as_deref() {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => {
                let err = AuthError::MissingRefreshToken { account_id };
                self.emit_auth_error(account_id, &err, false);
                return Err(err);
            }
        };

        self.event_bus
            .emit(CoreEvent::Auth(AuthEvent::TokenRefreshing { account_id }))
            .ok();

        let grant = match self.refresher.refresh(&refresh_token).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.emit_auth_error(account_id, &e, true);
                return Err(e);
            }
        };

        let tokens = OAuthTokens::new(
            grant.access_token,
            grant.refresh_token.filter(|t| !t.is_empty()),
            now,
            grant.expires_in,
        );
        let stored_refresh = tokens.refresh_token.as_deref().unwrap_or(&refresh_token);

        self.accounts
            .update_tokens(
                account_id,
                &tokens.access_token,
                Some(stored_refresh),
                tokens.expires_at,
            )
            .await?;

        info!(expires_at = %tokens.expires_at, "Access token refreshed");
        self.event_bus
            .emit(CoreEvent::Auth(AuthEvent::TokenRefreshed {
                account_id,
                expires_at: tokens.expires_at.timestamp(),
            }))
            .ok();

        Ok(AccessCredential {
            account_id,
            access_token: tokens.access_token,
            expires_at: tokens.expires_at,
        })
    }

    async fn refresh_lock(&self, account_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        locks
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn emit_auth_error(&self, account_id: i64, err: &AuthError, recoverable: bool) {
        self.event_bus
            .emit(CoreEvent::Auth(AuthEvent::AuthError {
                account_id: Some(account_id),
                message: err.to_string(),
                recoverable,
            }))
            .ok();
    }
}

fn to_chrono(margin: Duration) -> chrono::Duration {
    chrono::Duration::from_std(margin).unwrap_or_else(|_| chrono::Duration::minutes(5))
}
