//! # Authentication Module
//!
//! Keeps each account's YouTube access token usable.
//!
//! ## Overview
//!
//! - [`TokenGuard`] checks a stored token against the refresh margin and
//!   refreshes it when needed, one refresh per account at a time
//! - [`TokenRefresher`] is the OAuth refresh-token grant; [`GoogleTokenRefresher`]
//!   posts it to the Google token endpoint
//! - Refresh progress and failures are published as `AuthEvent`s

pub mod error;
pub mod oauth;
pub mod token_guard;
pub mod types;

pub use error::{AuthError, Result};
pub use oauth::{GoogleTokenRefresher, TokenGrant, TokenRefresher};
pub use token_guard::{is_token_valid, TokenGuard};
pub use types::{AccessCredential, OAuthTokens, RefreshOutcome};
