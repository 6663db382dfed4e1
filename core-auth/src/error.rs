use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    #[error("Account {account_id} has no refresh token; sign in again")]
    MissingRefreshToken { account_id: i64 },

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
