use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service initialization failed: {0}")]
    InitializationFailed(String),

    #[error(transparent)]
    Config(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),
}

impl ServiceError {
    /// Whether the failure was the remote quota running out.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, ServiceError::Sync(e) if e.is_quota_exceeded())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
