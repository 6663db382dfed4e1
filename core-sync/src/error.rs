use bridge_traits::error::{BridgeError, RemoteErrorKind};
use core_auth::AuthError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Daily API quota is spent; the upload queue latches on this.
    #[error("YouTube API quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("{message}")]
    RemoteApi { message: String },

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Video {video_id} is already queued")]
    AlreadyQueued { video_id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Sync cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        SyncError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, SyncError::QuotaExceeded { .. })
    }
}

impl From<BridgeError> for SyncError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Remote {
                kind: RemoteErrorKind::QuotaExceeded,
                message,
                ..
            } => SyncError::QuotaExceeded { message },
            BridgeError::Remote { message, .. } => SyncError::RemoteApi { message },
            BridgeError::Io(e) => SyncError::Storage(e.to_string()),
            BridgeError::DatabaseError(msg) => SyncError::Storage(msg),
            other => SyncError::RemoteApi {
                message: other.to_string(),
            },
        }
    }
}

impl From<LibraryError> for SyncError {
    fn from(error: LibraryError) -> Self {
        match error {
            LibraryError::NotFound { entity_type, id } => SyncError::NotFound { entity_type, id },
            LibraryError::InvalidInput { field, message } => {
                SyncError::InvalidInput(format!("{}: {}", field, message))
            }
            other => SyncError::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_is_routed_from_remote_kind() {
        let quota: SyncError = BridgeError::Remote {
            kind: RemoteErrorKind::QuotaExceeded,
            status: Some(403),
            message: "exceeded your quota".to_string(),
        }
        .into();
        assert!(quota.is_quota_exceeded());

        let other: SyncError = BridgeError::Remote {
            kind: RemoteErrorKind::Other,
            status: Some(400),
            message: "Invalid video category".to_string(),
        }
        .into();
        assert!(!other.is_quota_exceeded());
        assert_eq!(other.to_string(), "Invalid video category");
    }

    #[test]
    fn test_library_not_found_keeps_entity() {
        let err: SyncError = LibraryError::not_found("video", 12).into();
        assert_eq!(err.to_string(), "video not found: 12");
    }
}
