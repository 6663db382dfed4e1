use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a failure reported by a remote video-hosting API.
///
/// Providers decide the kind once, at the edge, so callers never have to
/// inspect provider messages themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteErrorKind {
    QuotaExceeded,
    Unauthorized,
    NotFound,
    RateLimited,
    Other,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RemoteErrorKind::QuotaExceeded => "quota exceeded",
            RemoteErrorKind::Unauthorized => "unauthorized",
            RemoteErrorKind::NotFound => "not found",
            RemoteErrorKind::RateLimited => "rate limited",
            RemoteErrorKind::Other => "remote error",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Remote API error ({kind}): {message}")]
    Remote {
        kind: RemoteErrorKind,
        status: Option<u16>,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns the remote classification when this error came from a provider.
    pub fn remote_kind(&self) -> Option<RemoteErrorKind> {
        match self {
            BridgeError::Remote { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.remote_kind() == Some(RemoteErrorKind::QuotaExceeded)
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_kind_is_exposed() {
        let error = BridgeError::Remote {
            kind: RemoteErrorKind::QuotaExceeded,
            status: Some(403),
            message: "The request cannot be completed".to_string(),
        };

        assert!(error.is_quota_exceeded());
        assert_eq!(error.remote_kind(), Some(RemoteErrorKind::QuotaExceeded));
        assert_eq!(
            error.to_string(),
            "Remote API error (quota exceeded): The request cannot be completed"
        );
    }

    #[test]
    fn test_non_remote_errors_have_no_kind() {
        let error = BridgeError::OperationFailed("boom".to_string());
        assert!(!error.is_quota_exceeded());
        assert_eq!(error.remote_kind(), None);
    }
}
