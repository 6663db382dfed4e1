//! Error types for the YouTube provider

use crate::types::GoogleErrorEnvelope;
use bridge_traits::error::{BridgeError, RemoteErrorKind};
use thiserror::Error;

/// Reasons YouTube uses when the project's daily quota is spent.
const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded"];

const RATE_LIMIT_REASONS: &[&str] = &["rateLimitExceeded", "userRateLimitExceeded"];

#[derive(Error, Debug)]
pub enum YouTubeError {
    /// Daily API quota exhausted; further writes will fail until it resets
    #[error("YouTube API quota exceeded: {message}")]
    QuotaExceeded { status_code: u16, message: String },

    #[error("YouTube API rate limit hit: {message}")]
    RateLimited { status_code: u16, message: String },

    #[error("YouTube API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, YouTubeError>;

/// Classifies a non-success API response.
///
/// The provider's own message is kept when the body is a Google error
/// envelope; otherwise the raw body is used.
pub fn classify_remote_error(status_code: u16, body: &str) -> YouTubeError {
    let envelope = serde_json::from_str::<GoogleErrorEnvelope>(body).ok();

    let message = envelope
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    let reasons: Vec<&str> = envelope
        .as_ref()
        .map(|e| e.error.errors.iter().map(|item| item.reason.as_str()).collect())
        .unwrap_or_default();

    let quota = reasons.iter().any(|r| QUOTA_REASONS.contains(r))
        || message.to_ascii_lowercase().contains("quota");
    if quota {
        return YouTubeError::QuotaExceeded {
            status_code,
            message,
        };
    }

    if status_code == 429 || reasons.iter().any(|r| RATE_LIMIT_REASONS.contains(r)) {
        return YouTubeError::RateLimited {
            status_code,
            message,
        };
    }

    YouTubeError::ApiError {
        status_code,
        message,
    }
}

impl From<YouTubeError> for BridgeError {
    fn from(error: YouTubeError) -> Self {
        match error {
            YouTubeError::QuotaExceeded {
                status_code,
                message,
            } => BridgeError::Remote {
                kind: RemoteErrorKind::QuotaExceeded,
                status: Some(status_code),
                message,
            },
            YouTubeError::RateLimited {
                status_code,
                message,
            } => BridgeError::Remote {
                kind: RemoteErrorKind::RateLimited,
                status: Some(status_code),
                message,
            },
            YouTubeError::ApiError {
                status_code,
                message,
            } => {
                let kind = match status_code {
                    401 => RemoteErrorKind::Unauthorized,
                    404 => RemoteErrorKind::NotFound,
                    _ => RemoteErrorKind::Other,
                };
                BridgeError::Remote {
                    kind,
                    status: Some(status_code),
                    message,
                }
            }
            YouTubeError::InvalidResponse(message) => BridgeError::Remote {
                kind: RemoteErrorKind::Other,
                status: None,
                message,
            },
            YouTubeError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            YouTubeError::NetworkError(msg) => {
                BridgeError::OperationFailed(format!("Network error: {}", msg))
            }
            YouTubeError::BridgeError(e) => e,
        }
    }
}
