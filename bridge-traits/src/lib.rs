//! # Host Bridge Traits
//!
//! Capability contracts between the channel studio core and its host.
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Async HTTP with transport-level retry
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Media and thumbnail file access
//! - [`VideoHostingApi`](video::VideoHostingApi) - Remote video-hosting operations
//!
//! ### Storage
//! - [`RecordStore`](store::RecordStore) - Generic keyed-record store for accounts,
//!   channels, videos and languages
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic expiry checks
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to the host
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with a descriptive error when a required capability is
//! missing:
//!
//! ```ignore
//! let http_client = config.http_client
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "HttpClient".to_string(),
//!         message: "No HTTP client implementation provided. \
//!                  Enable the desktop-shims feature or inject an adapter.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Provider failures
//! keep their classification in [`BridgeError::Remote`](error::BridgeError::Remote)
//! so the upload queue can tell quota exhaustion apart from every other failure.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`; implementations are shared across
//! tasks behind `Arc`.

pub mod error;
pub mod http;
pub mod storage;
pub mod store;
pub mod time;
pub mod video;

pub use error::{BridgeError, RemoteErrorKind};

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::{FileMetadata, FileSystemAccess};
pub use store::{Record, RecordId, RecordStore};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
pub use video::{RemoteChannel, RemoteVideo, VideoHostingApi, VideoMetadata};
