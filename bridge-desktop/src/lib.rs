//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//! - `FileSystemAccess` using `tokio::fs`
//!
//! The SQLite-backed `RecordStore` lives in `core-library`, next to the
//! schema and migrations it depends on.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, TokioFileSystem};
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let file_system = Arc::new(TokioFileSystem::new());
//! ```

mod filesystem;
mod http;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
