//! # Core Configuration Module
//!
//! Builder-based configuration for the channel studio core.
//!
//! ## Overview
//!
//! `CoreConfig` carries the injected bridges (HTTP transport, filesystem) and
//! the tunables the sync engine needs. The builder fails fast: missing bridges
//! and out-of-range values are reported at `build()` rather than at first use.
//!
//! ## Required Dependencies
//!
//! - `HttpClient`: remote API transport (desktop default: reqwest)
//! - `FileSystemAccess`: media and thumbnail reads (desktop default: tokio fs)
//! - OAuth client credentials for token refresh
//!
//! When the `desktop-shims` feature is enabled, the two bridges are defaulted
//! from `bridge-desktop` if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, OAuthClientConfig};
//!
//! let config = CoreConfig::builder()
//!     .database_path("/data/channel-studio.db")
//!     .oauth(OAuthClientConfig::new("client-id", "client-secret"))
//!     .media_library_path("/media/exports")
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Missing OAuth client configuration
//! let config = CoreConfig::builder()
//!     .database_path("/data/channel-studio.db")
//!     .build()
//!     .expect("Should fail - missing OAuth client");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use crate::logging::LoggingConfig;
use bridge_traits::{FileSystemAccess, HttpClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Google's OAuth 2.0 token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring within this window are refreshed before use.
pub const DEFAULT_TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Media uploads can be large; the transport timeout is generous by default.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const MAX_TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60 * 60);

/// OAuth client credentials used to refresh access tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
}

impl OAuthClientConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config("OAuth client id cannot be empty".to_string()));
        }

        if !self.token_url.starts_with("https://") && !self.token_url.starts_with("http://") {
            return Err(Error::Config(format!(
                "OAuth token url must be an http(s) URL, got '{}'",
                self.token_url
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Core configuration. Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// HTTP transport for token refresh and the video hosting API
    pub http_client: Arc<dyn HttpClient>,

    /// Filesystem access for media files and thumbnails
    pub file_system: Arc<dyn FileSystemAccess>,

    pub oauth: OAuthClientConfig,

    /// Folder scanned by media auto-assignment (`<localId>-<channelName>.mp4`)
    pub media_library_path: Option<PathBuf>,

    pub token_refresh_margin: Duration,

    pub event_buffer_size: usize,

    pub upload_timeout: Duration,

    /// Installed as the global subscriber by `CoreService::bootstrap`. Leave
    /// unset when the host installs its own.
    pub logging: Option<LoggingConfig>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("http_client", &"HttpClient { ... }")
            .field("file_system", &"FileSystemAccess { ... }")
            .field("oauth", &self.oauth)
            .field("media_library_path", &self.media_library_path)
            .field("token_refresh_margin", &self.token_refresh_margin)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("upload_timeout", &self.upload_timeout)
            .field("logging", &self.logging)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - OAuth client is usable
    /// - Refresh margin is positive and under an hour
    /// - Event buffer and upload timeout are non-zero
    /// - Log filter directives parse, when logging is configured
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        self.oauth.validate()?;

        if self.token_refresh_margin.is_zero() {
            return Err(Error::Config(
                "Token refresh margin must be greater than zero".to_string(),
            ));
        }

        if self.token_refresh_margin >= MAX_TOKEN_REFRESH_MARGIN {
            return Err(Error::Config(
                "Token refresh margin must be shorter than the one hour token lifetime"
                    .to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.upload_timeout.is_zero() {
            return Err(Error::Config(
                "Upload timeout must be greater than zero".to_string(),
            ));
        }

        if let Some(logging) = &self.logging {
            logging.validate()?;
        }

        if let Some(path) = &self.media_library_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config(
                    "Media library path cannot be empty when set".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(upload_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(upload_timeout).map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_upload_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for token refresh and remote video calls. \
                 Enable the 'desktop-shims' feature to use the default reqwest client, \
                 or inject one with .http_client()."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Ok(Arc::new(bridge_desktop::TokioFileSystem::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required to read media files and thumbnails. \
                 Enable the 'desktop-shims' feature or inject one with .file_system()."
            .to_string(),
    })
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    oauth: Option<OAuthClientConfig>,
    media_library_path: Option<PathBuf>,
    token_refresh_margin: Option<Duration>,
    event_buffer_size: Option<usize>,
    upload_timeout: Option<Duration>,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    /// Sets the SQLite database path.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder().database_path("/data/channel-studio.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    pub fn oauth(mut self, oauth: OAuthClientConfig) -> Self {
        self.oauth = Some(oauth);
        self
    }

    /// Sets the global video folder scanned by media auto-assignment.
    pub fn media_library_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.media_library_path = Some(path.into());
        self
    }

    pub fn token_refresh_margin(mut self, margin: Duration) -> Self {
        self.token_refresh_margin = Some(margin);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = Some(timeout);
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - `Error::Config` when a required value is missing or out of range
    /// - `Error::CapabilityMissing` when a bridge is absent and no desktop default exists
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let oauth = self.oauth.ok_or_else(|| {
            Error::Config("OAuth client configuration is required. Use .oauth() to set it.".to_string())
        })?;

        let upload_timeout = self.upload_timeout.unwrap_or(DEFAULT_UPLOAD_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(upload_timeout)?,
        };

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let config = CoreConfig {
            database_path,
            http_client,
            file_system,
            oauth,
            media_library_path: self.media_library_path,
            token_refresh_margin: self
                .token_refresh_margin
                .unwrap_or(DEFAULT_TOKEN_REFRESH_MARGIN),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            upload_timeout,
            logging: self.logging,
        };

        config.validate()?;

        Ok(config)
    }
}
