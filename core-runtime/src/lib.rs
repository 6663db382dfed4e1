//! # Core Runtime Module
//!
//! Foundational runtime pieces shared by every channel studio crate:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus for UI progress and status notifications
//!
//! ## Overview
//!
//! Nothing here knows about videos or accounts beyond the event payloads; the
//! sync engine crates build on these conventions.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, OAuthClientConfig};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
