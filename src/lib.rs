//! Workspace umbrella crate.
//!
//! Exposes the `desktop-shims` feature so a host application can depend on
//! `channel-studio-workspace` and get the fully wired `core-service` without
//! naming each workspace crate.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
