//! # Library Module
//!
//! Owns the local channel studio database and the typed access to it.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema, migrations and the connection pool (`db`)
//! - `SqliteRecordStore`, the generic keyed-record store over that pool
//! - Domain models for accounts, channels, videos and languages
//! - Typed repositories over any `RecordStore`
//! - The shared field mapping used by reconciliation and apply-to-all

pub mod db;
pub mod error;
pub mod mapping;
pub mod models;
pub mod repositories;
pub mod store;

pub use error::{LibraryError, Result};
pub use mapping::{map_video_fields, MappingContext, RemoteStats, VideoFields, VideoSource};
pub use models::{Account, Channel, Language, StudioSettings, Video, Visibility};
pub use repositories::{
    AccountRepository, ChannelRepository, LanguageRepository, SettingsRepository, VideoRepository,
};
pub use store::SqliteRecordStore;
