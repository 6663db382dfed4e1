//! # YouTube Provider
//!
//! Implements `VideoHostingApi` for the YouTube Data API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - Channel listing for the signed-in account
//! - Upload listing through each channel's uploads playlist, paginated
//! - Multipart `videos.insert`, `videos.update` and `thumbnails.set`
//! - Classification of API failures, quota exhaustion in particular

pub mod connector;
pub mod error;
pub mod types;

pub use connector::YouTubeConnector;
pub use error::{classify_remote_error, Result, YouTubeError};
