//! # Typed Repositories
//!
//! Thin typed views over any [`RecordStore`]. Each repository converts rows to
//! the domain models in [`crate::models`] and writes through serializable field
//! structs, so the sync engine never handles raw records.
//!
//! ## Available Repositories
//!
//! - `AccountRepository` - OAuth identities and their tokens
//! - `ChannelRepository` - Channels and their statistics
//! - `VideoRepository` - Videos, remote ids and media paths
//! - `LanguageRepository` - Language code lookups
//! - `SettingsRepository` - The singleton `config` row

pub mod account;
pub mod channel;
pub mod language;
pub mod settings;
pub mod video;

pub use account::{AccountRepository, NewAccount};
pub use channel::{ChannelRepository, ChannelStats, NewChannel};
pub use language::LanguageRepository;
pub use settings::SettingsRepository;
pub use video::{NewVideo, VideoRepository};

use crate::error::{LibraryError, Result};
use bridge_traits::store::Record;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub(crate) fn to_record<T: Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(LibraryError::InvalidInput {
            field: "record".to_string(),
            message: format!("expected an object, got {}", other),
        }),
    }
}

pub(crate) fn from_record<T: DeserializeOwned>(record: Record) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

pub(crate) fn from_records<T: DeserializeOwned>(records: Vec<Record>) -> Result<Vec<T>> {
    records.into_iter().map(from_record).collect()
}
