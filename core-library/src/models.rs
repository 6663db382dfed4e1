//! Domain models for the channel studio library
//!
//! Rows come back from the record store as loosely typed JSON maps (SQLite keeps
//! whatever the writer gave it), so every field deserializes leniently: numbers
//! stored as text, booleans stored as `0`/`1`/`"true"`, missing columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Visibility
// =============================================================================

/// Remote privacy setting, stored as `videos.visibility_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public = 1,
    Private = 2,
    Unlisted = 3,
}

impl Visibility {
    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Visibility::Public),
            2 => Some(Visibility::Private),
            3 => Some(Visibility::Unlisted),
            _ => None,
        }
    }

    /// The `status.privacyStatus` value used by the remote API.
    pub fn privacy_status(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Unlisted => "unlisted",
        }
    }

    pub fn from_privacy_status(status: &str) -> Option<Self> {
        match status {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            "unlisted" => Some(Visibility::Unlisted),
            _ => None,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.privacy_status())
    }
}

// =============================================================================
// Account
// =============================================================================

/// An OAuth identity owning zero or more channels.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub google_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub access_token: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub refresh_token: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub token_expiry: Option<DateTime<Utc>>,
}

impl Account {
    pub fn has_access_token(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("google_id", &self.google_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_expiry", &self.token_expiry)
            .finish()
    }
}

// =============================================================================
// Channel
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub account_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub subscribers: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub views: Option<i64>,
    /// Language code such as `en` or `es-ES`; `unknown` when the remote had none.
    #[serde(default, deserialize_with = "lenient::string")]
    pub language: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub youtube_channel_id: Option<String>,
}

// =============================================================================
// Video
// =============================================================================

/// The unit of upload work.
///
/// A video with no remote id is an upload candidate; once `youtube_video_id`
/// is set it only ever goes through update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub channel_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub views: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub publish_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
    /// Comma separated
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub tags: Option<String>,
    /// Shared by every channel variant of the same video.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub local_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub youtube_video_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub local_path: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub thumbnail_path: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub thumbnail_text: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub thumbnail_remote: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub category_id: Option<i64>,
    /// Row id in `languages`, not a code.
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub default_language: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub visibility_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub kids: Option<bool>,
}

impl Video {
    /// Remote identifier, treating an empty string as absent.
    pub fn remote_id(&self) -> Option<&str> {
        self.youtube_video_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    pub fn is_upload_candidate(&self) -> bool {
        self.remote_id().is_none()
    }

    pub fn visibility(&self) -> Option<Visibility> {
        self.visibility_id.and_then(Visibility::from_id)
    }

    /// Outbound privacy status; unknown visibility uploads as private.
    pub fn privacy_status(&self) -> &'static str {
        self.visibility()
            .map(Visibility::privacy_status)
            .unwrap_or("private")
    }

    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn made_for_kids(&self) -> bool {
        self.kids.unwrap_or(false)
    }

    /// Title used in error summaries and logs.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

// =============================================================================
// Language / Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub code: String,
}

/// Singleton row of the `config` table.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioSettings {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub google_client_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub google_client_secret: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub global_video_path: Option<String>,
}

impl fmt::Debug for StudioSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudioSettings")
            .field("google_client_id", &self.google_client_id)
            .field(
                "google_client_secret",
                &self.google_client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("global_video_path", &self.global_video_path)
            .finish()
    }
}

mod lenient {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    fn value_to_string(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        value_to_i64(&value).ok_or_else(|| D::Error::custom(format!("invalid id: {}", value)))
    }

    pub fn opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(value_to_i64))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(value_to_string))
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        opt_string(deserializer).map(Option::unwrap_or_default)
    }

    /// `1`, `true` and `"true"` are true; other present values are false.
    pub fn opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(b),
            Some(Value::Number(n)) => Some(n.as_i64() == Some(1)),
            Some(Value::String(s)) => Some(s == "true" || s == "1"),
            Some(_) => Some(false),
        })
    }

    /// RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or epoch milliseconds.
    pub fn opt_datetime<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => {
                let s = s.trim();
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
                    .or_else(|| {
                        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                            .ok()
                            .map(|naive| naive.and_utc())
                    })
            }
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
            _ => None,
        })
    }
}
