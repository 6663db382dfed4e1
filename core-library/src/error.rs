use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record conversion failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LibraryError {
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        LibraryError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
