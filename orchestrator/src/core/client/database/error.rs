use mongodb::bson;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),

    #[error("BSON serialization error: {0}")]
    BsonSerializationError(#[from] bson::ser::Error),

    /// The stored job no longer matches the expected id, status and version
    #[error("Failed to update item: {0}")]
    UpdateFailed(String),

    #[error("No update found: {0}")]
    NoUpdateFound(String),

    /// The update would leave the job in a state that breaks its field/status pairing
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Item already exists: {0}")]
    ItemAlreadyExists(String),

    #[error("Model version counter is corrupt: {0}")]
    InvalidVersionCounter(String),
}
