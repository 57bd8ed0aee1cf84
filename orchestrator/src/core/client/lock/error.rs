use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("Lock {key} is held by {owner}, not by {requester}")]
    NotOwner { key: String, owner: String, requester: String },

    #[error("Lock error: {0}")]
    Other(String),
}
