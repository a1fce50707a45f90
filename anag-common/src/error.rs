//! Error type shared by the Anagrafe crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable, unparsable or missing when named explicitly
    #[error("Configuration error: {0}")]
    Config(String),

    /// A record the current run already resolved is gone from the store
    #[error("Record missing from store: {0}")]
    NotFound(String),

    /// A guid column holding something other than a UUID
    #[error("Invalid guid {value:?} in store: {reason}")]
    InvalidGuid { value: String, reason: String },
}
