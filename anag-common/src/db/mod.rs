//! Database models and queries

pub mod geo;
pub mod init;
pub mod models;

pub use init::*;
pub use models::*;
