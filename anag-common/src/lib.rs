//! # Anagrafe Common Library
//!
//! Shared code for the Anagrafe contact registry crates:
//! - Configuration loading and root folder resolution
//! - Database initialization and schema
//! - Geographic models (Country, Region, City) and store queries

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
