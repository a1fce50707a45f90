//! anag-gi library interface
//!
//! Geographic import: reads the world-cities gazetteer and the Italian
//! postal-code table and reconciles them into the Country / Region / City
//! tables of the shared Anagrafe database.

pub mod error;
pub mod import;
pub mod postcodes;
pub mod sources;

pub use crate::error::{ImportError, ImportResult};
pub use crate::import::{
    import_gazetteer, import_postcode_table, run_import, ImportMode, ImportOptions, ImportPlan,
    ImportSummary, RunReport,
};
pub use crate::postcodes::PostcodeIndex;
