//! Geographic reconciliation import
//!
//! Reconciles the gazetteer (and, in split mode, the postal-code table) into
//! the Country -> Region -> City hierarchy. Every write is a get-or-create or
//! a backfill of an empty field, so a re-run against a populated store
//! creates nothing new.

mod gazetteer;
mod postal;
mod run;

pub use gazetteer::import_gazetteer;
pub use postal::import_postcode_table;
pub use run::{run_import, ImportPlan, RunReport};

use crate::error::ImportResult;
use anag_common::db::geo;
use anag_common::db::Region;
use anag_common::Error;
use serde::Serialize;
use sqlx::SqliteConnection;
use std::collections::HashSet;
use std::fmt;

/// How the two sources are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ImportMode {
    /// Gazetteer for every country; postcodes attached from the index
    #[default]
    Merged,
    /// Gazetteer without the postcode country, then the postal table imported as-is
    Split,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Merged => write!(f, "merged"),
            ImportMode::Split => write!(f, "split"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub mode: ImportMode,
    /// ISO code whose cities get postcodes (merged) or are skipped (split)
    pub postcode_country: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            mode: ImportMode::Merged,
            postcode_country: "ITA".to_string(),
        }
    }
}

/// Per-file counters (advisory output only)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub rows: u64,
    pub rows_skipped: u64,
    pub countries_created: u64,
    pub regions_created: u64,
    /// Distinct (region, country) keys met in the run
    pub regions_seen: u64,
    pub region_codes_backfilled: u64,
    pub cities_created: u64,
    pub postcodes_backfilled: u64,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} countries, {} regions ({} seen), {} cities imported, {} postcodes updated, {} region codes set ({} rows, {} skipped)",
            self.countries_created,
            self.regions_created,
            self.regions_seen,
            self.cities_created,
            self.postcodes_backfilled,
            self.region_codes_backfilled,
            self.rows,
            self.rows_skipped,
        )
    }
}

/// Region resolution with the in-run dedup key set
///
/// Only keys are remembered; a region met again is re-read from the store
/// so the returned record always matches persisted state.
#[derive(Debug, Default)]
pub(crate) struct RegionResolver {
    seen: HashSet<(String, String)>,
}

impl RegionResolver {
    /// Resolve `(name, country)` and backfill an empty code with `code`
    pub(crate) async fn resolve(
        &mut self,
        conn: &mut SqliteConnection,
        country_iso: &str,
        name: &str,
        code: &str,
        summary: &mut ImportSummary,
    ) -> ImportResult<Region> {
        let key = (name.to_string(), country_iso.to_string());

        let mut region = if self.seen.contains(&key) {
            geo::find_region(conn, country_iso, name)
                .await?
                .ok_or_else(|| Error::NotFound(format!("region {} ({})", name, country_iso)))?
        } else {
            let (region, created) = geo::get_or_create_region(conn, country_iso, name, code).await?;
            if created {
                summary.regions_created += 1;
            }
            self.seen.insert(key);
            summary.regions_seen = self.seen.len() as u64;
            region
        };

        if geo::backfill_region_code(conn, &mut region, code).await? {
            summary.region_codes_backfilled += 1;
        }

        Ok(region)
    }
}
