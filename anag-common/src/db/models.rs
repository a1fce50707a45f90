//! Database models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Nation, keyed by its ISO-like code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub iso_code: String,
    pub name: String,
}

/// Region/state/province inside a country
///
/// Identity is `(country_iso, name)`. `code` may be empty until a later
/// import supplies it; once non-empty it never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub guid: Uuid,
    pub country_iso: String,
    pub name: String,
    pub code: String,
}

impl Region {
    pub fn has_code(&self) -> bool {
        !self.code.is_empty()
    }
}

/// City/municipality inside a region
///
/// `postcode` follows the same backfill-once rule as `Region::code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub guid: Uuid,
    pub region_guid: Uuid,
    pub name: String,
    pub postcode: Option<String>,
}

impl City {
    pub fn has_postcode(&self) -> bool {
        self.postcode.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Row counts of the geographic tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoCounts {
    pub countries: i64,
    pub regions: i64,
    pub cities: i64,
    pub cities_with_postcode: i64,
}
