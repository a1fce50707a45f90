//! In-memory postal-code index
//!
//! Built once per run from the postal-code table and read-only afterwards.
//! Keys are lower-cased place names (no trimming). The first zip code seen
//! for a key wins.

use crate::error::ImportResult;
use crate::sources::{PostcodeReader, PostcodeRow};
use anag_common::config::PostcodeColumns;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Lookup key for a place name
pub fn simple_key(place: &str) -> String {
    place.to_lowercase()
}

/// Lookup key for a place qualified by its province
pub fn compound_key(place: &str, province: &str) -> String {
    format!("{}-{}", place.to_lowercase(), province.to_lowercase())
}

#[derive(Debug, Clone, Default)]
pub struct PostcodeIndex {
    entries: HashMap<String, String>,
}

impl PostcodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from postal-code rows
    ///
    /// Rows with an empty place or zip are skipped. With `compound_keys`
    /// a row carrying a province registers `place-province` instead of the
    /// bare place name, which keeps homonymous places in different provinces
    /// apart. Without it the compound fallback in [`PostcodeIndex::lookup`]
    /// can never match.
    pub fn from_rows<I>(rows: I, compound_keys: bool) -> ImportResult<Self>
    where
        I: IntoIterator<Item = ImportResult<PostcodeRow>>,
    {
        let mut index = Self::new();

        for row in rows {
            let row = row?;
            if row.place.is_empty() || row.zipcode.is_empty() {
                continue;
            }

            let key = if compound_keys && !row.province.is_empty() {
                compound_key(&row.place, &row.province)
            } else {
                simple_key(&row.place)
            };
            index.insert(key, &row.zipcode);
        }

        Ok(index)
    }

    /// Load the index from a postal-code file
    ///
    /// A missing file yields an empty index.
    pub fn load(path: &Path, columns: &PostcodeColumns, compound_keys: bool) -> ImportResult<Self> {
        if !path.exists() {
            warn!("Postal code file not found, continuing without postcodes: {}", path.display());
            return Ok(Self::new());
        }

        info!("Loading postal codes from {}", path.display());
        let index = Self::from_rows(PostcodeReader::open(path, columns)?, compound_keys)?;
        info!("Loaded {} postal codes", index.len());

        Ok(index)
    }

    /// Insert unless the key is already present; returns true if inserted
    pub fn insert(&mut self, key: String, zipcode: &str) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, zipcode.to_string());
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Resolve a city: plain name first, then `city-region`
    pub fn lookup(&self, city: &str, region: &str) -> Option<&str> {
        self.get(&simple_key(city)).or_else(|| {
            if region.is_empty() {
                None
            } else {
                self.get(&compound_key(city, region))
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(province: &str, place: &str, zipcode: &str) -> ImportResult<PostcodeRow> {
        Ok(PostcodeRow {
            line: 0,
            province_code: String::new(),
            province: province.to_string(),
            place: place.to_string(),
            zipcode: zipcode.to_string(),
        })
    }

    #[test]
    fn test_first_occurrence_wins() {
        let index = PostcodeIndex::from_rows(
            vec![row("Roma", "Roma", "00100"), row("Roma", "Roma", "00199")],
            false,
        )
        .unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("roma"), Some("00100"));
    }

    #[test]
    fn test_key_is_case_folded_not_trimmed() {
        let index = PostcodeIndex::from_rows(vec![row("Milano", " Milano", "20121")], false).unwrap();

        assert_eq!(index.get(" milano"), Some("20121"));
        assert_eq!(index.get("milano"), None);
        assert_eq!(index.lookup(" MILANO", "Lombardia"), Some("20121"));
    }

    #[test]
    fn test_rows_without_place_or_zip_skipped() {
        let index = PostcodeIndex::from_rows(
            vec![row("Roma", "", "00100"), row("Roma", "Fiumicino", "")],
            false,
        )
        .unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_compound_fallback_requires_compound_keys() {
        let rows = || {
            vec![
                row("Torino", "Samone", "10010"),
                row("Trento", "Samone", "38059"),
            ]
        };

        let plain = PostcodeIndex::from_rows(rows(), false).unwrap();
        assert_eq!(plain.lookup("Samone", "Trento"), Some("10010"));
        assert_eq!(plain.get("samone-trento"), None);

        let compound = PostcodeIndex::from_rows(rows(), true).unwrap();
        assert_eq!(compound.len(), 2);
        assert_eq!(compound.get("samone"), None);
        assert_eq!(compound.lookup("Samone", "Trento"), Some("38059"));
        assert_eq!(compound.lookup("Samone", "Torino"), Some("10010"));
        assert_eq!(compound.lookup("Samone", "Cuneo"), None);
    }

    #[test]
    fn test_missing_file_is_empty_index() {
        let index = PostcodeIndex::load(
            Path::new("/nonexistent/zipcodes.it.csv"),
            &PostcodeColumns::default(),
            false,
        )
        .unwrap();
        assert!(index.is_empty());
    }
}
