//! Shared fixtures for the import tests

#![allow(dead_code)]

use anag_common::config::TomlConfig;
use anag_common::db::geo;
use anag_common::db::init::init_database;
use anag_gi::{ImportMode, ImportPlan};
use sqlx::SqlitePool;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const GAZETTEER_HEADER: &str = "code,country,province,name_en";
pub const POSTCODE_HEADER: &str = "province_code,province,place,zipcode";

/// A temporary root folder with a data directory and a database
pub struct TestRoot {
    pub dir: TempDir,
    pub config: TomlConfig,
}

impl TestRoot {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        Self {
            dir,
            config: TomlConfig::default(),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("anagrafe.db")
    }

    /// Write the gazetteer with the default header
    pub fn write_gazetteer(&self, rows: &[&str]) {
        write_csv(&self.data_dir().join(&self.config.gazetteer.file), GAZETTEER_HEADER, rows);
    }

    /// Write the postal-code table with the default header
    pub fn write_postcodes(&self, rows: &[&str]) {
        write_csv(&self.data_dir().join(&self.config.postcodes.file), POSTCODE_HEADER, rows);
    }

    pub fn plan(&self, mode: ImportMode) -> ImportPlan {
        ImportPlan::from_config(self.data_dir(), &self.config, mode)
    }

    pub async fn pool(&self) -> SqlitePool {
        init_database(&self.db_path()).await.unwrap()
    }
}

pub fn write_csv(path: &Path, header: &str, rows: &[&str]) {
    let mut content = String::from(header);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(path, content).unwrap();
}

pub async fn table_count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Postcode of `city` in region `region` of `country`, None if unset
pub async fn city_postcode(pool: &SqlitePool, country: &str, region: &str, city: &str) -> Option<String> {
    let mut conn = pool.acquire().await.unwrap();
    let region = geo::find_region(&mut conn, country, region)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("region {} ({}) missing", region, country));
    geo::find_city(&mut conn, region.guid, city)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("city {} missing", city))
        .postcode
}

pub async fn region_code(pool: &SqlitePool, country: &str, region: &str) -> String {
    let mut conn = pool.acquire().await.unwrap();
    geo::find_region(&mut conn, country, region)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("region {} ({}) missing", region, country))
        .code
}
