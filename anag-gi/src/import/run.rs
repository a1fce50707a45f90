//! File-level import orchestration
//!
//! Checks inputs, loads the postcode index and runs each source file in its
//! own transaction. A missing input is reported before any transaction is
//! opened.

use super::{import_gazetteer, import_postcode_table, ImportMode, ImportOptions, ImportSummary};
use crate::error::{ImportError, ImportResult};
use crate::postcodes::PostcodeIndex;
use crate::sources::{GazetteerReader, PostcodeReader};
use anag_common::config::{GazetteerConfig, PostcodeConfig, TomlConfig};
use serde::Serialize;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything one import run needs
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub data_dir: PathBuf,
    pub mode: ImportMode,
    pub gazetteer: GazetteerConfig,
    pub postcodes: PostcodeConfig,
}

impl ImportPlan {
    pub fn from_config(data_dir: PathBuf, config: &TomlConfig, mode: ImportMode) -> Self {
        Self {
            data_dir,
            mode,
            gazetteer: config.gazetteer.clone(),
            postcodes: config.postcodes.clone(),
        }
    }

    pub fn gazetteer_path(&self) -> PathBuf {
        self.data_dir.join(&self.gazetteer.file)
    }

    pub fn postcode_path(&self) -> PathBuf {
        self.data_dir.join(&self.postcodes.file)
    }

    /// Fail with `MissingInputFile` unless every file the mode needs exists
    pub fn check_inputs(&self) -> ImportResult<()> {
        require_file("Gazetteer", &self.gazetteer_path())?;
        if self.mode == ImportMode::Split {
            require_file("Postal code", &self.postcode_path())?;
        }
        Ok(())
    }

    fn options(&self) -> ImportOptions {
        ImportOptions {
            mode: self.mode,
            postcode_country: self.postcodes.country.clone(),
        }
    }
}

/// Outcome of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub mode: String,
    pub postcode_index_size: usize,
    pub gazetteer: ImportSummary,
    /// Only present in split mode
    pub postcodes: Option<ImportSummary>,
}

fn require_file(role: &'static str, path: &Path) -> ImportResult<()> {
    if !path.is_file() {
        return Err(ImportError::MissingInputFile {
            role,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Run a complete import
pub async fn run_import(pool: &SqlitePool, plan: &ImportPlan) -> ImportResult<RunReport> {
    let gazetteer_path = plan.gazetteer_path();
    let postcode_path = plan.postcode_path();

    plan.check_inputs()?;

    let index = match plan.mode {
        ImportMode::Merged => PostcodeIndex::load(
            &postcode_path,
            &plan.postcodes.columns,
            plan.postcodes.compound_keys,
        )?,
        ImportMode::Split => PostcodeIndex::new(),
    };

    // Header mapping is validated before the transaction opens
    let rows = GazetteerReader::open(&gazetteer_path, &plan.gazetteer.columns)?;

    info!("Importing {} ({} mode)", gazetteer_path.display(), plan.mode);
    let mut tx = pool.begin().await?;
    let gazetteer = import_gazetteer(&mut *tx, rows, &index, &plan.options()).await?;
    tx.commit().await?;
    info!("Gazetteer import completed: {}", gazetteer);

    let postcodes = if plan.mode == ImportMode::Split {
        let rows = PostcodeReader::open(&postcode_path, &plan.postcodes.columns)?;

        info!("Importing {}", postcode_path.display());
        let mut tx = pool.begin().await?;
        let summary = import_postcode_table(
            &mut *tx,
            rows,
            &plan.postcodes.country,
            &plan.postcodes.country_name,
        )
        .await?;
        tx.commit().await?;
        info!("Postal code import completed: {}", summary);

        Some(summary)
    } else {
        None
    };

    Ok(RunReport {
        mode: plan.mode.to_string(),
        postcode_index_size: index.len(),
        gazetteer,
        postcodes,
    })
}
