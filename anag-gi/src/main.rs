//! anag-gi - Geographic Import administrative command
//!
//! Populates the Country / Region / City tables from the gazetteer and the
//! postal-code table found in the data directory. Safe to re-run: a second
//! import against the same files changes nothing.

use anag_common::config::{resolve_root_folder, ConfigSource, RootFolderInitializer, TomlConfig};
use anag_common::db::{geo, init::init_database};
use anag_gi::{run_import, ImportMode, ImportPlan};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "anag-gi", version, about = "Import countries, regions and cities")]
struct Cli {
    /// Root folder (overrides ANAG_ROOT_FOLDER and the config file)
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// Config file (overrides ANAG_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the source CSV files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import the source files (default)
    Import(ImportArgs),
    /// Show row counts of the geographic tables
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored records
    List {
        #[command(subcommand)]
        target: ListTarget,
    },
}

#[derive(Debug, Default, Args)]
struct ImportArgs {
    #[arg(long, value_enum, default_value_t = ImportMode::Merged)]
    mode: ImportMode,

    /// Index postal codes by place and province
    #[arg(long)]
    compound_postcode_keys: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum ListTarget {
    Countries,
    Regions {
        /// Country ISO code
        country: String,
    },
    Cities {
        /// Country ISO code
        country: String,
        /// Region name
        region: String,
    },
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging level may come from the config file, so load it first
    let loaded = TomlConfig::load_or_default(cli.config.as_deref());
    let level = loaded
        .as_ref()
        .map(|(c, _)| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&level);

    info!(
        "Starting anag-gi (Geographic Import) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match run(cli, loaded).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("{:#}", e);
            Err(e)
        }
    }
}

async fn run(cli: Cli, loaded: anag_common::Result<(TomlConfig, ConfigSource)>) -> Result<()> {
    let (mut config, source) = loaded.context("Failed to load configuration")?;
    match &source {
        ConfigSource::File(_) => info!("Configuration: {}", source),
        ConfigSource::Defaults => warn!("No config file found, using defaults"),
    }

    if let Some(data_dir) = cli.data_dir {
        config.data_dir = Some(data_dir);
    }
    if let Some(database) = cli.database {
        config.database = Some(database);
    }

    let root_folder = resolve_root_folder(cli.root_folder.as_deref(), &config);
    let initializer = RootFolderInitializer::new(root_folder);

    match cli.command.unwrap_or(Command::Import(ImportArgs::default())) {
        Command::Import(args) => {
            config.postcodes.compound_keys |= args.compound_postcode_keys;
            let plan = ImportPlan::from_config(initializer.data_dir(&config), &config, args.mode);

            // A missing input must not leave a database behind
            plan.check_inputs()?;

            let pool = open_database(&initializer, &config).await?;
            let report = run_import(&pool, &plan).await?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Import completed: {}", report.gazetteer);
                if let Some(postcodes) = &report.postcodes {
                    println!("Postal codes: {}", postcodes);
                }
            }
        }
        Command::Stats { json } => {
            let pool = open_database(&initializer, &config).await?;
            let counts = geo::count_geography(&pool).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&counts)?);
            } else {
                println!("countries:            {}", counts.countries);
                println!("regions:              {}", counts.regions);
                println!("cities:               {}", counts.cities);
                println!("cities with postcode: {}", counts.cities_with_postcode);
            }
        }
        Command::List { target } => {
            let pool = open_database(&initializer, &config).await?;
            list(&pool, target).await?;
        }
    }

    Ok(())
}

async fn open_database(initializer: &RootFolderInitializer, config: &TomlConfig) -> Result<SqlitePool> {
    info!("Root folder: {}", initializer.root().display());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path(config);
    info!("Database: {}", db_path.display());

    Ok(init_database(&db_path).await?)
}

async fn list(pool: &SqlitePool, target: ListTarget) -> Result<()> {
    match target {
        ListTarget::Countries => {
            for country in geo::list_countries(pool).await? {
                println!("{}\t{}", country.iso_code, country.name);
            }
        }
        ListTarget::Regions { country } => {
            for region in geo::list_regions(pool, &country).await? {
                println!("{}\t{}", region.code, region.name);
            }
        }
        ListTarget::Cities { country, region } => {
            let found = {
                let mut conn = pool.acquire().await?;
                geo::find_region(&mut conn, &country, &region).await?
            };
            let region = found
                .with_context(|| format!("Region not found: {} ({})", region, country))?;

            for city in geo::list_cities(pool, region.guid).await? {
                println!("{}\t{}", city.postcode.as_deref().unwrap_or("-"), city.name);
            }
        }
    }

    Ok(())
}
