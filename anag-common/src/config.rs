//! Configuration loading and root folder resolution
//!
//! Every key of the TOML file is optional. A missing file is not an error:
//! compiled defaults apply and the caller is told so through [`ConfigSource`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "ANAG_ROOT_FOLDER";

/// Environment variable pointing at an explicit config file
pub const CONFIG_FILE_ENV: &str = "ANAG_CONFIG";

const APP_DIR: &str = "anagrafe";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Root folder holding the database and the data directory
    pub root_folder: Option<PathBuf>,
    /// Source data directory (relative paths resolve against the root folder)
    pub data_dir: Option<PathBuf>,
    /// SQLite database file (relative paths resolve against the root folder)
    pub database: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub gazetteer: GazetteerConfig,
    pub postcodes: PostcodeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// World-cities gazetteer source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazetteerConfig {
    /// File name inside the data directory
    pub file: PathBuf,
    pub columns: GazetteerColumns,
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("world_cities_geoname.csv"),
            columns: GazetteerColumns::default(),
        }
    }
}

/// Header names of the gazetteer columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazetteerColumns {
    pub iso_code: String,
    pub country: String,
    pub province: String,
    /// Unmapped by default: the province name then doubles as its code
    pub province_code: Option<String>,
    pub city: String,
}

impl Default for GazetteerColumns {
    fn default() -> Self {
        Self {
            iso_code: "code".to_string(),
            country: "country".to_string(),
            province: "province".to_string(),
            province_code: None,
            city: "name_en".to_string(),
        }
    }
}

/// Postal-code table source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostcodeConfig {
    /// File name inside the data directory
    pub file: PathBuf,
    /// ISO code of the country the table covers
    pub country: String,
    /// Display name used when the country has to be created from the table
    pub country_name: String,
    /// Also index `place-province` keys
    pub compound_keys: bool,
    pub columns: PostcodeColumns,
}

impl Default for PostcodeConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("zipcodes.it.csv"),
            country: "ITA".to_string(),
            country_name: "Italy".to_string(),
            compound_keys: false,
            columns: PostcodeColumns::default(),
        }
    }
}

/// Header names of the postal-code columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostcodeColumns {
    pub province_code: String,
    pub province: String,
    pub place: String,
    pub zipcode: String,
}

impl Default for PostcodeColumns {
    fn default() -> Self {
        Self {
            province_code: "province_code".to_string(),
            province: "province".to_string(),
            place: "place".to_string(),
            zipcode: "zipcode".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load configuration following the lookup order:
    /// 1. Explicit path (command line)
    /// 2. `ANAG_CONFIG` environment variable
    /// 3. Platform config locations
    ///
    /// An explicit path that does not exist is an error; a missing file in
    /// the platform locations falls back to defaults. The returned source is
    /// for the caller to log once its subscriber is installed.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            let config = Self::load(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        match locate_config_file() {
            Some(path) => {
                let config = Self::load(&path)?;
                Ok((config, ConfigSource::File(path)))
            }
            None => Ok((Self::default(), ConfigSource::Defaults)),
        }
    }
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file found; compiled defaults
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => write!(f, "compiled defaults"),
        }
    }
}

/// Find the first existing platform config file
fn locate_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Some(path) = std::env::var_os(ROOT_FOLDER_ENV) {
        return PathBuf::from(path);
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/anagrafe (or /var/lib/anagrafe for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("/var/lib").join(APP_DIR))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support").join(APP_DIR))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData").join(APP_DIR))
    } else {
        PathBuf::from("./anagrafe_data")
    }
}

/// Resolves file locations under a root folder
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root folder if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Database file, `<root>/anagrafe.db` unless configured
    pub fn database_path(&self, config: &TomlConfig) -> PathBuf {
        match &config.database {
            Some(path) => self.root.join(path),
            None => self.root.join("anagrafe.db"),
        }
    }

    /// Source data directory, `<root>/data` unless configured
    pub fn data_dir(&self, config: &TomlConfig) -> PathBuf {
        match &config.data_dir {
            Some(path) => self.root.join(path),
            None => self.root.join("data"),
        }
    }
}
