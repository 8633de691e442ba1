use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::MigrateError;
use crate::locate::DEFAULT_CANDIDATES;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
    const DEFAULT_LEVEL: &str = "warn";

    fn default() -> Self {
        LoggingConfig {
            level: Self::DEFAULT_LEVEL.to_string(),
        }
    }

    fn ensure_valid(&mut self) {
        let str_original = self.level.clone();
        self.level = self.level.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.level.as_str()) {
            eprintln!(
                "Config error: log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::DEFAULT_LEVEL
            );
            self.level = Self::DEFAULT_LEVEL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Database locations tried in order. Relative entries resolve against the base directory.
    pub candidates: Vec<String>,
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    const BUSY_TIMEOUT_MS: u64 = 5000;

    fn default() -> Self {
        DatabaseConfig {
            candidates: DEFAULT_CANDIDATES.iter().map(|c| c.to_string()).collect(),
            busy_timeout_ms: Self::BUSY_TIMEOUT_MS,
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    fn ensure_valid(&mut self) {
        self.candidates.retain(|c| !c.trim().is_empty());
        if self.candidates.is_empty() {
            eprintln!(
                "Config error: no database candidates configured - using defaults of '{}'",
                DEFAULT_CANDIDATES.join(", ")
            );
            self.candidates = Self::default().candidates;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    /// Exit with a non-zero status when the migration fails.
    pub strict_exit: bool,
}

impl Config {
    const ENV_PREFIX: &str = "EDUTRADE_MIGRATE_";

    pub fn default() -> Self {
        Config {
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
            strict_exit: false,
        }
    }

    /// `config.toml` in the platform config directory, if one can be determined.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "edutrade-migrate")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from an explicitly named file, or from the default
    /// location when `explicit` is `None`. An explicit file must exist; the
    /// default one is optional. Nothing is ever written to disk.
    pub fn load(explicit: Option<&Path>) -> Result<Self, MigrateError> {
        match explicit {
            Some(path) if !path.is_file() => Err(MigrateError::Error(format!(
                "Config file {} does not exist",
                path.display()
            ))),
            Some(path) => Ok(Self::load_from(Some(path))),
            None => Ok(Self::load_from(Self::default_path().as_deref())),
        }
    }

    /// Defaults merged with the TOML file (if present) and `EDUTRADE_MIGRATE_*`
    /// environment variables. Falls back to defaults if extraction fails.
    pub fn load_from(config_path: Option<&Path>) -> Self {
        let default_config = Config::default();

        let mut figment = Figment::from(Serialized::defaults(default_config.clone()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(Self::ENV_PREFIX).split("__"));

        let mut config: Config = figment.extract().unwrap_or_else(|err| {
            eprintln!(
                "Could not load configuration: {}. Using default configuration.",
                err
            );
            default_config
        });

        config.ensure_valid();

        config
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.database.ensure_valid();
    }
}
