use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use log::{error, info};

use crate::config::{Config, LoggingConfig};
use crate::error::{ErrorCategory, MigrateError};
use crate::locate::DbCandidates;
use crate::schema::{college_columns, USER_TABLE};
use crate::upgrader::{ColumnOutcome, Upgrader};

const RULE_WIDTH: usize = 60;
const TITLE: &str = "Database Migration: Add College Fields";

#[derive(Parser, Debug)]
#[command(
    name = "edutrade-migrate",
    version,
    about = "Adds the college_type and college_state columns to the EduTrade user table"
)]
pub struct Cli {
    /// Database file to migrate (skips the search of the default locations)
    #[arg(long = "db", value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Directory the default database locations are resolved against (default: the executable's directory)
    #[arg(long = "base-dir", value_name = "DIR", conflicts_with = "db")]
    pub base_dir: Option<PathBuf>,

    /// Configuration file (default: config.toml in the platform config directory)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Exit with status 1 if the migration fails
    #[arg(long = "strict", default_value_t = false)]
    pub strict: bool,
}

impl Cli {
    pub fn handle_command_line() -> Result<(), MigrateError> {
        let args = Cli::parse();
        let config = Config::load(args.config.as_deref())?;
        let _logger = Self::start_logger(&config.logging)?;

        let succeeded = args.run(&config, &mut io::stdout().lock())?;
        args.exit_result(succeeded, &config)
    }

    /// A failed migration only turns into an error (exit status 1) when strict
    /// exit was asked for on the command line or in the configuration.
    fn exit_result(&self, succeeded: bool, config: &Config) -> Result<(), MigrateError> {
        if !succeeded && (self.strict || config.strict_exit) {
            return Err(MigrateError::Error("Migration failed".to_string()));
        }
        Ok(())
    }

    fn start_logger(logging: &LoggingConfig) -> Result<LoggerHandle, MigrateError> {
        // RUST_LOG wins over the configured level
        let handle = Logger::try_with_env_or_str(&logging.level)?
            .log_to_stderr()
            .start()?;
        Ok(handle)
    }

    fn candidates(&self, config: &Config) -> Result<DbCandidates, MigrateError> {
        if let Some(db) = &self.db {
            return Ok(DbCandidates::single(db.clone()));
        }

        let base_dir = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => {
                let exe = std::env::current_exe()?;
                exe.parent().map(PathBuf::from).ok_or_else(|| {
                    MigrateError::Error(format!(
                        "Cannot determine directory of {}",
                        exe.display()
                    ))
                })?
            }
        };

        Ok(DbCandidates::from_config(&base_dir, &config.database.candidates))
    }

    fn migrate<W: Write>(&self, config: &Config, out: &mut W) -> Result<(), MigrateError> {
        let candidates = self.candidates(config)?;
        let required = college_columns();

        let report = Upgrader::new(USER_TABLE, &required)
            .with_busy_timeout(config.database.busy_timeout())
            .upgrade(&candidates, out)?;

        for column in &report.columns {
            match &column.outcome {
                ColumnOutcome::Added => info!("Added column '{}'", column.name),
                ColumnOutcome::AlreadyPresent { declared_type } => {
                    info!("Column '{}' already present as {}", column.name, declared_type)
                }
            }
        }
        if !report.changes_made() {
            info!("'{}' already up to date", USER_TABLE);
        }
        info!(
            "'{}' has {} columns (committed: {})",
            USER_TABLE,
            report.schema.columns().len(),
            report.committed
        );
        Ok(())
    }

    /// Run the migration between the banners. Returns whether it succeeded;
    /// only failures writing to `out` itself are returned as errors.
    pub fn run<W: Write>(&self, config: &Config, out: &mut W) -> io::Result<bool> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(out, "{}", rule)?;
        writeln!(out, "{}", TITLE)?;
        writeln!(out, "{}", rule)?;
        writeln!(out)?;

        let succeeded = match self.migrate(config, out) {
            Ok(()) => true,
            Err(err) => {
                error!("{:?}", err);
                Self::report_error(&err, out)?;
                false
            }
        };

        writeln!(out)?;
        writeln!(out, "{}", rule)?;
        if succeeded {
            writeln!(out, "Migration Status: SUCCESS")?;
        } else {
            writeln!(out, "Migration Status: FAILED")?;
        }
        writeln!(out, "{}", rule)?;

        Ok(succeeded)
    }

    fn report_error<W: Write>(err: &MigrateError, out: &mut W) -> io::Result<()> {
        match err.category() {
            ErrorCategory::NotFound => {
                writeln!(out, "ERROR: {}", err)?;
                writeln!(
                    out,
                    "Please ensure the application has been run at least once to create the database."
                )
            }
            ErrorCategory::Database => writeln!(out, "ERROR: {}", err),
            ErrorCategory::Unexpected => match err {
                MigrateError::IoError(e) => writeln!(out, "ERROR: Unexpected error: {}", e),
                _ => writeln!(out, "ERROR: Unexpected error: {}", err),
            },
        }
    }
}
