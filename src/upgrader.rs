use std::io::Write;
use std::time::Duration;

use log::{debug, info, warn, Level};
use logging_timer::timer;

use crate::database::Database;
use crate::error::MigrateError;
use crate::locate::DbCandidates;
use crate::schema::{ColumnSpec, SchemaSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOutcome {
    Added,
    /// Left untouched; carries the type the column already had.
    AlreadyPresent { declared_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnResult {
    pub name: String,
    pub outcome: ColumnOutcome,
}

/// What a successful run did and what the table looks like afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    pub columns: Vec<ColumnResult>,
    pub committed: bool,
    pub schema: SchemaSnapshot,
}

impl UpgradeReport {
    pub fn added(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.outcome == ColumnOutcome::Added)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn changes_made(&self) -> bool {
        !self.added().is_empty()
    }
}

/// Ensures a fixed set of columns exists on one table, adding whichever are
/// missing. Existing columns are never altered, so repeated runs converge.
pub struct Upgrader<'a> {
    table: &'a str,
    required: &'a [ColumnSpec],
    busy_timeout: Duration,
}

impl<'a> Upgrader<'a> {
    const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(table: &'a str, required: &'a [ColumnSpec]) -> Self {
        Upgrader {
            table,
            required,
            busy_timeout: Self::DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Locate the database, open it and bring the table up to date.
    /// Progress lines are written to `out` as the run proceeds.
    pub fn upgrade<W: Write>(
        &self,
        candidates: &DbCandidates,
        out: &mut W,
    ) -> Result<UpgradeReport, MigrateError> {
        let db_path = match candidates.resolve() {
            Ok(path) => path,
            Err(MigrateError::NotFound { candidates: tried }) => {
                // Name the last location tried, then fail before any connection attempt
                if let Some(last) = tried.last() {
                    writeln!(out, "Connecting to database: {}", last.display())?;
                }
                return Err(MigrateError::NotFound { candidates: tried });
            }
            Err(err) => return Err(err),
        };
        writeln!(out, "Connecting to database: {}", db_path.display())?;

        let mut db = Database::open_existing(&db_path, self.busy_timeout)?;
        self.upgrade_database(&mut db, out)
    }

    pub fn upgrade_database<W: Write>(
        &self,
        db: &mut Database,
        out: &mut W,
    ) -> Result<UpgradeReport, MigrateError> {
        let _tmr = timer!(Level::Trace; "Upgrader::upgrade_database", "{}", self.table);

        let before = db.table_columns(self.table)?;
        if before.is_empty() {
            return Err(MigrateError::TableNotFound(self.table.to_owned()));
        }
        debug!(
            "Columns of '{}' in {} before upgrade: {:?}",
            self.table,
            db.path().display(),
            before.names()
        );

        let mut columns = Vec::with_capacity(self.required.len());

        // Dropping the transaction without committing rolls it back
        let tx = db.conn_mut().transaction()?;

        for spec in self.required {
            match before.find(spec.name()) {
                Some(existing) => {
                    if !existing
                        .declared_type
                        .eq_ignore_ascii_case(spec.declared_type())
                    {
                        warn!(
                            "Column '{}' exists as '{}', expected '{}'; leaving it unchanged",
                            spec.name(),
                            existing.declared_type,
                            spec.declared_type()
                        );
                    }
                    writeln!(out, "✓ {} column already exists", spec.name())?;
                    columns.push(ColumnResult {
                        name: spec.name().to_owned(),
                        outcome: ColumnOutcome::AlreadyPresent {
                            declared_type: existing.declared_type.clone(),
                        },
                    });
                }
                None => {
                    writeln!(out, "Adding {} column...", spec.name())?;
                    let sql = spec.add_column_sql(self.table);
                    info!("{}", sql);
                    tx.execute(&sql, [])?;
                    writeln!(out, "✓ {} column added successfully", spec.name())?;
                    columns.push(ColumnResult {
                        name: spec.name().to_owned(),
                        outcome: ColumnOutcome::Added,
                    });
                }
            }
        }

        let committed = columns.iter().any(|c| c.outcome == ColumnOutcome::Added);
        writeln!(out)?;
        if committed {
            tx.commit()?;
            writeln!(out, "✓ Migration completed successfully!")?;
        } else {
            drop(tx);
            writeln!(out, "✓ No migration needed - columns already exist")?;
        }

        let schema = db.table_columns(self.table)?;
        if let Some(missing) = self.required.iter().find(|c| !schema.contains(c.name())) {
            return Err(MigrateError::Error(format!(
                "Column '{}' is missing from '{}' after the upgrade",
                missing.name(),
                self.table
            )));
        }

        writeln!(out)?;
        writeln!(out, "User table schema:")?;
        for column in schema.columns() {
            writeln!(out, "  - {} ({})", column.name, column.declared_type)?;
        }

        Ok(UpgradeReport {
            columns,
            committed,
            schema,
        })
    }
}
