use log::info;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::MigrateError;
use crate::schema::{ColumnInfo, SchemaSnapshot};
use crate::utils::Utils;

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open an existing database file for writing. Fails without touching the
    /// filesystem if the file isn't there, and never creates one.
    pub fn open_existing(path: &Path, busy_timeout: Duration) -> Result<Self, MigrateError> {
        if !path.is_file() {
            return Err(MigrateError::NotFound {
                candidates: vec![path.to_path_buf()],
            });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(busy_timeout)?;
        info!("Database opened at: {}", path.display());

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, MigrateError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn table_columns(&self, table: &str) -> Result<SchemaSnapshot, MigrateError> {
        Self::read_columns(&self.conn, table)
    }

    /// Introspect a table's columns through `PRAGMA table_info`. A table that
    /// doesn't exist yields an empty snapshot.
    pub fn read_columns(conn: &Connection, table: &str) -> Result<SchemaSnapshot, MigrateError> {
        let sql = format!("PRAGMA table_info({})", Utils::quote_ident(table));
        let mut stmt = conn.prepare(&sql)?;

        // cid, name, type, notnull, dflt_value, pk
        let rows = stmt.query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                declared_type: row.get(2)?,
            })
        })?;

        let mut columns = Vec::new();
        for column in rows {
            columns.push(column?);
        }

        Ok(SchemaSnapshot::from_columns(columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_existing_missing_file_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edutrade.db");

        let result = Database::open_existing(&path, Duration::from_millis(100));
        assert!(matches!(result, Err(MigrateError::NotFound { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_existing_and_read_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edutrade.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE user (id INTEGER PRIMARY KEY, name TEXT, note)")
                .unwrap();
        }

        let db = Database::open_existing(&path, Duration::from_millis(100)).unwrap();
        assert_eq!(db.path(), path.as_path());

        let snapshot = db.table_columns("user").unwrap();
        assert_eq!(
            snapshot.columns(),
            &[
                ColumnInfo::new("id", "INTEGER"),
                ColumnInfo::new("name", "TEXT"),
                ColumnInfo::new("note", ""),
            ]
        );
    }

    #[test]
    fn test_read_columns_unknown_table_is_empty() {
        let db = Database::open_in_memory().unwrap();
        let snapshot = db.table_columns("user").unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_open_existing_rejects_non_database_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edutrade.db");
        std::fs::write(&path, b"this is definitely not an sqlite file, padded out past the header size").unwrap();

        // SQLite opens lazily; the failure surfaces on first use.
        let result = Database::open_existing(&path, Duration::from_millis(100))
            .and_then(|db| db.table_columns("user"));
        assert!(matches!(result, Err(MigrateError::DatabaseError(_))));
    }
}
