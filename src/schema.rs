use crate::utils::Utils;

/// Table the application stores accounts in. Created by the application, never by this tool.
pub const USER_TABLE: &str = "user";

/// A column that must exist on the target table once the upgrade has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    name: String,
    declared_type: String,
}

impl ColumnSpec {
    pub fn new(name: &str, declared_type: &str) -> Self {
        ColumnSpec {
            name: name.to_owned(),
            declared_type: declared_type.to_owned(),
        }
    }

    /// Bounded variable-length string column, e.g. `VARCHAR(50)`.
    pub fn varchar(name: &str, max_len: u32) -> Self {
        Self::new(name, &format!("VARCHAR({})", max_len))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    /// Additive statement for this column. The new column is nullable with no default.
    pub fn add_column_sql(&self, table: &str) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            Utils::quote_ident(table),
            Utils::quote_ident(&self.name),
            self.declared_type
        )
    }
}

/// The college fields added to the user table.
pub fn college_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::varchar("college_type", 50),
        ColumnSpec::varchar("college_state", 100),
    ]
}

/// One column as reported by the engine's table metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

impl ColumnInfo {
    #[cfg(test)]
    pub fn new(name: &str, declared_type: &str) -> Self {
        ColumnInfo {
            name: name.to_owned(),
            declared_type: declared_type.to_owned(),
        }
    }
}

/// Columns of a table at a point in time, in the engine's column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    columns: Vec<ColumnInfo>,
}

impl SchemaSnapshot {
    pub fn from_columns(columns: Vec<ColumnInfo>) -> Self {
        SchemaSnapshot { columns }
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Column names compare ASCII case-insensitively, as SQLite does.
    pub fn find(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
