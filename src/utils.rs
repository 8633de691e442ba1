use std::path::PathBuf;

pub struct Utils {

}

impl Utils {
    /// Quote an SQL identifier so table and column names can be spliced into
    /// statements that don't accept bound parameters (PRAGMA, ALTER TABLE).
    pub fn quote_ident(ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    pub fn join_paths(paths: &[PathBuf]) -> String {
        paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
