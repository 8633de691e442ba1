use std::path::{Path, PathBuf};

use log::debug;

use crate::error::MigrateError;

/// Default database locations, relative to the base directory, in search order.
pub const DEFAULT_CANDIDATES: [&str; 2] = ["edutrade.db", "instance/database.db"];

/// Ordered list of places the application's database may live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbCandidates {
    paths: Vec<PathBuf>,
}

impl DbCandidates {
    /// Resolve configured candidates against `base_dir`. Absolute entries are kept as-is.
    pub fn from_config(base_dir: &Path, candidates: &[String]) -> Self {
        DbCandidates {
            paths: candidates.iter().map(|c| base_dir.join(c)).collect(),
        }
    }

    /// An explicitly named database file; no fallback search.
    pub fn single(path: PathBuf) -> Self {
        DbCandidates { paths: vec![path] }
    }

    /// First candidate that exists as a regular file. Never creates anything.
    pub fn resolve(&self) -> Result<PathBuf, MigrateError> {
        for path in &self.paths {
            if path.is_file() {
                debug!("Using database candidate {}", path.display());
                return Ok(path.clone());
            }
            debug!("Database candidate {} does not exist", path.display());
        }

        Err(MigrateError::NotFound {
            candidates: self.paths.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn default_candidates(base: &Path) -> DbCandidates {
        let names: Vec<String> = DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect();
        DbCandidates::from_config(base, &names)
    }

    #[test]
    fn test_primary_candidate_wins() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("instance")).unwrap();
        fs::write(dir.path().join("edutrade.db"), b"").unwrap();
        fs::write(dir.path().join("instance/database.db"), b"").unwrap();

        let resolved = default_candidates(dir.path()).resolve().unwrap();
        assert_eq!(resolved, dir.path().join("edutrade.db"));
    }

    #[test]
    fn test_falls_back_to_instance_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("instance")).unwrap();
        fs::write(dir.path().join("instance/database.db"), b"").unwrap();

        let resolved = default_candidates(dir.path()).resolve().unwrap();
        assert_eq!(resolved, dir.path().join("instance").join("database.db"));
    }

    #[test]
    fn test_directory_is_not_a_database() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("edutrade.db")).unwrap();

        let err = default_candidates(dir.path()).resolve().unwrap_err();
        assert!(matches!(err, MigrateError::NotFound { .. }));
    }

    #[test]
    fn test_nothing_found_reports_all_candidates() {
        let dir = TempDir::new().unwrap();

        match default_candidates(dir.path()).resolve() {
            Err(MigrateError::NotFound { candidates }) => {
                assert_eq!(
                    candidates,
                    vec![dir.path().join("edutrade.db"), dir.path().join("instance/database.db")]
                );
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_absolute_candidate_ignores_base() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("elsewhere.db");
        fs::write(&db, b"").unwrap();

        let candidates =
            DbCandidates::from_config(Path::new("/nonexistent"), &[db.display().to_string()]);
        assert_eq!(candidates.resolve().unwrap(), db);
    }
}
