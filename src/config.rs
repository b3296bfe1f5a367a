use std::path::PathBuf;

/// Destination database configuration, resolved once at process start from
/// flags / environment and handed to the persister. The database is an
/// embedded DuckDB file, so the process identity is the only credential.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}
