pub mod complaints;
pub mod demographics;

use anyhow::{Context, Result};
use duckdb::Connection;

use crate::config::DbConfig;

/// Open the destination database, creating the file if it doesn't exist.
/// The connection is owned by the caller for the duration of one batch and
/// released on drop, on every exit path.
pub fn open(config: &DbConfig) -> Result<Connection> {
    Connection::open(&config.path)
        .with_context(|| format!("cannot open database {}", config.path.display()))
}
