/// Database module: the durable key-value slot the store persists into.
mod kv;
mod migrations;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;

pub use kv::{get_json, put_json};

/// Opens (or creates) the SQLite database and runs migrations.
pub fn init(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// In-memory database with the schema applied.
#[cfg(test)]
pub fn init_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Returns the default database path inside the user's data directory.
/// Falls back to `./dayplan.db` when no data dir is found.
pub fn default_db_path() -> PathBuf {
    match dirs::data_local_dir() {
        Some(data_dir) => data_dir.join("dayplan").join("dayplan.db"),
        None => PathBuf::from("dayplan.db"),
    }
}
