/// Key-value slot queries. Values are stored as JSON text.
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Reads and decodes the value under `key`. `Ok(None)` when the key is absent.
pub fn get_json<T: DeserializeOwned>(key: &str, conn: &Connection) -> Result<Option<T>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    match raw {
        Some(raw) => {
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("stored value for `{key}` is not valid"))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Writes the full value under `key`, replacing whatever was there.
pub fn put_json<T: Serialize + ?Sized>(key: &str, value: &T, conn: &Connection) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        (key, raw, Utc::now().to_rfc3339()),
    )?;
    Ok(())
}
