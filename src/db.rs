use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::roster::SnapshotStore;

pub const DB_FILE: &str = "roster.sqlite3";
pub const ROSTER_SNAPSHOT_KEY: &str = "roster.students";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace.to_string_lossy()
        )
    })?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.to_string_lossy()))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS workspace_settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

pub fn settings_get_text(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let v = conn
        .query_row(
            "SELECT value_json FROM workspace_settings WHERE key = ?",
            [key],
            |r| r.get::<_, String>(0),
        )
        .optional()?;
    Ok(v)
}

pub fn settings_set_text(conn: &Connection, key: &str, value_json: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO workspace_settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, value_json),
    )?;
    Ok(())
}

/// Keeps the whole roster as one JSON value under a fixed key.
pub struct SqliteSnapshots {
    conn: Connection,
}

impl SqliteSnapshots {
    pub fn new(conn: Connection) -> Self {
        SqliteSnapshots { conn }
    }
}

impl SnapshotStore for SqliteSnapshots {
    fn load(&self) -> anyhow::Result<Option<String>> {
        settings_get_text(&self.conn, ROSTER_SNAPSHOT_KEY).context("failed to read roster snapshot")
    }

    fn save(&self, snapshot: &str) -> anyhow::Result<()> {
        settings_set_text(&self.conn, ROSTER_SNAPSHOT_KEY, snapshot)
            .context("failed to write roster snapshot")
    }
}
