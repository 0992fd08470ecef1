// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identity database migrations.
//!
//! Applied versions are recorded in `schema_version`. Pending steps run in
//! one transaction; a failing step leaves the schema untouched.

use rusqlite::{params, Connection, OptionalExtension};

use super::StorageError;

/// One schema step. Versions start at 1 and increase by one.
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Every schema step, oldest first. Append only.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "identity_table",
        sql: "CREATE TABLE identity (
                  id_a BLOB PRIMARY KEY NOT NULL,
                  key_for_mac_encrypted BLOB NOT NULL,
                  key_for_tuples_encrypted BLOB NOT NULL,
                  creation_time INTEGER NOT NULL,
                  last_update INTEGER NOT NULL
              );",
    },
    Migration {
        version: 2,
        name: "identity_creation_time_index",
        sql: "CREATE INDEX idx_identity_creation_time ON identity (creation_time);",
    },
];

const VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL
);";

/// Highest applied version, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.execute_batch(VERSION_TABLE)?;
    let version = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

/// Applies the steps of `migrations` newer than the current version.
pub fn migrate(conn: &Connection, migrations: &[Migration]) -> Result<u32, StorageError> {
    let current = schema_version(conn)?;

    let mut expected = current + 1;
    let pending: Vec<&Migration> = migrations.iter().filter(|m| m.version > current).collect();
    for migration in &pending {
        if migration.version != expected {
            return Err(StorageError::Migration(format!(
                "expected v{} but found v{} '{}'",
                expected, migration.version, migration.name
            )));
        }
        expected += 1;
    }

    let Some(last) = pending.last() else {
        return Ok(current);
    };

    // Dropped without commit on error, which rolls back every step.
    let tx = conn.unchecked_transaction()?;
    for migration in &pending {
        tx.execute_batch(migration.sql).map_err(|e| {
            StorageError::Migration(format!(
                "v{} '{}' failed: {}",
                migration.version, migration.name, e
            ))
        })?;
        tx.execute(
            "INSERT INTO schema_version (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![
                migration.version,
                migration.name,
                chrono::Utc::now().timestamp()
            ],
        )?;
    }
    tx.commit()?;

    tracing::info!(from = current, to = last.version, "identity schema migrated");
    Ok(last.version)
}
