//! SQLite-backed project/task store.
//!
//! # Responsibility
//! - Bind repository contracts to one migrated connection.
//! - Provide `BEGIN IMMEDIATE` transactional scopes.
//!
//! # Invariants
//! - A store only binds to connections at the latest schema version.
//! - Nested `with_transaction` calls join the outer transaction.

use super::store::{RepoError, RepoResult, TrackerStore};
use crate::db::migrations::latest_version;
use crate::model::status::WorkStatus;
use log::warn;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::cell::Cell;
use uuid::Uuid;

/// SQLite store over a borrowed, migrated connection.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
    tx_depth: Cell<u32>,
}

impl<'conn> SqliteStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self {
            conn,
            tx_depth: Cell::new(0),
        })
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }

    /// Returns whether a transactional scope is currently open.
    pub fn in_transaction(&self) -> bool {
        self.tx_depth.get() > 0
    }
}

impl TrackerStore for SqliteStore<'_> {
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>,
    {
        if self.in_transaction() {
            return f(self);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| E::from(RepoError::from(err)))?;
        let result = {
            let _depth = DepthGuard::enter(&self.tx_depth);
            f(self)
        };

        match result {
            Ok(value) => {
                tx.commit().map_err(|err| E::from(RepoError::from(err)))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=store_rollback module=repo status=error error={}",
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }
}

struct DepthGuard<'a> {
    depth: &'a Cell<u32>,
}

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<u32>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

pub(crate) fn status_to_db(status: WorkStatus) -> &'static str {
    match status {
        WorkStatus::Draft => "draft",
        WorkStatus::InProgress => "in_progress",
        WorkStatus::Done => "done",
    }
}

pub(crate) fn parse_status(value: &str, column: &'static str) -> RepoResult<WorkStatus> {
    match value {
        "draft" => Ok(WorkStatus::Draft),
        "in_progress" => Ok(WorkStatus::InProgress),
        "done" => Ok(WorkStatus::Done),
        other => Err(RepoError::InvalidData(format!(
            "invalid status `{other}` in {column}"
        ))),
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_store_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let required: [(&'static str, &[&'static str]); 2] = [
        (
            "projects",
            &[
                "uuid",
                "name",
                "status",
                "completion_progress_bp",
                "created_at",
                "updated_at",
            ],
        ),
        (
            "tasks",
            &[
                "uuid",
                "name",
                "status",
                "weight",
                "project_uuid",
                "created_at",
                "updated_at",
            ],
        ),
    ];

    for (table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{parse_status, status_to_db};
    use crate::model::status::WorkStatus;

    #[test]
    fn status_db_labels_roundtrip() {
        for status in WorkStatus::ALL {
            assert_eq!(parse_status(status_to_db(status), "t.status").unwrap(), status);
        }
        assert!(parse_status("Done", "t.status").is_err());
    }
}
