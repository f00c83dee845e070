//! SQLite database crate for libris.
//!
//! Provides a cloneable [`Database`] handle around a single `rusqlite`
//! connection and the migration runner that applies module-contributed
//! schema changes exactly once.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};

/// Path value that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Migration definition contributed by a module.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Shared handle to the application database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the database at `path`, creating parent directories as needed.
    /// The special path `:memory:` opens an in-memory database.
    pub fn open(path: &str) -> anyhow::Result<Self> {
        if path == IN_MEMORY {
            return Self::open_in_memory();
        }

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("failed to enable WAL journal")?;

        tracing::info!(target: "libris-db", path, "database opened");
        Self::from_connection(conn)
    }

    /// Open a fresh in-memory database.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        tracing::debug!(target: "libris-db", "in-memory database opened");
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("failed to enable foreign keys")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` with exclusive access to the connection.
    ///
    /// The lock is held for the whole closure, so a read followed by a write
    /// inside one call cannot interleave with another caller.
    pub fn with_conn<T, E>(&self, f: impl FnOnce(&mut Connection) -> Result<T, E>) -> Result<T, E> {
        // A panic in another holder leaves the connection itself usable.
        let mut guard = self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Apply every migration in `migrations` that has not been recorded yet.
    ///
    /// Each entry is `(module_name, migration)`; a migration is identified by
    /// both parts. Returns the number of migrations applied by this call.
    pub fn migrate(&self, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS _migrations (
                    module TEXT NOT NULL,
                    id TEXT NOT NULL,
                    applied_at TEXT NOT NULL,
                    PRIMARY KEY (module, id)
                );",
            )
            .context("failed to create migrations table")?;

            let mut applied = 0;
            for (module, migration) in migrations {
                let seen: Option<i64> = conn
                    .query_row(
                        "SELECT 1 FROM _migrations WHERE module = ?1 AND id = ?2",
                        params![module, migration.id],
                        |row| row.get(0),
                    )
                    .optional()
                    .context("failed to read migrations table")?;
                if seen.is_some() {
                    tracing::debug!(target: "libris-db", module = %module, id = migration.id, "migration already applied");
                    continue;
                }

                let tx = conn.transaction().context("failed to begin migration")?;
                tx.execute_batch(migration.up).with_context(|| {
                    format!("migration {module}/{} failed", migration.id)
                })?;
                tx.execute(
                    "INSERT INTO _migrations (module, id, applied_at) VALUES (?1, ?2, ?3)",
                    params![module, migration.id, chrono::Utc::now()],
                )
                .context("failed to record migration")?;
                tx.commit().context("failed to commit migration")?;

                tracing::info!(target: "libris-db", module = %module, id = migration.id, "migration applied");
                applied += 1;
            }

            Ok(applied)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<(String, Migration)> {
        vec![(
            "test".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE widget (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
            },
        )]
    }

    #[test]
    fn migrations_apply_once() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.migrate(&sample()).unwrap(), 1);
        assert_eq!(db.migrate(&sample()).unwrap(), 0);

        let count: i64 = db
            .with_conn(|conn| conn.query_row("SELECT COUNT(*) FROM widget", [], |r| r.get(0)))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn failed_migration_is_not_recorded() {
        let db = Database::open_in_memory().unwrap();
        let broken = vec![(
            "test".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE nope (",
            },
        )];
        assert!(db.migrate(&broken).is_err());

        let recorded: i64 = db
            .with_conn(|conn| conn.query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0)))
            .unwrap();
        assert_eq!(recorded, 0);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!("libris-db-test-{}", std::process::id()));
        let path = dir.join("nested").join("catalog.db");
        let db = Database::open(path.to_str().unwrap()).unwrap();
        db.migrate(&sample()).unwrap();
        assert!(path.exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
