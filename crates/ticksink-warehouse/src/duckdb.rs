//! `DuckDB` connection pool management.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use ::duckdb::Connection;

/// Where a `DuckDB` database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuckDbTarget {
    /// A database file on disk.
    File(PathBuf),
    /// A private in-memory database, shared by every connection of one pool.
    InMemory,
}

struct PoolInner {
    target: DuckDbTarget,
    max_idle: usize,
    // Every pooled connection is cloned from this one so they share a single
    // database instance.
    root: Mutex<Connection>,
    idle: Mutex<Vec<Connection>>,
}

/// A connection pool manager for `DuckDB` connections.
#[derive(Clone)]
pub struct DuckDbConnectionManager {
    inner: Arc<PoolInner>,
}

impl DuckDbConnectionManager {
    /// Open the database and create a pool around it.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or configured.
    pub fn open(target: DuckDbTarget, max_idle: usize) -> Result<Self, ::duckdb::Error> {
        let root = match &target {
            DuckDbTarget::File(path) => Connection::open(path)?,
            DuckDbTarget::InMemory => Connection::open_in_memory()?,
        };
        configure_connection(&root)?;

        Ok(Self {
            inner: Arc::new(PoolInner {
                target,
                max_idle: max_idle.max(1),
                root: Mutex::new(root),
                idle: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Acquire a connection; it returns to the pool when the guard drops.
    ///
    /// # Errors
    /// Returns an error if a new connection cannot be cloned or configured.
    pub fn acquire(&self) -> Result<PooledConnection, ::duckdb::Error> {
        let reused = self
            .inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        let connection = match reused {
            Some(connection) => connection,
            None => {
                let connection = self
                    .inner
                    .root
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .try_clone()?;
                configure_connection(&connection)?;
                connection
            }
        };

        Ok(PooledConnection {
            pool: Arc::clone(&self.inner),
            connection: Some(connection),
        })
    }

    /// Path to the database file, if the pool is file-backed.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        match &self.inner.target {
            DuckDbTarget::File(path) => Some(path.as_path()),
            DuckDbTarget::InMemory => None,
        }
    }

    #[cfg(test)]
    fn idle_count(&self) -> usize {
        self.inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// A pooled connection that returns to the pool when dropped.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    connection: Option<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("pooled connection unexpectedly missing")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        let mut idle = self
            .pool
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.pool.max_idle {
            idle.push(connection);
        }
    }
}

/// Configure a database connection with appropriate settings.
fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_connections_are_reused() {
        let manager = DuckDbConnectionManager::open(DuckDbTarget::InMemory, 2).expect("open");
        {
            let first = manager.acquire().expect("first");
            let _second = manager.acquire().expect("second");
            first
                .execute_batch("CREATE TABLE shared_check (v INTEGER)")
                .expect("create");
        }
        assert_eq!(manager.idle_count(), 2);

        let third = manager.acquire().expect("third");
        assert_eq!(manager.idle_count(), 1);
        let count: i64 = third
            .query_row("SELECT COUNT(*) FROM shared_check", [], |row| row.get(0))
            .expect("pooled connections share one database");
        assert_eq!(count, 0);
    }

    #[test]
    fn idle_list_is_bounded() {
        let manager = DuckDbConnectionManager::open(DuckDbTarget::InMemory, 1).expect("open");
        {
            let _a = manager.acquire().expect("a");
            let _b = manager.acquire().expect("b");
        }
        assert_eq!(manager.idle_count(), 1);
        assert!(manager.db_path().is_none());
    }
}
