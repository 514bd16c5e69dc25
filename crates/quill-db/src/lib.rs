pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod writer;

use anyhow::Result;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

pub use error::WriteError;
pub use writer::{Applied, Mutation, MutationQueue, Pending};

const READER_POOL_SIZE: usize = 4;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Read side of the store: a round-robin pool of read-only connections.
///
/// Nothing here can write. The only writable connection is the
/// [`WriterConn`] handed out by [`Database::open`], and it belongs to the
/// mutation worker.
pub struct Database {
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

/// The single writable connection. Moved into the worker thread by
/// [`MutationQueue::start`].
pub struct WriterConn {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<(Self, WriterConn)> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        writer.busy_timeout(BUSY_TIMEOUT)?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(READER_POOL_SIZE);
        for _ in 0..READER_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            READER_POOL_SIZE
        );
        Ok((
            Self {
                readers,
                reader_idx: AtomicUsize::new(0),
            },
            WriterConn { conn: writer },
        ))
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[idx]
            .lock()
            .map_err(|e| anyhow::anyhow!("Reader lock poisoned: {}", e))?;
        f(&conn)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// Fresh store in a temp dir with its worker running. Keep the `TempDir`
    /// alive for the duration of the test.
    pub fn open_temp(capacity: usize) -> (TempDir, Database, MutationQueue) {
        let dir = tempfile::tempdir().unwrap();
        let (db, writer) = Database::open(&dir.path().join("quill.db")).unwrap();
        let queue = MutationQueue::start(writer, capacity).unwrap();
        (dir, db, queue)
    }
}
