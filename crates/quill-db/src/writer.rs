//! Single-writer mutation queue.
//!
//! Every write to the store goes through [`MutationQueue`]. Commands wait in
//! a bounded FIFO and are applied one at a time by a dedicated OS thread
//! that owns the only writable connection. Each command carries a one-shot
//! result slot, so the submitting caller learns the outcome of its own write
//! and nothing else.
//!
//! Dropping a [`Pending`] before it resolves abandons the result only. The
//! command is already queued and still runs; there is no cancellation path
//! into the worker.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use rusqlite::Connection;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::WriterConn;
use crate::error::WriteError;
use crate::queries;

/// Queue depth used when configuration does not override it.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

pub type WriteResult = Result<Applied, WriteError>;

/// One store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateArticle { owner: String, text: String },
    UpdateArticle { id: i64, text: String },
    DeleteArticle { id: i64 },
    CreateUser { login: String, password_hash: String },
}

impl Mutation {
    fn kind(&self) -> &'static str {
        match self {
            Self::CreateArticle { .. } => "create_article",
            Self::UpdateArticle { .. } => "update_article",
            Self::DeleteArticle { .. } => "delete_article",
            Self::CreateUser { .. } => "create_user",
        }
    }
}

/// What a successful mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A row was inserted with this id.
    Created(i64),
    Updated,
    Deleted,
}

impl Applied {
    pub fn created_id(self) -> Option<i64> {
        match self {
            Self::Created(id) => Some(id),
            _ => None,
        }
    }
}

struct Command {
    mutation: Mutation,
    reply: oneshot::Sender<WriteResult>,
}

/// Result slot for one submitted mutation. Resolves exactly once.
#[must_use = "dropping a Pending abandons the result, the mutation still runs"]
#[derive(Debug)]
pub struct Pending {
    rx: oneshot::Receiver<WriteResult>,
}

impl Pending {
    /// Wait for the worker to apply the mutation.
    pub async fn wait(self) -> WriteResult {
        self.rx.await.map_err(|_| WriteError::WorkerLost)?
    }
}

/// Handle to the mutation queue. Cheap to clone; all clones feed the same
/// worker.
#[derive(Clone)]
pub struct MutationQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    /// `None` once the queue is closed. Submitters hold the read side until
    /// their command is in the channel, so `close` waits for them.
    tx: RwLock<Option<mpsc::Sender<Command>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    capacity: usize,
}

impl MutationQueue {
    /// Spawn the worker thread on `writer` and return the queue feeding it.
    pub fn start(writer: WriterConn, capacity: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(capacity > 0, "mutation queue capacity must be positive");

        let (tx, rx) = mpsc::channel(capacity);
        let handle = thread::Builder::new()
            .name("quill-writer".into())
            .spawn(move || run_worker(writer.conn, rx))?;

        info!("Mutation worker started (queue capacity {})", capacity);
        Ok(Self {
            inner: Arc::new(QueueInner {
                tx: RwLock::new(Some(tx)),
                worker: Mutex::new(Some(handle)),
                capacity,
            }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Enqueue `mutation`. Waits while the queue is full; fails immediately
    /// with [`WriteError::Closed`] once [`close`](Self::close) has returned.
    pub async fn submit(&self, mutation: Mutation) -> Result<Pending, WriteError> {
        let guard = self.inner.tx.read().await;
        let tx = guard.as_ref().ok_or(WriteError::Closed)?;

        let (reply, rx) = oneshot::channel();
        tx.send(Command { mutation, reply })
            .await
            .map_err(|_| WriteError::Closed)?;

        Ok(Pending { rx })
    }

    /// Submit and wait for the outcome.
    pub async fn execute(&self, mutation: Mutation) -> WriteResult {
        self.submit(mutation).await?.wait().await
    }

    /// Stop accepting new commands. Submissions already in progress finish
    /// enqueueing first; everything queued is still applied and answered.
    pub async fn close(&self) {
        let closed = self.inner.tx.write().await.take();
        if closed.is_some() {
            info!("Mutation queue closed, draining");
        }
    }

    /// Close the queue and wait until the worker has drained it and released
    /// the writer connection.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.close().await;

        let handle = self
            .inner
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            tokio::task::spawn_blocking(move || handle.join())
                .await?
                .map_err(|_| anyhow::anyhow!("mutation worker panicked"))?;
        }
        Ok(())
    }
}

fn run_worker(conn: Connection, mut rx: mpsc::Receiver<Command>) {
    let mut processed: u64 = 0;

    // Ends once every sender is gone and the buffer is empty.
    while let Some(Command { mutation, reply }) = rx.blocking_recv() {
        let kind = mutation.kind();
        let result = apply(&conn, mutation);
        processed += 1;

        match &result {
            Ok(applied) => debug!("Applied {}: {:?}", kind, applied),
            Err(e) => warn!("Mutation {} failed: {}", kind, e),
        }

        if reply.send(result).is_err() {
            debug!("Result of {} abandoned by caller", kind);
        }
    }

    info!(
        "Mutation worker stopped after {} commands, releasing writer",
        processed
    );
}

fn apply(conn: &Connection, mutation: Mutation) -> WriteResult {
    match mutation {
        Mutation::CreateArticle { owner, text } => {
            queries::insert_article(conn, &owner, &text).map(Applied::Created)
        }
        Mutation::UpdateArticle { id, text } => {
            queries::update_article(conn, id, &text).map(|()| Applied::Updated)
        }
        Mutation::DeleteArticle { id } => {
            queries::delete_article(conn, id).map(|()| Applied::Deleted)
        }
        Mutation::CreateUser {
            login,
            password_hash,
        } => queries::insert_user(conn, &login, &password_hash).map(Applied::Created),
    }
}
