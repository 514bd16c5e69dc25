use thiserror::Error;

/// Failure of a single mutation, delivered through its result slot.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("login is already taken")]
    Conflict,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("mutation queue is closed")]
    Closed,

    /// The worker went away without answering. Only happens if the worker
    /// thread panicked.
    #[error("mutation worker exited before replying")]
    WorkerLost,

    #[error(transparent)]
    Store(#[from] rusqlite::Error),
}
