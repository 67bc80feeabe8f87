//! Error types for sqlhook

use crate::hook::Method;
use thiserror::Error;

/// Result type alias for sqlhook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reason a [`Context`](crate::Context) is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context was cancelled through its [`CancelHandle`](crate::CancelHandle).
    #[error("context canceled")]
    Canceled,

    /// The context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Error types for wrapped driver operations
#[derive(Debug, Error)]
pub enum Error {
    /// A legacy (context-free) call cannot bind named arguments.
    #[error("sql: driver does not support the use of Named Parameters")]
    NamedParamsUnsupported,

    /// The context was already done at a cancellation checkpoint.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The driver does not implement this operation; the caller should fall
    /// back to its next strategy (usually prepare, then execute).
    #[error("driver: skip fast-path; continue as if unimplemented")]
    Skip,

    /// Legacy begin cannot honour a non-default isolation level.
    #[error("sql: driver does not support non-default isolation level")]
    IsolationUnsupported,

    /// Legacy begin cannot honour a read-only transaction.
    #[error("sql: driver does not support read-only transactions")]
    ReadOnlyUnsupported,

    /// An `after` hook replaced the outcome with one of the wrong shape.
    #[error("hook returned an outcome that does not fit {method} (expected {expected})")]
    OutcomeMismatch {
        method: Method,
        expected: &'static str,
    },

    /// A driver was already registered under this name.
    #[error("sql: register called twice for driver {0}")]
    DuplicateDriver(String),

    /// No driver is registered under this name.
    #[error("sql: unknown driver {0:?} (forgotten import?)")]
    UnknownDriver(String),

    /// Error reported by the wrapped driver.
    #[error(transparent)]
    Driver(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an error produced by the underlying driver.
    pub fn driver(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Driver(err.into())
    }

    /// Check if this is the "try another strategy" sentinel
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }

    /// Check if this error comes from a done context
    pub fn is_context(&self) -> bool {
        matches!(self, Self::Context(_))
    }

    /// Check if this error was produced by the wrapped driver
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver(_))
    }
}
