//! # sqlhook
//!
//! Before/after hooks around every call of a wrapped SQL driver.
//!
//! ## Features
//!
//! - **Transparent wrapping**: the wrapped driver implements the same traits as the real one
//! - **Capability dispatch**: context-aware calls fall back to legacy ones when the driver lacks them
//! - **Mutating hooks**: `before` may replace the context, `after` may replace the result
//! - **Fault containment**: a panicking hook never takes the call down with it
//! - **Built-in hooks**: closures, chaining, statistics and `tracing` output
//!
//! ## Example
//!
//! ```ignore
//! use sqlhook::{Context, ExecerContext, StatsHook, args, wrap};
//! use std::sync::Arc;
//!
//! let stats = Arc::new(StatsHook::new());
//! let driver = sqlhook::wrap_arc(Arc::new(my_driver), stats.clone());
//!
//! let mut conn = driver.connect("postgres://localhost/app")?;
//! conn.exec_context(&Context::background(), "DELETE FROM sessions WHERE id = $1", &args([42]))?;
//!
//! assert_eq!(stats.stats().exec_count, 1);
//! ```

pub mod context;
pub mod driver;
pub mod error;
pub mod hook;
pub mod registry;
pub mod value;
pub mod wrap;

pub use context::{CancelHandle, Context, elapsed};
pub use driver::{
    Conn, ConnBeginTx, ConnCapabilities, ConnPrepareContext, Driver, Execer, ExecerContext,
    Queryer, QueryerContext, Rows, Stmt, StmtCapabilities, StmtExecContext, StmtQueryContext, Tx,
};
pub use error::{ContextError, Error, Result};
pub use hook::{
    AfterFn, Args, BeforeFn, Call, CompositeHook, FnHook, Hook, HookStats, Method, NoopHook,
    Outcome, StatementKind, StatsHook, TraceConfig, TracingHook,
};
pub use registry::{Registry, drivers, open, register};
pub use value::{
    ExecResult, IsolationLevel, MemoryRows, NamedValue, TxOptions, Value, args, to_positional,
};
pub use wrap::{WrappedConn, WrappedDriver, WrappedStmt, WrappedTx, wrap, wrap_arc};
