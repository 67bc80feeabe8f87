//! Driver service-provider interface.
//!
//! A database driver implements [`Driver`], [`Conn`], [`Stmt`], [`Tx`] and
//! [`Rows`]. Optional capabilities are exposed through the `as_*` accessors:
//! a driver that supports, say, context-aware execution overrides
//! [`Conn::as_execer_context`] to return `Some(self)`. Callers probe the
//! accessor at the point of use and fall back when it returns `None`.

use crate::context::Context;
use crate::error::Result;
use crate::value::{ExecResult, NamedValue, TxOptions, Value};
use std::fmt;

/// Entry point of a driver: opens connections.
pub trait Driver: Send + Sync {
    /// Open a new connection. `name` is driver specific (usually a DSN).
    fn open(&self, name: &str) -> Result<Box<dyn Conn>>;
}

/// A connection to a database. Used by one caller at a time.
pub trait Conn: Send {
    /// Prepare a statement bound to this connection.
    fn prepare(&mut self, query: &str) -> Result<Box<dyn Stmt>>;

    /// Begin a transaction with default options.
    fn begin(&mut self) -> Result<Box<dyn Tx>>;

    /// Close the connection.
    fn close(&mut self) -> Result<()>;

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        None
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        None
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        None
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        None
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        None
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        None
    }
}

/// Legacy execution without a prepared statement.
pub trait Execer {
    fn exec(&mut self, query: &str, args: &[Value]) -> Result<ExecResult>;
}

/// Context-aware execution without a prepared statement.
pub trait ExecerContext {
    fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<ExecResult>;
}

/// Legacy query without a prepared statement.
pub trait Queryer {
    fn query(&mut self, query: &str, args: &[Value]) -> Result<Box<dyn Rows>>;
}

/// Context-aware query without a prepared statement.
pub trait QueryerContext {
    fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn Rows>>;
}

/// Context-aware statement preparation.
pub trait ConnPrepareContext {
    fn prepare_context(&mut self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>>;
}

/// Context-aware transaction begin with options.
pub trait ConnBeginTx {
    fn begin_tx(&mut self, ctx: &Context, opts: &TxOptions) -> Result<Box<dyn Tx>>;
}

/// A prepared statement. Bound to the connection that prepared it.
pub trait Stmt: Send {
    /// Close the statement.
    fn close(&mut self) -> Result<()>;

    /// Number of placeholders, or `None` if the driver cannot tell.
    fn num_input(&self) -> Option<usize> {
        None
    }

    /// Execute with positional arguments.
    fn exec(&mut self, args: &[Value]) -> Result<ExecResult>;

    /// Query with positional arguments.
    fn query(&mut self, args: &[Value]) -> Result<Box<dyn Rows>>;

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        None
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        None
    }
}

/// Context-aware execution of a prepared statement.
pub trait StmtExecContext {
    fn exec_context(&mut self, ctx: &Context, args: &[NamedValue]) -> Result<ExecResult>;
}

/// Context-aware query of a prepared statement.
pub trait StmtQueryContext {
    fn query_context(&mut self, ctx: &Context, args: &[NamedValue]) -> Result<Box<dyn Rows>>;
}

/// An open transaction. Consumed by exactly one of `commit` or `rollback`.
pub trait Tx: Send {
    fn commit(self: Box<Self>) -> Result<()>;

    fn rollback(self: Box<Self>) -> Result<()>;
}

/// A forward-only cursor over a result set.
pub trait Rows: Send {
    /// Column names.
    fn columns(&self) -> &[String];

    /// Next row, or `None` once exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<Value>>>;

    /// Release the cursor.
    fn close(&mut self) -> Result<()>;
}

impl fmt::Debug for dyn Rows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rows")
            .field("columns", &self.columns())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for dyn Conn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Conn")
    }
}

impl fmt::Debug for dyn Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stmt")
            .field("num_input", &self.num_input())
            .finish()
    }
}

impl fmt::Debug for dyn Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Tx")
    }
}

/// Which optional connection capabilities a driver populates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnCapabilities {
    pub exec: bool,
    pub exec_context: bool,
    pub query: bool,
    pub query_context: bool,
    pub prepare_context: bool,
    pub begin_tx: bool,
}

impl ConnCapabilities {
    /// Probe every capability slot of `conn`.
    pub fn probe(conn: &mut dyn Conn) -> Self {
        Self {
            exec: conn.as_execer().is_some(),
            exec_context: conn.as_execer_context().is_some(),
            query: conn.as_queryer().is_some(),
            query_context: conn.as_queryer_context().is_some(),
            prepare_context: conn.as_prepare_context().is_some(),
            begin_tx: conn.as_begin_tx().is_some(),
        }
    }
}

/// Which optional statement capabilities a driver populates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StmtCapabilities {
    pub exec_context: bool,
    pub query_context: bool,
}

impl StmtCapabilities {
    /// Probe every capability slot of `stmt`.
    pub fn probe(stmt: &mut dyn Stmt) -> Self {
        Self {
            exec_context: stmt.as_exec_context().is_some(),
            query_context: stmt.as_query_context().is_some(),
        }
    }
}
