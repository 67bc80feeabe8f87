use super::stmt::WrappedStmt;
use super::tx::WrappedTx;
use crate::context::Context;
use crate::driver::{
    Conn, ConnBeginTx, ConnCapabilities, ConnPrepareContext, Execer, ExecerContext, Queryer,
    QueryerContext, Rows, Stmt, Tx,
};
use crate::error::{ContextError, Error, Result};
use crate::hook::{Args, Call, Method, SafeHook};
use crate::value::{ExecResult, IsolationLevel, NamedValue, TxOptions, Value, to_positional};
use std::fmt;
use std::sync::Arc;

/// A connection whose calls pass through the hook.
///
/// Exposes every optional capability regardless of what the real connection
/// implements. Context-aware calls fall back to the legacy form when the
/// real connection lacks them; legacy exec/query return [`Error::Skip`] when
/// the real connection lacks those too.
pub struct WrappedConn {
    conn: Box<dyn Conn>,
    hook: Arc<SafeHook>,
}

impl WrappedConn {
    pub(crate) fn new(conn: Box<dyn Conn>, hook: Arc<SafeHook>) -> Self {
        Self { conn, hook }
    }

    /// Capabilities of the real connection.
    pub fn capabilities(&mut self) -> ConnCapabilities {
        ConnCapabilities::probe(self.conn.as_mut())
    }

    /// Unwrap the real connection.
    pub fn into_inner(self) -> Box<dyn Conn> {
        self.conn
    }

    /// Prepare a statement, keeping `ctx` for its legacy exec/query calls.
    pub fn prepare_with(&mut self, ctx: &Context, query: &str) -> Result<WrappedStmt> {
        let stmt = match self.conn.as_prepare_context() {
            Some(preparer) => preparer.prepare_context(ctx, query)?,
            None => self.conn.prepare(query)?,
        };
        Ok(WrappedStmt::new(stmt, query, self.hook.clone(), ctx.clone()))
    }

    /// Begin a transaction under `ctx`.
    ///
    /// Without context-aware begin on the real connection, options other
    /// than the defaults are rejected. When `ctx` can be canceled and the
    /// context returned by `before` is done once the real begin returns, the
    /// transaction is rolled back and the context error returned.
    pub fn begin_with(&mut self, ctx: &Context, opts: &TxOptions) -> Result<WrappedTx> {
        if let Some(beginner) = self.conn.as_begin_tx() {
            let call = Call::new(Method::Begin, Method::Begin.as_str(), Args::Tx(opts));
            let (hooked, result) = self
                .hook
                .run(ctx, &call, |ctx| beginner.begin_tx(ctx, opts));
            return result.map(|tx| WrappedTx::new(tx, hooked, self.hook.clone()));
        }

        if opts.isolation != IsolationLevel::Default {
            return Err(Error::IsolationUnsupported);
        }
        if opts.read_only {
            return Err(Error::ReadOnlyUnsupported);
        }

        let conn = &mut self.conn;
        let call = Call::new(Method::Begin, Method::Begin.as_str(), Args::None);
        let (hooked, result) = self.hook.run(ctx, &call, |_| conn.begin());
        let tx = result?;

        // Only a cancellable caller context is checked, but expiry is read
        // from the context the hook handed back.
        if ctx.can_be_canceled() {
            if let Some(err) = hooked.err() {
                rollback_expired(tx, err);
                return Err(err.into());
            }
        }
        Ok(WrappedTx::new(tx, hooked, self.hook.clone()))
    }

    fn exec_legacy(&mut self, ctx: &Context, query: &str, args: &[Value]) -> Result<ExecResult> {
        let Some(execer) = self.conn.as_execer() else {
            return Err(Error::Skip);
        };
        let call = Call::new(Method::Exec, query, Args::Positional(args));
        let (_, result) = self.hook.run(ctx, &call, |_| execer.exec(query, args));
        result
    }

    fn query_legacy(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[Value],
    ) -> Result<Box<dyn Rows>> {
        let Some(queryer) = self.conn.as_queryer() else {
            return Err(Error::Skip);
        };
        let call = Call::new(Method::Query, query, Args::Positional(args));
        let (_, result) = self.hook.run(ctx, &call, |_| queryer.query(query, args));
        result
    }
}

impl fmt::Debug for WrappedConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedConn")
            .field("conn", &self.conn)
            .finish_non_exhaustive()
    }
}

fn rollback_expired(tx: Box<dyn Tx>, err: ContextError) {
    tracing::debug!(target: "sqlhook", error = %err, "context done after begin; rolling back");
    if let Err(rollback_err) = tx.rollback() {
        tracing::warn!(
            target: "sqlhook",
            error = %rollback_err,
            "rollback of expired transaction failed"
        );
    }
}

impl Conn for WrappedConn {
    fn prepare(&mut self, query: &str) -> Result<Box<dyn Stmt>> {
        let stmt = self.conn.prepare(query)?;
        Ok(Box::new(WrappedStmt::new(
            stmt,
            query,
            self.hook.clone(),
            Context::background(),
        )))
    }

    fn begin(&mut self) -> Result<Box<dyn Tx>> {
        let tx = self.begin_with(&Context::background(), &TxOptions::default())?;
        Ok(Box::new(tx))
    }

    fn close(&mut self) -> Result<()> {
        self.conn.close()
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        Some(self)
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        Some(self)
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        Some(self)
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        Some(self)
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        Some(self)
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        Some(self)
    }
}

impl Execer for WrappedConn {
    fn exec(&mut self, query: &str, args: &[Value]) -> Result<ExecResult> {
        self.exec_legacy(&Context::background(), query, args)
    }
}

impl ExecerContext for WrappedConn {
    fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<ExecResult> {
        if let Some(execer) = self.conn.as_execer_context() {
            let call = Call::new(Method::Exec, query, Args::Named(args));
            let (_, result) = self
                .hook
                .run(ctx, &call, |ctx| execer.exec_context(ctx, query, args));
            return result;
        }

        let values = to_positional(args)?;
        ctx.check()?;
        self.exec_legacy(ctx, query, &values)
    }
}

impl Queryer for WrappedConn {
    fn query(&mut self, query: &str, args: &[Value]) -> Result<Box<dyn Rows>> {
        self.query_legacy(&Context::background(), query, args)
    }
}

impl QueryerContext for WrappedConn {
    fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn Rows>> {
        if let Some(queryer) = self.conn.as_queryer_context() {
            let call = Call::new(Method::Query, query, Args::Named(args));
            let (_, result) = self
                .hook
                .run(ctx, &call, |ctx| queryer.query_context(ctx, query, args));
            return result;
        }

        let values = to_positional(args)?;
        ctx.check()?;
        self.query_legacy(ctx, query, &values)
    }
}

impl ConnPrepareContext for WrappedConn {
    fn prepare_context(&mut self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>> {
        let stmt = self.prepare_with(ctx, query)?;
        Ok(Box::new(stmt))
    }
}

impl ConnBeginTx for WrappedConn {
    fn begin_tx(&mut self, ctx: &Context, opts: &TxOptions) -> Result<Box<dyn Tx>> {
        let tx = self.begin_with(ctx, opts)?;
        Ok(Box::new(tx))
    }
}
