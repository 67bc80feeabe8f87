use crate::context::Context;
use crate::driver::{Rows, Stmt, StmtCapabilities, StmtExecContext, StmtQueryContext};
use crate::error::Result;
use crate::hook::{Args, Call, Method, SafeHook};
use crate::value::{ExecResult, NamedValue, Value, to_positional};
use std::fmt;
use std::sync::Arc;

/// A prepared statement whose executions pass through the hook.
///
/// Legacy `exec`/`query` run under the statement's current context: the one
/// it was prepared with, then whatever the last `before` returned or the
/// last context-aware fallback supplied.
pub struct WrappedStmt {
    stmt: Box<dyn Stmt>,
    query: String,
    hook: Arc<SafeHook>,
    ctx: Context,
}

impl WrappedStmt {
    pub(crate) fn new(
        stmt: Box<dyn Stmt>,
        query: &str,
        hook: Arc<SafeHook>,
        ctx: Context,
    ) -> Self {
        Self {
            stmt,
            query: query.to_owned(),
            hook,
            ctx,
        }
    }

    /// The SQL text this statement was prepared from.
    pub fn query_text(&self) -> &str {
        &self.query
    }

    /// The context legacy calls currently run under.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn capabilities(&mut self) -> StmtCapabilities {
        StmtCapabilities::probe(self.stmt.as_mut())
    }
}

impl fmt::Debug for WrappedStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedStmt")
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl Stmt for WrappedStmt {
    fn close(&mut self) -> Result<()> {
        self.stmt.close()
    }

    fn num_input(&self) -> Option<usize> {
        self.stmt.num_input()
    }

    fn exec(&mut self, args: &[Value]) -> Result<ExecResult> {
        let call = Call::new(Method::Exec, &self.query, Args::Positional(args));
        let stmt = &mut self.stmt;
        let (ctx, result) = self.hook.run(&self.ctx, &call, |_| stmt.exec(args));
        self.ctx = ctx;
        result
    }

    fn query(&mut self, args: &[Value]) -> Result<Box<dyn Rows>> {
        let call = Call::new(Method::Query, &self.query, Args::Positional(args));
        let stmt = &mut self.stmt;
        let (ctx, result) = self.hook.run(&self.ctx, &call, |_| stmt.query(args));
        self.ctx = ctx;
        result
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        Some(self)
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        Some(self)
    }
}

impl StmtExecContext for WrappedStmt {
    fn exec_context(&mut self, ctx: &Context, args: &[NamedValue]) -> Result<ExecResult> {
        if let Some(execer) = self.stmt.as_exec_context() {
            let call = Call::new(Method::Exec, &self.query, Args::Named(args));
            let (_, result) = self
                .hook
                .run(ctx, &call, |ctx| execer.exec_context(ctx, args));
            return result;
        }

        let values = to_positional(args)?;
        ctx.check()?;
        self.ctx = ctx.clone();
        self.exec(&values)
    }
}

impl StmtQueryContext for WrappedStmt {
    fn query_context(&mut self, ctx: &Context, args: &[NamedValue]) -> Result<Box<dyn Rows>> {
        if let Some(queryer) = self.stmt.as_query_context() {
            let call = Call::new(Method::Query, &self.query, Args::Named(args));
            let (_, result) = self
                .hook
                .run(ctx, &call, |ctx| queryer.query_context(ctx, args));
            return result;
        }

        let values = to_positional(args)?;
        ctx.check()?;
        self.ctx = ctx.clone();
        self.query(&values)
    }
}
