//! A fake driver whose capability slots are switched on per test, plus a hook
//! that records into the same event log.

#![allow(dead_code)]

use sqlhook::{
    Call, Conn, ConnBeginTx, ConnPrepareContext, Context, Driver, Error, ExecResult, Execer,
    ExecerContext, FnHook, MemoryRows, NamedValue, Outcome, Queryer, QueryerContext, Result, Rows,
    Stmt, StmtExecContext, StmtQueryContext, Tx, TxOptions, Value,
};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Queries starting with this prefix make the fake driver fail.
pub const FAILING: &str = "FAIL";

/// Which optional capabilities the fake populates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Caps {
    pub exec: bool,
    pub exec_context: bool,
    pub query: bool,
    pub query_context: bool,
    pub prepare_context: bool,
    pub begin_tx: bool,
    pub stmt_exec_context: bool,
    pub stmt_query_context: bool,
    /// Make `begin` and `begin_tx` fail.
    pub fail_begin: bool,
    pub fail_commit: bool,
    pub fail_rollback: bool,
}

impl Caps {
    /// Every capability.
    pub fn all() -> Self {
        Self {
            exec: true,
            exec_context: true,
            query: true,
            query_context: true,
            prepare_context: true,
            begin_tx: true,
            stmt_exec_context: true,
            stmt_query_context: true,
            ..Self::default()
        }
    }

    /// Only the mandatory surface.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Shared, ordered record of hook and driver events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
    deadlines: Arc<Mutex<Vec<Option<Instant>>>>,
}

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Events emitted by the fake driver itself.
    pub fn real_calls(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.starts_with("real:"))
            .collect()
    }

    /// Events emitted by the recording hook.
    pub fn hook_calls(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.starts_with("before:") || e.starts_with("after:"))
            .collect()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    /// Deadlines of the contexts the fake driver received, in call order.
    pub fn deadlines(&self) -> Vec<Option<Instant>> {
        self.deadlines.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
        self.deadlines.lock().unwrap().clear();
    }

    fn real(&self, what: &str, query: &str) -> Result<()> {
        self.real_unless(what, query.starts_with(FAILING))
    }

    fn real_unless(&self, what: &str, fail: bool) -> Result<()> {
        self.push(format!("real:{what}"));
        if fail {
            return Err(Error::driver(format!("{what} failed")));
        }
        Ok(())
    }

    fn saw(&self, ctx: &Context) {
        self.deadlines.lock().unwrap().push(ctx.deadline());
    }
}

/// A hook logging `before:<Method>` and `after:<Method>:<ok|err>`.
pub fn recording_hook(log: &EventLog) -> FnHook {
    let before_log = log.clone();
    let after_log = log.clone();
    FnHook::default()
        .on_before(move |ctx: &Context, call: &Call<'_>| {
            before_log.push(format!("before:{}", call.method));
            ctx.clone()
        })
        .on_after(move |_: &Context, call: &Call<'_>, result: &Result<Outcome>| {
            let status = if result.is_ok() { "ok" } else { "err" };
            after_log.push(format!("after:{}:{status}", call.method));
            None
        })
}

pub struct FakeDriver {
    caps: Caps,
    log: EventLog,
}

impl FakeDriver {
    pub fn new(caps: Caps, log: &EventLog) -> Self {
        Self {
            caps,
            log: log.clone(),
        }
    }

    /// An unwrapped connection, for comparing against the wrapped one.
    pub fn conn(&self) -> FakeConn {
        FakeConn {
            caps: self.caps,
            log: self.log.clone(),
        }
    }
}

impl Driver for FakeDriver {
    fn open(&self, name: &str) -> Result<Box<dyn Conn>> {
        self.log.real("open", name)?;
        Ok(Box::new(self.conn()))
    }
}

pub struct FakeConn {
    caps: Caps,
    log: EventLog,
}

fn one_row() -> Box<dyn Rows> {
    Box::new(MemoryRows::new(["id"]).with_row(vec![Value::Int(1)]))
}

impl Conn for FakeConn {
    fn prepare(&mut self, query: &str) -> Result<Box<dyn Stmt>> {
        self.log.real("prepare", query)?;
        Ok(Box::new(FakeStmt {
            caps: self.caps,
            log: self.log.clone(),
            query: query.to_owned(),
        }))
    }

    fn begin(&mut self) -> Result<Box<dyn Tx>> {
        self.log.real_unless("begin", self.caps.fail_begin)?;
        Ok(Box::new(FakeTx {
            caps: self.caps,
            log: self.log.clone(),
        }))
    }

    fn close(&mut self) -> Result<()> {
        self.log.real("close", "")
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        if self.caps.exec { Some(self) } else { None }
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        if self.caps.exec_context { Some(self) } else { None }
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        if self.caps.query { Some(self) } else { None }
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        if self.caps.query_context { Some(self) } else { None }
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        if self.caps.prepare_context { Some(self) } else { None }
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        if self.caps.begin_tx { Some(self) } else { None }
    }
}

impl Execer for FakeConn {
    fn exec(&mut self, query: &str, args: &[Value]) -> Result<ExecResult> {
        self.log.real("exec", query)?;
        Ok(ExecResult::affected(args.len() as u64))
    }
}

impl ExecerContext for FakeConn {
    fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<ExecResult> {
        self.log.saw(ctx);
        self.log.real("exec_context", query)?;
        Ok(ExecResult::affected(args.len() as u64))
    }
}

impl Queryer for FakeConn {
    fn query(&mut self, query: &str, _args: &[Value]) -> Result<Box<dyn Rows>> {
        self.log.real("query", query)?;
        Ok(one_row())
    }
}

impl QueryerContext for FakeConn {
    fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        _args: &[NamedValue],
    ) -> Result<Box<dyn Rows>> {
        self.log.saw(ctx);
        self.log.real("query_context", query)?;
        Ok(one_row())
    }
}

impl ConnPrepareContext for FakeConn {
    fn prepare_context(&mut self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>> {
        self.log.saw(ctx);
        self.log.real("prepare_context", query)?;
        Ok(Box::new(FakeStmt {
            caps: self.caps,
            log: self.log.clone(),
            query: query.to_owned(),
        }))
    }
}

impl ConnBeginTx for FakeConn {
    fn begin_tx(&mut self, ctx: &Context, _opts: &TxOptions) -> Result<Box<dyn Tx>> {
        self.log.saw(ctx);
        self.log.real_unless("begin_tx", self.caps.fail_begin)?;
        Ok(Box::new(FakeTx {
            caps: self.caps,
            log: self.log.clone(),
        }))
    }
}

pub struct FakeStmt {
    caps: Caps,
    log: EventLog,
    query: String,
}

impl Stmt for FakeStmt {
    fn close(&mut self) -> Result<()> {
        self.log.real("stmt_close", "")
    }

    fn num_input(&self) -> Option<usize> {
        Some(self.query.matches('$').count())
    }

    fn exec(&mut self, args: &[Value]) -> Result<ExecResult> {
        self.log.real("stmt_exec", &self.query)?;
        Ok(ExecResult::affected(args.len() as u64))
    }

    fn query(&mut self, _args: &[Value]) -> Result<Box<dyn Rows>> {
        self.log.real("stmt_query", &self.query)?;
        Ok(one_row())
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        if self.caps.stmt_exec_context { Some(self) } else { None }
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        if self.caps.stmt_query_context { Some(self) } else { None }
    }
}

impl StmtExecContext for FakeStmt {
    fn exec_context(&mut self, ctx: &Context, args: &[NamedValue]) -> Result<ExecResult> {
        self.log.saw(ctx);
        self.log.real("stmt_exec_context", &self.query)?;
        Ok(ExecResult::affected(args.len() as u64))
    }
}

impl StmtQueryContext for FakeStmt {
    fn query_context(&mut self, ctx: &Context, _args: &[NamedValue]) -> Result<Box<dyn Rows>> {
        self.log.saw(ctx);
        self.log.real("stmt_query_context", &self.query)?;
        Ok(one_row())
    }
}

pub struct FakeTx {
    caps: Caps,
    log: EventLog,
}

impl Tx for FakeTx {
    fn commit(self: Box<Self>) -> Result<()> {
        self.log.real_unless("commit", self.caps.fail_commit)
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        self.log.real_unless("rollback", self.caps.fail_rollback)
    }
}
