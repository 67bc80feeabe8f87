//! Benchmark the per-call cost of routing through a hook.
//!
//! A minimal in-process driver is called directly, through a wrapper with a
//! no-op hook, and through a wrapper with `StatsHook`, so the difference is
//! the dispatch overhead alone.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlhook::{
    CompositeHook, Conn, Context, Driver, ExecResult, ExecerContext, NamedValue, NoopHook, Result,
    StatsHook, Stmt, Tx, args, wrap,
};

struct NullDriver;

struct NullConn;

struct NullTx;

impl Driver for NullDriver {
    fn open(&self, _name: &str) -> Result<Box<dyn Conn>> {
        Ok(Box::new(NullConn))
    }
}

impl Conn for NullConn {
    fn prepare(&mut self, _query: &str) -> Result<Box<dyn Stmt>> {
        Err(sqlhook::Error::Skip)
    }

    fn begin(&mut self) -> Result<Box<dyn Tx>> {
        Ok(Box::new(NullTx))
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        Some(self)
    }
}

impl ExecerContext for NullConn {
    fn exec_context(
        &mut self,
        _ctx: &Context,
        _query: &str,
        args: &[NamedValue],
    ) -> Result<ExecResult> {
        Ok(ExecResult::affected(args.len() as u64))
    }
}

impl Tx for NullTx {
    fn commit(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

const QUERY: &str = "UPDATE accounts SET balance = balance - $1 WHERE id = $2";

fn bench_exec(c: &mut Criterion) {
    let mut group = c.benchmark_group("hook_overhead/exec_context");
    let ctx = Context::background();
    let params = args([100, 7]);

    let mut raw = NullConn;
    group.bench_function("unwrapped", |b| {
        b.iter(|| black_box(raw.exec_context(&ctx, black_box(QUERY), &params)))
    });

    let mut noop = wrap(NullDriver, NoopHook).connect("null").unwrap();
    group.bench_function("noop_hook", |b| {
        b.iter(|| black_box(noop.exec_context(&ctx, black_box(QUERY), &params)))
    });

    let mut stats = wrap(NullDriver, StatsHook::new()).connect("null").unwrap();
    group.bench_function("stats_hook", |b| {
        b.iter(|| black_box(stats.exec_context(&ctx, black_box(QUERY), &params)))
    });

    group.finish();
}

fn bench_composite_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("hook_overhead/composite_depth");
    let ctx = Context::background();
    let params = args([1]);

    for depth in [1, 4, 16] {
        let hook = (0..depth).fold(CompositeHook::new(), |hook, _| hook.add(StatsHook::new()));
        let mut conn = wrap(NullDriver, hook).connect("null").unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &params, |b, params| {
            b.iter(|| black_box(conn.exec_context(&ctx, QUERY, params)))
        });
    }

    group.finish();
}

fn bench_begin_commit(c: &mut Criterion) {
    let mut conn = wrap(NullDriver, NoopHook).connect("null").unwrap();
    c.bench_function("hook_overhead/begin_commit", |b| {
        b.iter(|| {
            let tx = conn.begin().unwrap();
            black_box(tx.commit())
        })
    });
}

criterion_group!(benches, bench_exec, bench_composite_depth, bench_begin_commit);
criterion_main!(benches);
