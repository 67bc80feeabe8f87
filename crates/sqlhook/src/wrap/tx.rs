use crate::context::Context;
use crate::driver::Tx;
use crate::error::Result;
use crate::hook::{Args, Call, Method, SafeHook};
use std::fmt;
use std::sync::Arc;

/// A transaction whose commit and rollback pass through the hook.
///
/// Carries the context returned by the `before` hook of the begin call.
pub struct WrappedTx {
    tx: Box<dyn Tx>,
    ctx: Context,
    hook: Arc<SafeHook>,
}

impl WrappedTx {
    pub(crate) fn new(tx: Box<dyn Tx>, ctx: Context, hook: Arc<SafeHook>) -> Self {
        Self { tx, ctx, hook }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    fn finish(self, method: Method, op: impl FnOnce(Box<dyn Tx>) -> Result<()>) -> Result<()> {
        let Self { tx, ctx, hook } = self;
        let call = Call::new(method, method.as_str(), Args::None);
        let (_, result) = hook.run(&ctx, &call, |_| op(tx));
        result
    }
}

impl fmt::Debug for WrappedTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedTx").finish_non_exhaustive()
    }
}

impl Tx for WrappedTx {
    fn commit(self: Box<Self>) -> Result<()> {
        (*self).finish(Method::Commit, |tx| tx.commit())
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        (*self).finish(Method::Rollback, |tx| tx.rollback())
    }
}
