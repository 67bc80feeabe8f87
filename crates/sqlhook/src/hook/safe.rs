use super::types::{Call, Hook, Outcome, OutcomeValue};
use crate::context::Context;
use crate::error::{Error, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Runs a user hook with panics contained.
///
/// The context is stamped with a start marker before `before` runs. If a
/// callback panics, the call continues with the stamped context or the
/// driver's own result.
pub(crate) struct SafeHook {
    inner: Arc<dyn Hook>,
}

impl SafeHook {
    pub(crate) fn new(inner: Arc<dyn Hook>) -> Self {
        Self { inner }
    }

    pub(crate) fn before(&self, ctx: &Context, call: &Call<'_>) -> Context {
        let stamped = ctx.with_start_time(Instant::now());
        match panic::catch_unwind(AssertUnwindSafe(|| self.inner.before(&stamped, call))) {
            Ok(next) => next,
            Err(payload) => {
                report_panic("before", call, payload.as_ref());
                stamped
            }
        }
    }

    pub(crate) fn after(
        &self,
        ctx: &Context,
        call: &Call<'_>,
        result: Result<Outcome>,
    ) -> Result<Outcome> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.inner.after(ctx, call, &result))) {
            Ok(Some(replaced)) => replaced,
            Ok(None) => result,
            Err(payload) => {
                report_panic("after", call, payload.as_ref());
                result
            }
        }
    }

    /// `before`, exactly one real call, then `after`.
    ///
    /// Returns the context produced by `before` along with the (possibly
    /// replaced) result.
    pub(crate) fn run<T: OutcomeValue>(
        &self,
        ctx: &Context,
        call: &Call<'_>,
        op: impl FnOnce(&Context) -> Result<T>,
    ) -> (Context, Result<T>) {
        let ctx = self.before(ctx, call);
        let result = op(&ctx).map(T::into_outcome);
        let result = self.after(&ctx, call, result).and_then(|outcome| {
            T::from_outcome(outcome).ok_or(Error::OutcomeMismatch {
                method: call.method,
                expected: T::EXPECTED,
            })
        });
        (ctx, result)
    }
}

fn report_panic(stage: &'static str, call: &Call<'_>, payload: &(dyn Any + Send)) {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>");
    tracing::warn!(
        target: "sqlhook",
        stage,
        method = %call.method,
        panic = message,
        "hook panicked; continuing without it"
    );
}
