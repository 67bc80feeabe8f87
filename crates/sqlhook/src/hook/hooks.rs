use super::types::{Call, Hook, Method, Outcome, StatementKind};
use crate::context::{Context, elapsed};
use crate::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl Hook for NoopHook {}

/// Boxed `before` callback for [`FnHook`].
pub type BeforeFn = Box<dyn Fn(&Context, &Call<'_>) -> Context + Send + Sync>;

/// Boxed `after` callback for [`FnHook`].
pub type AfterFn =
    Box<dyn Fn(&Context, &Call<'_>, &Result<Outcome>) -> Option<Result<Outcome>> + Send + Sync>;

/// A hook built from two optional closures. A missing closure is a no-op.
#[derive(Default)]
pub struct FnHook {
    before: Option<BeforeFn>,
    after: Option<AfterFn>,
}

impl FnHook {
    /// Create a hook from optional callbacks.
    pub fn new(before: Option<BeforeFn>, after: Option<AfterFn>) -> Self {
        Self { before, after }
    }

    /// Set the `before` callback.
    pub fn on_before<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context, &Call<'_>) -> Context + Send + Sync + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    /// Set the `after` callback.
    pub fn on_after<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context, &Call<'_>, &Result<Outcome>) -> Option<Result<Outcome>>
            + Send
            + Sync
            + 'static,
    {
        self.after = Some(Box::new(f));
        self
    }
}

impl Hook for FnHook {
    fn before(&self, ctx: &Context, call: &Call<'_>) -> Context {
        match &self.before {
            Some(f) => f(ctx, call),
            None => ctx.clone(),
        }
    }

    fn after(
        &self,
        ctx: &Context,
        call: &Call<'_>,
        result: &Result<Outcome>,
    ) -> Option<Result<Outcome>> {
        self.after.as_ref().and_then(|f| f(ctx, call, result))
    }
}

/// A composite hook that runs multiple hooks in sequence.
///
/// `before` threads the context through every hook in order. `after` hands
/// each hook the result as left by the previous one, so later hooks see
/// earlier replacements.
pub struct CompositeHook {
    hooks: Vec<Arc<dyn Hook>>,
}

impl CompositeHook {
    /// Create an empty composite hook.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Add a hook.
    #[allow(clippy::should_implement_trait)]
    pub fn add<H: Hook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Add an Arc-wrapped hook.
    pub fn add_arc(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Number of hooks in the chain.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl Default for CompositeHook {
    fn default() -> Self {
        Self::new()
    }
}

impl Hook for CompositeHook {
    fn before(&self, ctx: &Context, call: &Call<'_>) -> Context {
        self.hooks
            .iter()
            .fold(ctx.clone(), |current, hook| hook.before(&current, call))
    }

    fn after(
        &self,
        ctx: &Context,
        call: &Call<'_>,
        result: &Result<Outcome>,
    ) -> Option<Result<Outcome>> {
        let mut replaced: Option<Result<Outcome>> = None;
        for hook in &self.hooks {
            let current = replaced.as_ref().unwrap_or(result);
            if let Some(next) = hook.after(ctx, call, current) {
                replaced = Some(next);
            }
        }
        replaced
    }
}

/// A hook that tracks call statistics.
///
/// Durations come from the start marker stamped on the context, so they
/// cover the real driver call plus any `before` hooks that ran after this
/// one in a chain.
#[derive(Debug, Default)]
pub struct StatsHook {
    total_calls: AtomicU64,
    failed_calls: AtomicU64,
    total_duration_nanos: AtomicU64,
    exec_count: AtomicU64,
    query_count: AtomicU64,
    begin_count: AtomicU64,
    commit_count: AtomicU64,
    rollback_count: AtomicU64,
    select_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    max_duration_nanos: AtomicU64,
    slowest_query: Mutex<Option<String>>,
}

/// Collected call statistics.
#[derive(Debug, Clone, Default)]
pub struct HookStats {
    /// Total number of intercepted calls.
    pub total_calls: u64,
    /// Calls whose final result was an error.
    pub failed_calls: u64,
    /// Total time spent in intercepted calls.
    pub total_duration: Duration,
    pub exec_count: u64,
    pub query_count: u64,
    pub begin_count: u64,
    pub commit_count: u64,
    pub rollback_count: u64,
    /// SELECT statements among exec/query calls.
    pub select_count: u64,
    /// INSERT statements among exec/query calls.
    pub insert_count: u64,
    /// UPDATE statements among exec/query calls.
    pub update_count: u64,
    /// DELETE statements among exec/query calls.
    pub delete_count: u64,
    /// Slowest call duration.
    pub max_duration: Duration,
    /// Query text of the slowest call.
    pub slowest_query: Option<String>,
}

impl StatsHook {
    /// Create a new stats hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> HookStats {
        HookStats {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            exec_count: self.exec_count.load(Ordering::Relaxed),
            query_count: self.query_count.load(Ordering::Relaxed),
            begin_count: self.begin_count.load(Ordering::Relaxed),
            commit_count: self.commit_count.load(Ordering::Relaxed),
            rollback_count: self.rollback_count.load(Ordering::Relaxed),
            select_count: self.select_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
            slowest_query: self.lock_slowest().clone(),
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        for counter in [
            &self.total_calls,
            &self.failed_calls,
            &self.total_duration_nanos,
            &self.exec_count,
            &self.query_count,
            &self.begin_count,
            &self.commit_count,
            &self.rollback_count,
            &self.select_count,
            &self.insert_count,
            &self.update_count,
            &self.delete_count,
            &self.max_duration_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        *self.lock_slowest() = None;
    }

    /// Record one completed call.
    pub fn record(&self, call: &Call<'_>, duration: Duration, failed: bool) {
        let duration_nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        self.total_calls.fetch_add(1, Ordering::Relaxed);
        let prev_total = self
            .total_duration_nanos
            .fetch_add(duration_nanos, Ordering::Relaxed);
        if prev_total.checked_add(duration_nanos).is_none() {
            // Saturate instead of wrapping.
            self.total_duration_nanos.store(u64::MAX, Ordering::Relaxed);
        }

        let method_counter = match call.method {
            Method::Exec => &self.exec_count,
            Method::Query => &self.query_count,
            Method::Begin => &self.begin_count,
            Method::Commit => &self.commit_count,
            Method::Rollback => &self.rollback_count,
        };
        method_counter.fetch_add(1, Ordering::Relaxed);

        if matches!(call.method, Method::Exec | Method::Query) {
            let kind_counter = match call.statement_kind() {
                StatementKind::Select => Some(&self.select_count),
                StatementKind::Insert => Some(&self.insert_count),
                StatementKind::Update => Some(&self.update_count),
                StatementKind::Delete => Some(&self.delete_count),
                StatementKind::Other => None,
            };
            if let Some(counter) = kind_counter {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }

        if failed {
            self.failed_calls.fetch_add(1, Ordering::Relaxed);
        }

        // Only the caller that raises the max records the slowest query.
        let mut current_max = self.max_duration_nanos.load(Ordering::Relaxed);
        while duration_nanos > current_max {
            match self.max_duration_nanos.compare_exchange_weak(
                current_max,
                duration_nanos,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    *self.lock_slowest() = Some(call.query.to_string());
                    break;
                }
                Err(updated) => current_max = updated,
            }
        }
    }

    fn lock_slowest(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slowest_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Hook for StatsHook {
    fn after(
        &self,
        ctx: &Context,
        call: &Call<'_>,
        result: &Result<Outcome>,
    ) -> Option<Result<Outcome>> {
        self.record(call, elapsed(ctx), result.is_err());
        None
    }
}
