use super::config::TraceConfig;
use super::truncate_sql_bytes;
use super::types::{Call, Hook, Outcome};
use crate::context::{Context, elapsed};
use crate::error::Result;
use std::time::Duration;
use tracing::Level;

/// A `tracing`-based hook that emits one event per completed call.
///
/// Events go to target `sqlhook.sql` at the configured level; calls slower
/// than [`TraceConfig::slow_threshold`] go to `sqlhook.slow` at `WARN`.
/// The hook never alters the call.
#[derive(Debug, Clone, Default)]
pub struct TracingHook {
    config: TraceConfig,
}

impl TracingHook {
    /// Create a new hook with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: TraceConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    fn is_slow(&self, duration: Duration) -> bool {
        self.config
            .slow_threshold
            .is_some_and(|threshold| duration > threshold)
    }

    fn emit(&self, call: &Call<'_>, duration: Duration, result: &Result<Outcome>) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    _ => tracing::trace!($($field)*),
                }
            };
        }

        let query = self.truncate_sql(call.query);
        let args = self
            .config
            .log_args
            .then(|| serde_json::to_string(&call.args).ok())
            .flatten();
        let error = result.as_ref().err().map(tracing::field::display);

        if self.is_slow(duration) {
            tracing::warn!(
                target: "sqlhook.slow",
                method = %call.method,
                query = %query,
                arg_count = call.args.len(),
                elapsed = ?duration,
                args = args.as_deref(),
                error,
                "slow call"
            );
            return;
        }

        emit_at_level!(
            self.config.level,
            target: "sqlhook.sql",
            method = %call.method,
            query = %query,
            arg_count = call.args.len(),
            elapsed = ?duration,
            args = args.as_deref(),
            error,
            "call completed"
        );
    }
}

impl Hook for TracingHook {
    fn after(
        &self,
        ctx: &Context,
        call: &Call<'_>,
        result: &Result<Outcome>,
    ) -> Option<Result<Outcome>> {
        self.emit(call, elapsed(ctx), result);
        None
    }
}
