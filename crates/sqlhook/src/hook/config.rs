use std::time::Duration;
use tracing::Level;

/// Configuration for [`TracingHook`](super::TracingHook).
///
/// Defaults: events at `DEBUG`, SQL truncated to 200 bytes, no slow-call
/// threshold, arguments not logged.
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Level of the per-call event.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Calls slower than this are emitted at `WARN` on `sqlhook.slow`.
    pub slow_threshold: Option<Duration>,
    /// Include the bound arguments, rendered as JSON.
    pub log_args: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
            slow_threshold: None,
            log_args: false,
        }
    }
}

impl TraceConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the event level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn with_max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Set the slow-call threshold.
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    /// Log bound arguments.
    ///
    /// Arguments may contain personal data; keep this off in production.
    pub fn with_args(mut self, log_args: bool) -> Self {
        self.log_args = log_args;
        self
    }
}
