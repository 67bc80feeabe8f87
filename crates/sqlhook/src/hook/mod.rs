//! Hooks run before and after every intercepted driver call.
//!
//! This module provides:
//! - the [`Hook`] trait and the [`Call`]/[`Outcome`] types it sees
//! - closure-based hooks ([`FnHook`]) and chaining ([`CompositeHook`])
//! - call statistics ([`StatsHook`]) and `tracing` output ([`TracingHook`])
//!
//! Every hook handed to [`wrap`](crate::wrap) is guarded: a panic inside a
//! callback is caught and the call proceeds as if the hook were absent.
//!
//! # Example
//!
//! ```rust
//! use sqlhook::{elapsed, Call, Context, FnHook, Outcome, Result};
//!
//! let hook = FnHook::default().on_after(|ctx: &Context, call: &Call<'_>, result: &Result<Outcome>| {
//!     eprintln!("{} {} took {:?} (ok: {})", call.method, call.query, elapsed(ctx), result.is_ok());
//!     None
//! });
//! # let _ = hook;
//! ```

mod config;
mod hooks;
mod safe;
mod tracing_hook;
mod types;


pub use config::TraceConfig;
pub use hooks::{AfterFn, BeforeFn, CompositeHook, FnHook, HookStats, NoopHook, StatsHook};
pub use tracing_hook::TracingHook;
pub use types::{Args, Call, Hook, Method, Outcome, StatementKind};

pub(crate) use safe::SafeHook;

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Skip leading whitespace, comments and opening parens.
///
/// An unterminated comment swallows the rest of the text.
pub(crate) fn skip_sql_trivia(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        sql = if let Some(rest) = sql.strip_prefix("--") {
            rest.split_once('\n').map_or("", |(_, after)| after)
        } else if let Some(rest) = sql.strip_prefix("/*") {
            rest.split_once("*/").map_or("", |(_, after)| after)
        } else if let Some(rest) = sql.strip_prefix('(') {
            rest
        } else {
            return sql;
        };
    }
}

/// The identifier-like word `sql` starts with, empty if none.
pub(crate) fn leading_word(sql: &str) -> &str {
    let end = sql
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(sql.len());
    &sql[..end]
}

/// Byte offset just past the last parenthesis closed at nesting depth zero.
///
/// Parens inside single-quoted strings and double-quoted identifiers are
/// ignored. A doubled quote closes and reopens the literal.
pub(crate) fn end_of_last_group(sql: &str) -> usize {
    let mut depth = 0usize;
    let mut quote = None;
    let mut end = 0;
    for (i, c) in sql.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = i + 1;
                }
            }
            _ => {}
        }
    }
    end
}
