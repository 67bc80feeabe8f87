//! Decorators that route a real driver's calls through a [`Hook`].
//!
//! [`wrap`] turns any [`Driver`] into a [`WrappedDriver`]. Connections,
//! statements and transactions obtained from it are wrapped in turn, and
//! each exec, query, begin, commit and rollback runs as `before`, exactly
//! one real call, then `after`.

mod conn;
mod stmt;
mod tx;

pub use conn::WrappedConn;
pub use stmt::WrappedStmt;
pub use tx::WrappedTx;

use crate::driver::{Conn, ConnCapabilities, Driver};
use crate::error::Result;
use crate::hook::{Hook, SafeHook};
use std::sync::Arc;
use tracing::Level;

/// Wrap `driver` so that every call goes through `hook`.
pub fn wrap<D, H>(driver: D, hook: H) -> WrappedDriver
where
    D: Driver + 'static,
    H: Hook + 'static,
{
    wrap_arc(Arc::new(driver), Arc::new(hook))
}

/// Like [`wrap`], for a driver and hook that are already shared.
pub fn wrap_arc(driver: Arc<dyn Driver>, hook: Arc<dyn Hook>) -> WrappedDriver {
    WrappedDriver {
        driver,
        hook: Arc::new(SafeHook::new(hook)),
    }
}

/// A driver whose connections are wrapped.
///
/// Opening a connection invokes no hook.
#[derive(Clone)]
pub struct WrappedDriver {
    driver: Arc<dyn Driver>,
    hook: Arc<SafeHook>,
}

impl WrappedDriver {
    /// Open a wrapped connection. Errors from the real driver pass through.
    pub fn connect(&self, name: &str) -> Result<WrappedConn> {
        let conn = self.driver.open(name)?;
        let mut conn = WrappedConn::new(conn, self.hook.clone());
        if tracing::enabled!(target: "sqlhook", Level::DEBUG) {
            let caps: ConnCapabilities = conn.capabilities();
            tracing::debug!(target: "sqlhook", capabilities = ?caps, "opened wrapped connection");
        }
        Ok(conn)
    }
}

impl Driver for WrappedDriver {
    fn open(&self, name: &str) -> Result<Box<dyn Conn>> {
        Ok(Box::new(self.connect(name)?))
    }
}

impl std::fmt::Debug for WrappedDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedDriver").finish_non_exhaustive()
    }
}
