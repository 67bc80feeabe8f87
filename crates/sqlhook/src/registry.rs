//! Named registration of wrapped drivers.

use crate::driver::{Conn, Driver};
use crate::error::{Error, Result};
use crate::hook::Hook;
use crate::wrap::{WrappedConn, WrappedDriver, wrap_arc};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// A name → wrapped-driver table.
#[derive(Debug, Default)]
pub struct Registry {
    drivers: RwLock<BTreeMap<String, Arc<WrappedDriver>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `driver` with `hook` and register it under `name`.
    pub fn register<D, H>(&self, name: &str, driver: D, hook: H) -> Result<()>
    where
        D: Driver + 'static,
        H: Hook + 'static,
    {
        self.register_arc(name, Arc::new(driver), Arc::new(hook))
    }

    /// Register an already-shared driver and hook under `name`.
    pub fn register_arc(
        &self,
        name: &str,
        driver: Arc<dyn Driver>,
        hook: Arc<dyn Hook>,
    ) -> Result<()> {
        let mut drivers = self
            .drivers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if drivers.contains_key(name) {
            return Err(Error::DuplicateDriver(name.to_owned()));
        }
        drivers.insert(name.to_owned(), Arc::new(wrap_arc(driver, hook)));
        tracing::debug!(target: "sqlhook", driver = name, "registered wrapped driver");
        Ok(())
    }

    /// The wrapped driver registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<WrappedDriver>> {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownDriver(name.to_owned()))
    }

    /// Open a connection through the driver registered under `name`.
    pub fn open(&self, name: &str, dsn: &str) -> Result<WrappedConn> {
        self.get(name)?.connect(dsn)
    }

    /// Registered names, sorted.
    pub fn drivers(&self) -> Vec<String> {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

fn global() -> &'static Registry {
    static GLOBAL: OnceLock<Registry> = OnceLock::new();
    GLOBAL.get_or_init(Registry::new)
}

/// Register a wrapped driver in the process-wide registry.
pub fn register<D, H>(name: &str, driver: D, hook: H) -> Result<()>
where
    D: Driver + 'static,
    H: Hook + 'static,
{
    global().register(name, driver, hook)
}

/// Open a connection through the process-wide registry.
pub fn open(name: &str, dsn: &str) -> Result<Box<dyn Conn>> {
    Ok(Box::new(global().open(name, dsn)?))
}

/// Names in the process-wide registry, sorted.
pub fn drivers() -> Vec<String> {
    global().drivers()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::NoopHook;

    struct NeverOpens;

    impl Driver for NeverOpens {
        fn open(&self, name: &str) -> Result<Box<dyn Conn>> {
            Err(Error::driver(format!("cannot open {name}")))
        }
    }

    struct IdleDriver;

    struct IdleConn;

    impl Driver for IdleDriver {
        fn open(&self, _name: &str) -> Result<Box<dyn Conn>> {
            Ok(Box::new(IdleConn))
        }
    }

    impl Conn for IdleConn {
        fn prepare(&mut self, _query: &str) -> Result<Box<dyn crate::driver::Stmt>> {
            Err(Error::Skip)
        }

        fn begin(&mut self) -> Result<Box<dyn crate::driver::Tx>> {
            Err(Error::Skip)
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let registry = Registry::new();
        registry.register("fake", NeverOpens, NoopHook).unwrap();
        let err = registry.register("fake", NeverOpens, NoopHook).unwrap_err();
        assert!(matches!(err, Error::DuplicateDriver(ref name) if name == "fake"));
        assert_eq!(registry.drivers(), vec!["fake".to_string()]);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let registry = Registry::new();
        let err = registry.open("missing", "dsn").unwrap_err();
        assert!(matches!(err, Error::UnknownDriver(ref name) if name == "missing"));
    }

    #[test]
    fn open_errors_pass_through() {
        let registry = Registry::new();
        registry.register("fake", NeverOpens, NoopHook).unwrap();
        let err = registry.open("fake", "db").unwrap_err();
        assert!(err.is_driver());
        assert_eq!(err.to_string(), "cannot open db");
    }

    #[test]
    fn opened_connections_format_without_internals() {
        let registry = Registry::new();
        registry.register("idle", IdleDriver, NoopHook).unwrap();
        let conn = registry.open("idle", "db").unwrap();
        assert_eq!(format!("{conn:?}"), "WrappedConn { conn: Conn, .. }");

        register("global-idle", IdleDriver, NoopHook).unwrap();
        let conn = open("global-idle", "db").unwrap();
        assert_eq!(format!("{conn:?}"), "Conn");
    }

    #[test]
    fn drivers_are_sorted() {
        let registry = Registry::new();
        for name in ["mysql", "clickhouse", "postgres"] {
            registry.register(name, NeverOpens, NoopHook).unwrap();
        }
        assert_eq!(registry.drivers(), vec!["clickhouse", "mysql", "postgres"]);
    }

    #[test]
    fn global_registry_opens_by_name() {
        register("global-never-opens", NeverOpens, NoopHook).unwrap();
        assert!(drivers().contains(&"global-never-opens".to_string()));
        assert!(open("global-never-opens", "x").unwrap_err().is_driver());
        assert!(matches!(
            open("global-missing", "x").unwrap_err(),
            Error::UnknownDriver(_)
        ));
    }
}
