//! Values exchanged with a driver: arguments, exec results and transaction options.

use crate::driver::Rows;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A value a driver accepts as an argument or produces in a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// An argument as passed to context-aware calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    /// Parameter name, if the caller bound it by name.
    pub name: Option<String>,
    /// 1-based position in the argument list.
    pub ordinal: usize,
    pub value: Value,
}

impl NamedValue {
    /// An unnamed argument at `ordinal` (1-based).
    pub fn positional(ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: None,
            ordinal,
            value: value.into(),
        }
    }

    /// An argument bound by name.
    pub fn named(name: impl Into<String>, ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            ordinal,
            value: value.into(),
        }
    }

    /// Whether this argument carries a non-empty name.
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.is_empty())
    }
}

/// Build unnamed arguments with ordinals starting at 1.
pub fn args<I, V>(values: I) -> Vec<NamedValue>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| NamedValue::positional(i + 1, v))
        .collect()
}

/// Strip argument names for a legacy call.
///
/// Fails with [`Error::NamedParamsUnsupported`] if any argument carries a
/// name, since a legacy call has no way to bind it.
pub fn to_positional(named: &[NamedValue]) -> Result<Vec<Value>> {
    named
        .iter()
        .map(|param| {
            if param.has_name() {
                Err(Error::NamedParamsUnsupported)
            } else {
                Ok(param.value.clone())
            }
        })
        .collect()
}

/// Outcome of an exec call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Rows affected, if the driver reports it.
    pub rows_affected: Option<u64>,
    /// Last inserted id, if the driver reports it.
    pub last_insert_id: Option<i64>,
}

impl ExecResult {
    /// A result reporting `n` affected rows.
    pub fn affected(n: u64) -> Self {
        Self {
            rows_affected: Some(n),
            last_insert_id: None,
        }
    }

    /// Attach a last-insert id.
    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Whatever the driver uses by default.
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    WriteCommitted,
    RepeatableRead,
    Snapshot,
    Serializable,
    Linearizable,
}

/// Options for beginning a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOptions {
    pub isolation: IsolationLevel,
    pub read_only: bool,
}

impl TxOptions {
    /// Default options (driver isolation level, read-write).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the isolation level.
    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = level;
        self
    }

    /// Request a read-only transaction.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// In-memory [`Rows`], handy for hooks that substitute a result set.
#[derive(Debug, Clone, Default)]
pub struct MemoryRows {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
    closed: bool,
}

impl MemoryRows {
    /// Create a result set with the given column names and no rows.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: VecDeque::new(),
            closed: false,
        }
    }

    /// Append a row.
    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.rows.push_back(row);
        self
    }
}

impl Rows for MemoryRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        if self.closed {
            return Ok(None);
        }
        Ok(self.rows.pop_front())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }
}
