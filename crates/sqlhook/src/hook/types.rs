use crate::context::Context;
use crate::driver::{Rows, Tx};
use crate::error::Result;
use crate::value::{ExecResult, NamedValue, TxOptions, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The driver operation a hook is invoked around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Exec,
    Query,
    Begin,
    Commit,
    Rollback,
}

impl Method {
    /// Tag used in logs and as the query text of transaction calls.
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Exec => "Exec",
            Method::Query => "Query",
            Method::Begin => "Begin",
            Method::Commit => "Commit",
            Method::Rollback => "Rollback",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of the intercepted call, as the real driver receives them.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum Args<'a> {
    /// No payload (legacy begin, commit, rollback).
    None,
    /// Arguments of a context-aware call.
    Named(&'a [NamedValue]),
    /// Arguments of a legacy call.
    Positional(&'a [Value]),
    /// Options of a context-aware begin.
    Tx(&'a TxOptions),
}

impl Args<'_> {
    /// Number of bound arguments.
    pub fn len(&self) -> usize {
        match self {
            Args::Named(args) => args.len(),
            Args::Positional(args) => args.len(),
            Args::None | Args::Tx(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Description of one intercepted call.
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    pub method: Method,
    /// SQL text; for transaction calls this is the method tag.
    pub query: &'a str,
    pub args: Args<'a>,
}

impl<'a> Call<'a> {
    pub fn new(method: Method, query: &'a str, args: Args<'a>) -> Self {
        Self {
            method,
            query,
            args,
        }
    }

    /// Classify the query text.
    pub fn statement_kind(&self) -> StatementKind {
        StatementKind::from_sql(self.query)
    }
}

/// Successful result of an intercepted call.
#[derive(Debug)]
pub enum Outcome {
    /// Result of an exec.
    Exec(ExecResult),
    /// Cursor returned by a query.
    Rows(Box<dyn Rows>),
    /// Transaction returned by a begin.
    Tx(Box<dyn Tx>),
    /// Commit or rollback completed; no payload.
    Done,
}

impl Outcome {
    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Exec(_) => "exec result",
            Outcome::Rows(_) => "rows",
            Outcome::Tx(_) => "transaction",
            Outcome::Done => "no value",
        }
    }
}

/// Typed payloads that travel through a hook as an [`Outcome`].
pub(crate) trait OutcomeValue: Sized {
    const EXPECTED: &'static str;

    fn into_outcome(self) -> Outcome;

    fn from_outcome(outcome: Outcome) -> Option<Self>;
}

impl OutcomeValue for ExecResult {
    const EXPECTED: &'static str = "exec result";

    fn into_outcome(self) -> Outcome {
        Outcome::Exec(self)
    }

    fn from_outcome(outcome: Outcome) -> Option<Self> {
        match outcome {
            Outcome::Exec(result) => Some(result),
            _ => None,
        }
    }
}

impl OutcomeValue for Box<dyn Rows> {
    const EXPECTED: &'static str = "rows";

    fn into_outcome(self) -> Outcome {
        Outcome::Rows(self)
    }

    fn from_outcome(outcome: Outcome) -> Option<Self> {
        match outcome {
            Outcome::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

impl OutcomeValue for Box<dyn Tx> {
    const EXPECTED: &'static str = "transaction";

    fn into_outcome(self) -> Outcome {
        Outcome::Tx(self)
    }

    fn from_outcome(outcome: Outcome) -> Option<Self> {
        match outcome {
            Outcome::Tx(tx) => Some(tx),
            _ => None,
        }
    }
}

impl OutcomeValue for () {
    const EXPECTED: &'static str = "no value";

    fn into_outcome(self) -> Outcome {
        Outcome::Done
    }

    fn from_outcome(_outcome: Outcome) -> Option<Self> {
        Some(())
    }
}

/// Callbacks run around every intercepted driver call.
///
/// Both methods have pass-through defaults, so a hook that overrides
/// nothing only observes.
pub trait Hook: Send + Sync {
    /// Called right before the real driver call.
    ///
    /// The returned context is the one handed to the driver and to
    /// [`Hook::after`]. Derive it from `ctx` to keep cancellation and the
    /// start marker.
    fn before(&self, ctx: &Context, call: &Call<'_>) -> Context {
        let _ = call;
        ctx.clone()
    }

    /// Called right after the real driver call, whether it failed or not.
    ///
    /// Return `Some` to replace what the caller receives, `None` to pass the
    /// driver's result through.
    fn after(
        &self,
        ctx: &Context,
        call: &Call<'_>,
        result: &Result<Outcome>,
    ) -> Option<Result<Outcome>> {
        let _ = (ctx, call, result);
        None
    }
}

/// The kind of SQL statement being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    /// DDL, transaction control and anything unrecognised.
    Other,
}

impl StatementKind {
    /// Detect the statement kind from SQL text.
    ///
    /// Keywords must be whole words, so `SELECTED` is not a select. For CTEs
    /// (`WITH ...`) the kind is that of the statement following the CTE
    /// definitions; a CTE feeding a plain query is a select.
    pub fn from_sql(sql: &str) -> Self {
        use super::{leading_word, skip_sql_trivia};

        let body = skip_sql_trivia(sql);
        let word = leading_word(body);
        if word.eq_ignore_ascii_case("WITH") {
            return Self::after_ctes(body);
        }
        Self::from_keyword(word).unwrap_or(StatementKind::Other)
    }

    fn after_ctes(sql: &str) -> Self {
        use super::{end_of_last_group, leading_word, skip_sql_trivia};

        let main = skip_sql_trivia(&sql[end_of_last_group(sql)..]);
        match Self::from_keyword(leading_word(main)) {
            Some(kind @ (StatementKind::Insert | StatementKind::Update | StatementKind::Delete)) => {
                kind
            }
            _ => StatementKind::Select,
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        const KEYWORDS: [(&str, StatementKind); 4] = [
            ("SELECT", StatementKind::Select),
            ("INSERT", StatementKind::Insert),
            ("UPDATE", StatementKind::Update),
            ("DELETE", StatementKind::Delete),
        ];
        KEYWORDS
            .iter()
            .find(|(keyword, _)| word.eq_ignore_ascii_case(keyword))
            .map(|&(_, kind)| kind)
    }
}
