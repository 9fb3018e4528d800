//! Crate-wide error taxonomy and the [`err_at`] context macro.
//!
//! Every fallible call site in this crate routes its result through [`err_at`]
//! rather than threading ad-hoc `.map_err` chains: the macro tags the failure
//! with one of the [`Kind`] variants and records the call site, matching the
//! error taxonomy of the append-transaction specification this crate
//! implements.

use std::{fmt, result};

/// The error taxonomy. One variant per failure class the append transaction
/// engine can surface; see each variant's doc comment for the condition that
/// produces it.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Kind {
    /// Configuration validation or merge failure, surfaced before any I/O.
    Config,
    /// Lock contention on the co-located `.lock` file.
    TargetLocked,
    /// Slice polling exceeded its timeout.
    SliceUnavailable,
    /// A slice is missing variables the cube schema requires.
    SliceSchema,
    /// A slice's append-axis size does not match the cube's chunk size.
    SliceShape,
    /// `append_step` sign or delta constraint violated.
    AppendOrder,
    /// Any filesystem operation failure (path + op attached in the message).
    Io,
    /// Inconsistency detected by the journal/rollback engine.
    Transaction,
    /// Cooperative cancellation.
    Cancelled,
    /// Invariant violation; should never occur in production.
    Internal,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Kind::Config => "ConfigError",
            Kind::TargetLocked => "TargetLocked",
            Kind::SliceUnavailable => "SliceUnavailable",
            Kind::SliceSchema => "SliceSchemaError",
            Kind::SliceShape => "SliceShapeError",
            Kind::AppendOrder => "AppendOrderError",
            Kind::Io => "IoError",
            Kind::Transaction => "TransactionError",
            Kind::Cancelled => "Cancelled",
            Kind::Internal => "InternalError",
        };
        write!(f, "{}", s)
    }
}

/// Crate-wide error type. Carries a [`Kind`], a human message, the call site
/// that raised it, and any rollback-failure notes attached while unwinding a
/// transaction (the first user-visible error stays the root cause; rollback
/// problems are appended as notes, never replace it).
#[derive(Debug, Clone)]
pub struct Error {
    kind: Kind,
    message: String,
    at: &'static str,
    notes: Vec<String>,
}

impl Error {
    pub fn new(kind: Kind, message: String, at: &'static str) -> Error {
        Error {
            kind,
            message,
            at,
            notes: Vec::new(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_kind(&self, kind: Kind) -> bool {
        self.kind == kind
    }

    /// Attach a rollback-failure (or other contextual) note without losing
    /// the original error as the primary cause.
    pub fn with_note(mut self, note: impl Into<String>) -> Error {
        self.notes.push(note.into());
        self
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.at, self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Tag a `Result`, or construct one from a formatted message, with an error
/// [`Kind`] and the call site.
///
/// ```ignore
/// err_at!(Io, std::fs::read(path))?;
/// err_at!(Io, std::fs::read(path), "reading {:?}", path)?;
/// err_at!(Internal, msg: "unreachable state {}", state)?;
/// ```
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+ $(,)?) => {{
        let at = concat!(file!(), ":", line!());
        Err($crate::Error::new($crate::Kind::$v, format!($($arg),+), at))
    }};
    ($v:ident, $e:expr $(,)?) => {{
        let at = concat!(file!(), ":", line!());
        match $e {
            Ok(val) => Ok(val),
            Err(err) => Err($crate::Error::new($crate::Kind::$v, err.to_string(), at)),
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+ $(,)?) => {{
        let at = concat!(file!(), ":", line!());
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let msg = format!($($arg),+);
                Err($crate::Error::new($crate::Kind::$v, format!("{}: {}", msg, err), at))
            }
        }
    }};
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
