//! Restricted `${NAME}` / `$NAME` environment-variable substitution for
//! configuration string leaves.
//!
//! Deliberately narrow: no default-value syntax, no command substitution, no
//! nesting. An unresolved variable is a [`Kind::Config`] error, not a silent
//! empty string.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::{err_at, Result};

lazy_static! {
    // matches ${NAME} or $NAME, NAME restricted to [A-Za-z_][A-Za-z0-9_]*
    static ref VAR_RE: Regex =
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap();
}

/// Substitute `${NAME}`/`$NAME` occurrences in `text` using `lookup`.
/// `lookup` is injected so tests don't depend on real process environment.
pub fn substitute<F>(text: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut first_err: Option<String> = None;
    let replaced = VAR_RE.replace_all(text, |caps: &Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .expect("regex guarantees one group matches")
            .as_str();
        match lookup(name) {
            Some(val) => val,
            None => {
                if first_err.is_none() {
                    first_err = Some(name.to_string());
                }
                String::new()
            }
        }
    });

    match first_err {
        Some(name) => err_at!(Config, msg: "unresolved environment variable ${{{}}}", name),
        None => Ok(replaced.into_owned()),
    }
}

/// Substitute against the real process environment.
pub fn substitute_env(text: &str) -> Result<String> {
    substitute(text, |name| std::env::var(name).ok())
}

#[cfg(test)]
#[path = "envsubst_test.rs"]
mod envsubst_test;
