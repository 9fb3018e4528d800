//! Deferred attribute-expression evaluation (§4.6): a narrow, closed
//! vocabulary of `{{ fn(array, "ref") }}` calls evaluated against a
//! freshly-written cube view, never a general scripting runtime (§9).
//!
//! Grounded on the same restrained-expression-surface idea as
//! `config::envsubst`'s `${NAME}` substitution: a single regex finds call
//! sites, a closed set of named functions resolves them, anything else is a
//! `ConfigError` rather than silently passed through.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::slice::Dataset;
use crate::{err_at, Result};

lazy_static! {
    static ref CALL: Regex =
        Regex::new(r#"\{\{\s*(lower_bound|upper_bound)\(\s*([A-Za-z0-9_]+)\s*,\s*"(lower|upper|center)"\s*\)\s*\}\}"#)
            .expect("static regex is valid");
}

/// Evaluate every `{{ ... }}` call embedded in `attrs`' string values against
/// `view`, leaving non-string and expression-free values untouched.
pub fn evaluate(attrs: Map<String, Value>, view: &Dataset) -> Result<Map<String, Value>> {
    attrs
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) if CALL.is_match(&s) => Ok((k, Value::String(substitute(&s, view)?))),
            other => Ok((k, other)),
        })
        .collect()
}

fn substitute(input: &str, view: &Dataset) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for caps in CALL.captures_iter(input) {
        let whole = caps.get(0).expect("capture 0 always present");
        out.push_str(&input[last..whole.start()]);
        let value = call(&caps[1], &caps[2], &caps[3], view)?;
        out.push_str(&format_bound(value));
        last = whole.end();
    }
    out.push_str(&input[last..]);
    Ok(out)
}

fn format_bound(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// `lower_bound(array, ref)`/`upper_bound(array, ref)`: resolve `ref` to one
/// element of `array`'s values (`"lower"` the first, `"upper"` the last,
/// `"center"` the midpoint), then report that element's lower or upper edge
/// — the element offset by half the array's average step, or the element
/// itself for a single-valued array.
fn call(func: &str, array: &str, reference: &str, view: &Dataset) -> Result<f64> {
    let var = match view.variables.get(array) {
        Some(v) => v,
        None => return err_at!(Config, msg: "attribute expression references unknown variable {:?}", array),
    };
    let values: Vec<f64> = var.data.iter().copied().collect();
    if values.is_empty() {
        return err_at!(Config, msg: "attribute expression: variable {:?} has no values", array);
    }
    let idx = match reference {
        "lower" => 0,
        "upper" => values.len() - 1,
        "center" => values.len() / 2,
        other => return err_at!(Config, msg: "attribute expression: unknown reference {:?}", other),
    };
    let value = values[idx];
    let half = half_step(&values);
    Ok(match func {
        "lower_bound" => value - half,
        "upper_bound" => value + half,
        other => return err_at!(Internal, msg: "attribute expression: unreachable function {:?}", other),
    })
}

/// Half the array's average consecutive step, or `0.0` for a single-valued
/// array (its only element is its own lower and upper bound).
fn half_step(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let total: f64 = values.windows(2).map(|w| w[1] - w[0]).sum();
    (total / (values.len() - 1) as f64).abs() / 2.0
}

#[cfg(test)]
#[path = "attrs_test.rs"]
mod attrs_test;
