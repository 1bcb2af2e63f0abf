//! Small failure helpers on top of [`Reporter`] for readable test output.
//!
//! Every message is the failure line followed by each piece of diagnostic
//! context on its own line.

use std::fmt::Display;

use serde_json::Value;

use crate::error::{HttpTesterError, Result};
use crate::reporter::Reporter;

/// Reports `failure` plus `extra` and returns the error to propagate.
pub fn fatal(reporter: &dyn Reporter, failure: impl Display, extra: &[String]) -> HttpTesterError {
    let mut lines = Vec::with_capacity(extra.len() + 1);
    lines.push(failure.to_string());
    lines.extend(extra.iter().cloned());

    let message = lines.join("\n");
    reporter.fail(&message);
    HttpTesterError::Failure(message)
}

/// Reports the error of `result`, if any.
pub fn must<T, E: Display>(
    reporter: &dyn Reporter,
    result: std::result::Result<T, E>,
    extra: &[String],
) -> Result<T> {
    result.map_err(|e| fatal(reporter, e, extra))
}

/// Fails unless `expected == actual`.
pub fn equals<T>(reporter: &dyn Reporter, expected: &T, actual: &T, extra: &[String]) -> Result<()>
where
    T: PartialEq + Display + ?Sized,
{
    if expected == actual {
        return Ok(());
    }

    Err(fatal(
        reporter,
        "values are not equal",
        &mismatch(expected, actual, extra),
    ))
}

/// Fails unless the two JSON values are structurally equal, see
/// [`values_equal`].
pub fn json_equals(
    reporter: &dyn Reporter,
    expected: &Value,
    actual: &Value,
    extra: &[String],
) -> Result<()> {
    if values_equal(expected, actual) {
        return Ok(());
    }

    Err(fatal(
        reporter,
        "values are not equal",
        &mismatch(expected, actual, extra),
    ))
}

/// Structural equality over JSON values. Numbers compare as `f64`, so `1`
/// equals `1.0`; object key order never matters.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => false,
    }
}

fn mismatch(expected: &(impl Display + ?Sized), actual: &(impl Display + ?Sized), extra: &[String]) -> Vec<String> {
    let mut lines = vec![
        "expected".to_string(),
        expected.to_string(),
        "actual".to_string(),
        actual.to_string(),
    ];
    lines.extend(extra.iter().cloned());
    lines
}
