//! JSONPath lookups against response bodies.
//!
//! Path syntax follows <https://www.ietf.org/archive/id/draft-goessner-dispatch-jsonpath-00.html>,
//! e.g. `$[0].address.street`.

use std::io::Read;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::assertion::fail::{fatal, must};
use crate::assertion::types::JsonPathError;
use crate::error::{HttpTesterError, Result};
use crate::reporter::Reporter;

/// A JSON document parsed once and queried any number of times.
#[derive(Debug, Clone)]
pub struct JsonDocument {
    raw: String,
    value: Value,
}

impl JsonDocument {
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(HttpTesterError::EmptyJson);
        }

        Ok(Self {
            raw: text.to_string(),
            value: serde_json::from_str(text)?,
        })
    }

    /// The text the document was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Evaluates `path` against the document.
    ///
    /// A path naming one location returns the value found there. A path
    /// that can match many (wildcards, deep scans, filters, slices, unions)
    /// always returns an array of its matches in document order, even when
    /// only one value matched.
    pub fn exists(&self, path: &str) -> std::result::Result<Value, JsonPathError> {
        let matches =
            jsonpath_lib::select(&self.value, path).map_err(|e| JsonPathError::Invalid {
                path: path.to_string(),
                reason: format!("{:?}", e),
            })?;

        match matches.as_slice() {
            [] => Err(JsonPathError::NotFound {
                path: path.to_string(),
            }),
            [single] if !matches_many(path) => Ok((*single).clone()),
            many => Ok(Value::Array(many.iter().map(|v| (*v).clone()).collect())),
        }
    }
}

/// True for paths that can select more than one location.
fn matches_many(path: &str) -> bool {
    if path.contains("..") || path.contains('*') {
        return true;
    }

    let mut rest = path;
    while let Some(open) = rest.find('[') {
        let Some(len) = rest[open..].find(']') else {
            break;
        };
        let selector = rest[open + 1..open + len].trim();

        let quoted = selector.starts_with('\'') || selector.starts_with('"');
        if quoted {
            // ['a','b'] carries more than one pair of quotes
            if selector.matches(['\'', '"']).count() > 2 {
                return true;
            }
        } else if selector.starts_with('?') || selector.contains(':') || selector.contains(',') {
            return true;
        }

        rest = &rest[open + len + 1..];
    }

    false
}

/// Fails unless `path` resolves in `document`. Returns the resolved value.
pub(crate) fn resolve(
    reporter: &dyn Reporter,
    document: &JsonDocument,
    path: &str,
    extra: &[String],
) -> Result<Value> {
    document.exists(path).map_err(|e| {
        let mut context = vec![
            "failed to capture JSON path".to_string(),
            path.to_string(),
            "full data".to_string(),
            document.raw().to_string(),
        ];
        context.extend(extra.iter().cloned());
        fatal(reporter, e, &context)
    })
}

/// Like [`resolve`], additionally requiring a string value.
pub(crate) fn resolve_str(
    reporter: &dyn Reporter,
    document: &JsonDocument,
    path: &str,
    extra: &[String],
) -> Result<String> {
    match resolve(reporter, document, path, extra)? {
        Value::String(s) => Ok(s),
        other => {
            let mut context = vec![
                "path".to_string(),
                path.to_string(),
                "val".to_string(),
                other.to_string(),
                "full data".to_string(),
                document.raw().to_string(),
            ];
            context.extend(extra.iter().cloned());
            Err(fatal(
                reporter,
                "jsonpath does not resolve to a string value",
                &context,
            ))
        }
    }
}

/// Succeeds only when `path` has no match in `document`.
pub(crate) fn resolve_absent(
    reporter: &dyn Reporter,
    document: &JsonDocument,
    path: &str,
    extra: &[String],
) -> Result<()> {
    match document.exists(path) {
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => {
            let mut context = vec![path.to_string()];
            context.extend(extra.iter().cloned());
            Err(fatal(reporter, e, &context))
        }
        Ok(found) => {
            let mut context = vec![
                "path".to_string(),
                path.to_string(),
                "val".to_string(),
                found.to_string(),
                "full data".to_string(),
                document.raw().to_string(),
            ];
            context.extend(extra.iter().cloned());
            Err(fatal(reporter, "jsonpath unexpectedly matched a value", &context))
        }
    }
}

/// Fails if `data` is not JSON or has nothing at `path`. Returns the
/// resolved value.
pub fn json_contains(
    reporter: &dyn Reporter,
    data: &str,
    path: &str,
    extra: &[String],
) -> Result<Value> {
    let document = must(reporter, JsonDocument::parse(data), extra)?;
    resolve(reporter, &document, path, extra)
}

/// Fails if `data` does not hold a string value at `path`. Returns the
/// resolved string.
pub fn json_contains_str(
    reporter: &dyn Reporter,
    data: &str,
    path: &str,
    extra: &[String],
) -> Result<String> {
    let document = must(reporter, JsonDocument::parse(data), extra)?;
    resolve_str(reporter, &document, path, extra)
}

/// Fails if `path` matches anything in `data`.
pub fn json_not_contains(
    reporter: &dyn Reporter,
    data: &str,
    path: &str,
    extra: &[String],
) -> Result<()> {
    let document = must(reporter, JsonDocument::parse(data), extra)?;
    resolve_absent(reporter, &document, path, extra)
}

/// Reads `input` to the end and decodes it, failing on read errors, empty
/// input or malformed JSON.
pub fn must_parse_json<T: DeserializeOwned>(
    reporter: &dyn Reporter,
    mut input: impl Read,
    extra: &[String],
) -> Result<T> {
    let mut data = Vec::new();
    must(reporter, input.read_to_end(&mut data), extra)?;

    if data.is_empty() {
        return Err(fatal(reporter, HttpTesterError::EmptyJson, extra));
    }

    must(reporter, serde_json::from_slice(&data), extra)
}
