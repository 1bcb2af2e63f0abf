use serde_json::Value;

use crate::assertion::{equals, fatal, json_equals, must, resolve, resolve_absent, resolve_str};
use crate::error::Result;
use crate::expectation::engine::Expectation;
use crate::http::ResponseSnapshot;
use crate::reporter::Reporter;

/// A single check run against a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// Status code equality.
    Status(u16),
    /// The raw body contains the string at least once.
    BodyContains(String),
    /// Header value equality; a missing header reads as `""`.
    HeaderEquals { name: String, value: String },
    /// The path resolves to a non-empty string.
    JsonExists(String),
    /// The path matches nothing.
    JsonNotExists(String),
    JsonMatchStr { path: String, expected: String },
    /// Structural equality with numbers compared as floats.
    JsonMatchValue { path: String, expected: Value },
}

impl Check {
    pub fn run(&self, reporter: &dyn Reporter, response: &ResponseSnapshot, extra: &[String]) -> Result<()> {
        match self {
            Check::Status(code) => equals(reporter, code, &response.status(), extra),

            Check::BodyContains(content) => {
                if response.text().contains(content.as_str()) {
                    return Ok(());
                }
                let mut context = vec![
                    "contains".to_string(),
                    content.clone(),
                    "body".to_string(),
                    response.text().to_string(),
                ];
                context.extend(extra.iter().cloned());
                Err(fatal(reporter, "body contains failed", &context))
            }

            Check::HeaderEquals { name, value } => {
                let context = with_context(format!("header: {}", name), extra);
                equals(reporter, value.as_str(), response.header(name).as_str(), &context)
            }

            Check::JsonExists(path) => {
                let document = must(reporter, response.json(), extra)?;
                let found = resolve_str(reporter, document, path, extra)?;
                if !found.is_empty() {
                    return Ok(());
                }
                let mut context = vec![
                    "path".to_string(),
                    path.clone(),
                    "full data".to_string(),
                    document.raw().to_string(),
                ];
                context.extend(extra.iter().cloned());
                Err(fatal(reporter, "jsonpath resolves to an empty string", &context))
            }

            Check::JsonNotExists(path) => {
                let document = must(reporter, response.json(), extra)?;
                resolve_absent(reporter, document, path, extra)
            }

            Check::JsonMatchStr { path, expected } => {
                let context = with_context(format!("json path: {}", path), extra);
                let document = must(reporter, response.json(), &context)?;
                let actual = resolve_str(reporter, document, path, &context)?;
                equals(reporter, expected.as_str(), actual.as_str(), &context)
            }

            Check::JsonMatchValue { path, expected } => {
                let context = with_context(format!("json path: {}", path), extra);
                let document = must(reporter, response.json(), &context)?;
                let actual = resolve(reporter, document, path, &context)?;
                json_equals(reporter, expected, &actual, &context)
            }
        }
    }
}

fn with_context(first: String, extra: &[String]) -> Vec<String> {
    let mut context = Vec::with_capacity(extra.len() + 1);
    context.push(first);
    context.extend(extra.iter().cloned());
    context
}

/// Configures an [`Expectation`]: either a check or a named capture.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOption {
    Check(Check),
    /// Captures the string at `path` under `name`. Implies the path
    /// resolves to a string.
    CaptureJson { name: String, path: String },
}

impl ResponseOption {
    pub fn expect_code(code: u16) -> Self {
        ResponseOption::Check(Check::Status(code))
    }

    pub fn expect_body_contains(content: impl Into<String>) -> Self {
        ResponseOption::Check(Check::BodyContains(content.into()))
    }

    pub fn expect_header(name: impl Into<String>, value: impl Into<String>) -> Self {
        ResponseOption::Check(Check::HeaderEquals {
            name: name.into(),
            value: value.into(),
        })
    }

    pub fn expect_content_type(content_type: impl Into<String>) -> Self {
        Self::expect_header("Content-Type", content_type)
    }

    pub fn expect_json_exists(path: impl Into<String>) -> Self {
        ResponseOption::Check(Check::JsonExists(path.into()))
    }

    pub fn expect_json_not_exists(path: impl Into<String>) -> Self {
        ResponseOption::Check(Check::JsonNotExists(path.into()))
    }

    pub fn expect_json_match_str(path: impl Into<String>, expected: impl Into<String>) -> Self {
        ResponseOption::Check(Check::JsonMatchStr {
            path: path.into(),
            expected: expected.into(),
        })
    }

    /// `expected` is anything convertible to a JSON value, e.g. `42`,
    /// `"71622"` or `json!({"a": [1, 2]})`.
    pub fn expect_json_match(path: impl Into<String>, expected: impl Into<Value>) -> Self {
        ResponseOption::Check(Check::JsonMatchValue {
            path: path.into(),
            expected: expected.into(),
        })
    }

    pub fn capture_json(name: impl Into<String>, path: impl Into<String>) -> Self {
        ResponseOption::CaptureJson {
            name: name.into(),
            path: path.into(),
        }
    }

    pub(crate) fn apply(self, expectation: &mut Expectation<'_>) {
        match self {
            ResponseOption::Check(check) => expectation.add_check(check),
            ResponseOption::CaptureJson { name, path } => expectation.add_capture(name, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::RecordingReporter;
    use reqwest::header::HeaderMap;
    use serde_json::json;

    const PEOPLE: &str = r#"[{"name":"Scotty","age":42,"tags":[],"address":{"zip":"71622"}}]"#;

    fn create_test_response(status: u16, body: &str) -> ResponseSnapshot {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        ResponseSnapshot::new(status, headers, body.as_bytes().to_vec())
    }

    fn run(check: Check, response: &ResponseSnapshot) -> (Result<()>, Vec<String>) {
        let reporter = RecordingReporter::new();
        let result = check.run(&reporter, response, &["ctx".to_string()]);
        (result, reporter.failures())
    }

    #[test]
    fn test_status() {
        let response = create_test_response(404, "{}");
        assert!(run(Check::Status(404), &response).0.is_ok());

        let (result, failures) = run(Check::Status(200), &response);
        assert!(result.is_err());
        assert_eq!(failures[0], "values are not equal\nexpected\n200\nactual\n404\nctx");
    }

    #[test]
    fn test_body_contains() {
        let response = create_test_response(200, PEOPLE);
        assert!(run(Check::BodyContains("Scotty".into()), &response).0.is_ok());

        let (result, failures) = run(Check::BodyContains("Kirk".into()), &response);
        assert!(result.is_err());
        assert!(failures[0].starts_with("body contains failed\ncontains\nKirk\nbody\n"));
        assert!(failures[0].contains(PEOPLE));
    }

    #[test]
    fn test_header_equals() {
        let response = create_test_response(200, "{}");
        let check = Check::HeaderEquals {
            name: "Content-Type".into(),
            value: "application/json".into(),
        };
        assert!(run(check, &response).0.is_ok());

        let check = Check::HeaderEquals {
            name: "X-Request-Id".into(),
            value: "abc".into(),
        };
        let (result, failures) = run(check, &response);
        assert!(result.is_err());
        assert!(failures[0].contains("header: X-Request-Id"));
    }

    #[test]
    fn test_json_exists() {
        let response = create_test_response(200, PEOPLE);
        assert!(run(Check::JsonExists("$[0].name".into()), &response).0.is_ok());

        let (result, failures) = run(Check::JsonExists("$[0].foo".into()), &response);
        assert!(result.is_err());
        assert!(failures[0].contains("foo"));
        assert!(failures[0].contains(PEOPLE));

        let (result, failures) = run(Check::JsonExists("$[0].age".into()), &response);
        assert!(result.is_err());
        assert!(failures[0].starts_with("jsonpath does not resolve to a string value"));
    }

    #[test]
    fn test_json_exists_rejects_empty_string() {
        let response = create_test_response(200, r#"{"name":""}"#);
        let (result, failures) = run(Check::JsonExists("$.name".into()), &response);
        assert!(result.is_err());
        assert!(failures[0].starts_with("jsonpath resolves to an empty string"));
    }

    #[test]
    fn test_json_not_exists() {
        let response = create_test_response(200, PEOPLE);
        assert!(run(Check::JsonNotExists("$[0].foo".into()), &response).0.is_ok());
        assert!(run(Check::JsonNotExists("$[0].tags".into()), &response).0.is_err());
    }

    #[test]
    fn test_json_match_str() {
        let response = create_test_response(200, PEOPLE);
        let check = Check::JsonMatchStr {
            path: "$[0].name".into(),
            expected: "Scotty".into(),
        };
        assert!(run(check, &response).0.is_ok());

        let check = Check::JsonMatchStr {
            path: "$[0].name".into(),
            expected: "Spock".into(),
        };
        let (result, failures) = run(check, &response);
        assert!(result.is_err());
        assert_eq!(
            failures[0],
            "values are not equal\nexpected\nSpock\nactual\nScotty\njson path: $[0].name\nctx"
        );
    }

    #[test]
    fn test_json_match_value_keeps_string_type() {
        let response = create_test_response(200, PEOPLE);
        let check = Check::JsonMatchValue {
            path: "$[0].address.zip".into(),
            expected: json!("71622"),
        };
        assert!(run(check, &response).0.is_ok());

        let check = Check::JsonMatchValue {
            path: "$[0].address.zip".into(),
            expected: json!(71622),
        };
        assert!(run(check, &response).0.is_err());
    }

    #[test]
    fn test_json_match_value_numbers_as_float() {
        let response = create_test_response(200, PEOPLE);
        let check = Check::JsonMatchValue {
            path: "$[0].age".into(),
            expected: json!(42.0),
        };
        assert!(run(check, &response).0.is_ok());
    }

    #[test]
    fn test_json_check_on_empty_body() {
        let response = create_test_response(204, "");
        let (result, failures) = run(Check::JsonExists("$.a".into()), &response);
        assert!(result.is_err());
        assert_eq!(failures[0], "cannot JSON parse an empty string\nctx");
    }

    #[test]
    fn test_option_constructors() {
        assert_eq!(
            ResponseOption::expect_content_type("text/plain"),
            ResponseOption::Check(Check::HeaderEquals {
                name: "Content-Type".into(),
                value: "text/plain".into()
            })
        );
        assert_eq!(
            ResponseOption::expect_json_match("$.n", 3),
            ResponseOption::Check(Check::JsonMatchValue {
                path: "$.n".into(),
                expected: json!(3)
            })
        );
    }
}
