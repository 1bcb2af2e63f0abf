mod fail;
mod json;
mod types;

pub use fail::{equals, fatal, json_equals, must, values_equal};
pub use json::{JsonDocument, json_contains, json_contains_str, json_not_contains, must_parse_json};
pub(crate) use json::{resolve, resolve_absent, resolve_str};
pub use types::JsonPathError;
