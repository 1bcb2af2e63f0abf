/// Why a JSON path did not yield a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonPathError {
    #[error("invalid JSON path {path}: {reason}")]
    Invalid { path: String, reason: String },

    #[error("unknown key or index in JSON path {path}")]
    NotFound { path: String },
}

impl JsonPathError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, JsonPathError::NotFound { .. })
    }

    pub fn path(&self) -> &str {
        match self {
            JsonPathError::Invalid { path, .. } | JsonPathError::NotFound { path } => path,
        }
    }
}
