//! Fluent HTTP assertions for services under test.
//!
//! A [`Session`] builds requests against one server, [`PendingRequest::expect`]
//! attaches checks and captures, and [`Expectation::test`] runs the whole
//! thing, reporting the first failure through a [`Reporter`].
pub mod assertion;
pub mod error;
pub mod expectation;
pub mod http;
pub mod logger;
pub mod reporter;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use assertion::{JsonDocument, JsonPathError};
pub use error::{HttpTesterError, Result};
pub use expectation::{Captures, Check, Expectation, ResponseOption};
pub use http::{PendingRequest, RequestOption, ResponseSnapshot, Transport};
pub use reporter::{PanicReporter, RecordingReporter, Reporter};
pub use session::{Session, SessionBuilder, SessionConfig};
