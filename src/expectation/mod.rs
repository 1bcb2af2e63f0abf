//! Response checks and JSON captures attached to a pending request.
mod engine;
mod types;

pub use engine::{Captures, Expectation};
pub use types::{Check, ResponseOption};
