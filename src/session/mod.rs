//! Sessions own every request of one test run.
pub mod config;
mod tracker;

pub use config::{ConfigLoader, DEFAULT_MAX_OUTPUT, SessionConfig};
pub use tracker::{Session, SessionBuilder};
