pub mod client;
pub mod request;
pub mod response;

// Re-export commonly used types for convenient access
pub use client::{Client, OutgoingRequest, RawResponse, Transport};
pub use request::{PendingRequest, RequestOption};
pub use response::ResponseSnapshot;
