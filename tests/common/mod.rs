use tokio::runtime::Runtime;
use wiremock::MockServer;

/// A mock server running on its own tokio runtime, so the blocking client
/// can talk to it from a plain `#[test]` thread.
pub struct TestServer {
    pub server: MockServer,
    pub runtime: Runtime,
}

impl TestServer {
    pub fn start() -> Self {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn mount(&self, mock: wiremock::Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn received_requests(&self) -> Vec<wiremock::Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }
}

pub fn people() -> serde_json::Value {
    serde_json::json!([
        {
            "name": "Scotty",
            "address": {
                "number": "123",
                "street": "Fake Street",
                "city": "Cloud City",
                "zip": "71622"
            }
        }
    ])
}
