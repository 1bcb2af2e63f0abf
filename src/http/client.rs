use reqwest::Method;
use reqwest::header::HeaderMap;
use url::Url;

/// A request exactly as it goes on the wire.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// A response with its body already read to the end.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Sends requests on behalf of a session.
///
/// Timeouts, TLS and proxies belong to the implementation; the session
/// never configures them.
pub trait Transport {
    fn send(&self, request: &OutgoingRequest) -> anyhow::Result<RawResponse>;
}

/// Blocking reqwest transport, the session default.
#[derive(Clone, Default)]
pub struct Client {
    inner: reqwest::blocking::Client,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a preconfigured client, e.g. one built with a timeout.
    pub fn with_client(inner: reqwest::blocking::Client) -> Self {
        Self { inner }
    }
}

impl Transport for Client {
    fn send(&self, request: &OutgoingRequest) -> anyhow::Result<RawResponse> {
        let response = self
            .inner
            .request(request.method.clone(), request.url.as_str())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes()?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
