use std::io::Cursor;

use once_cell::unsync::OnceCell;
use reqwest::header::HeaderMap;

use crate::assertion::JsonDocument;
use crate::http::client::RawResponse;

/// A response materialised once so every check and capture can read it
/// again. The body is decoded as JSON at most once, on first use.
#[derive(Debug)]
pub struct ResponseSnapshot {
    status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
    text: String,
    document: OnceCell<Result<JsonDocument, String>>,
}

impl ResponseSnapshot {
    pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
        let text = String::from_utf8_lossy(&body).into_owned();
        Self {
            status,
            headers,
            body,
            text,
            document: OnceCell::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of header `name`, or an empty string when absent.
    pub fn header(&self, name: &str) -> String {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// A fresh reader over the body.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.body)
    }

    /// The body as a JSON document. The error is the parse failure message.
    pub fn json(&self) -> Result<&JsonDocument, &str> {
        self.document
            .get_or_init(|| JsonDocument::parse(&self.text).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| e.as_str())
    }
}

impl From<RawResponse> for ResponseSnapshot {
    fn from(raw: RawResponse) -> Self {
        Self::new(raw.status, raw.headers, raw.body)
    }
}
