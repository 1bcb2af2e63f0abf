use reqwest::StatusCode;
use reqwest::header::HeaderMap;

use crate::http::{OutgoingRequest, ResponseSnapshot};

/// Renders HTTP messages in wire form for failure output, cut to at most
/// `max_output` bytes.
#[derive(Debug, Clone, Copy)]
pub struct MessageFormatter {
    max_output: usize,
}

impl MessageFormatter {
    pub fn new(max_output: usize) -> Self {
        Self { max_output }
    }

    pub fn format_request(&self, request: &OutgoingRequest) -> String {
        let mut output = Vec::new();

        let mut target = request.url.path().to_string();
        if let Some(query) = request.url.query() {
            target.push('?');
            target.push_str(query);
        }
        output.push(format!("{} {} HTTP/1.1", request.method, target));

        if let Some(host) = request.url.host_str() {
            match request.url.port() {
                Some(port) => output.push(format!("Host: {}:{}", host, port)),
                None => output.push(format!("Host: {}", host)),
            }
        }
        output.extend(format_headers(&request.headers));
        output.push(String::new());
        output.push(String::from_utf8_lossy(&request.body).into_owned());

        self.truncate(output.join("\n"))
    }

    pub fn format_response(&self, response: &ResponseSnapshot) -> String {
        let mut output = Vec::new();

        let reason = StatusCode::from_u16(response.status())
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown");
        output.push(format!("HTTP/1.1 {} {}", response.status(), reason));
        output.extend(format_headers(response.headers()));
        output.push(String::new());
        output.push(response.text().to_string());

        self.truncate(output.join("\n"))
    }

    /// Cuts `text` to `max_output` bytes without splitting a character.
    pub fn truncate(&self, mut text: String) -> String {
        if text.len() <= self.max_output {
            return text;
        }

        let mut end = self.max_output;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
        text
    }
}

fn format_headers(headers: &HeaderMap) -> Vec<String> {
    let mut lines: Vec<String> = headers
        .iter()
        .map(|(name, value)| {
            format!(
                "{}: {}",
                canonical_name(name.as_str()),
                String::from_utf8_lossy(value.as_bytes())
            )
        })
        .collect();
    lines.sort();
    lines
}

/// `content-type` becomes `Content-Type`.
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
