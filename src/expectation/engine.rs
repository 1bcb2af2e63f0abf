use std::collections::{BTreeMap, HashMap};

use crate::assertion::{fatal, must, resolve_str};
use crate::error::{HttpTesterError, Result};
use crate::expectation::types::Check;
use crate::http::{OutgoingRequest, PendingRequest, ResponseSnapshot};

/// Capture name to resolved string value.
pub type Captures = HashMap<String, String>;

/// What a response must look like, plus what to pull out of it.
#[derive(Debug)]
pub struct Expectation<'s> {
    request: PendingRequest<'s>,
    checks: Vec<Check>,
    captures: BTreeMap<String, String>,
    duplicate_captures: Vec<String>,
}

impl<'s> Expectation<'s> {
    pub(crate) fn new(request: PendingRequest<'s>) -> Self {
        Self {
            request,
            checks: Vec::new(),
            captures: BTreeMap::new(),
            duplicate_captures: Vec::new(),
        }
    }

    pub(crate) fn add_check(&mut self, check: Check) {
        self.checks.push(check);
    }

    pub(crate) fn add_capture(&mut self, name: String, path: String) {
        if self.captures.contains_key(&name) {
            self.duplicate_captures.push(name);
            return;
        }
        self.captures.insert(name, path);
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn request(&self) -> &PendingRequest<'s> {
        &self.request
    }

    /// Executes the request, runs every check and resolves the captures.
    pub fn test(self) -> Result<Captures> {
        self.test_with(Vec::<String>::new())
    }

    /// Like [`test`](Self::test); `extra` is appended to any failure message.
    ///
    /// Checks run in the order they were added and stop at the first
    /// failure.
    pub fn test_with<I, S>(mut self, extra: I) -> Result<Captures>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut extra: Vec<String> = extra.into_iter().map(Into::into).collect();
        let session = self.request.session();
        let reporter = session.reporter();
        let config = session.config();

        self.request.mark_done();

        if !self.duplicate_captures.is_empty() {
            let mut context = self.duplicate_captures.clone();
            context.extend(extra.iter().cloned());
            return Err(fatal(reporter, "duplicate capture names", &context));
        }

        let (headers, body) = must(reporter, self.request.finalise(), &extra)?;
        let url = must(reporter, session.resolve_url(self.request.path()), &extra)?;

        let outgoing = OutgoingRequest {
            method: self.request.method().clone(),
            url,
            headers,
            body,
        };

        if config.dump_messages {
            extra.push("HTTP request:".to_string());
            extra.push(config.formatter().format_request(&outgoing));
        }

        tracing::debug!(method = %outgoing.method, url = %outgoing.url, "sending request");

        let raw = must(
            reporter,
            session
                .transport()
                .send(&outgoing)
                .map_err(HttpTesterError::Transport),
            &extra,
        )?;
        let response = ResponseSnapshot::from(raw);

        tracing::debug!(status = response.status(), bytes = response.body().len(), "received response");

        if config.dump_messages {
            extra.push("HTTP response:".to_string());
            extra.push(config.formatter().format_response(&response));
        }

        for check in &self.checks {
            check.run(reporter, &response, &extra)?;
        }

        let mut captures = Captures::with_capacity(self.captures.len());
        for (name, path) in &self.captures {
            let document = must(reporter, response.json(), &extra)?;
            let value = resolve_str(reporter, document, path, &extra)?;
            tracing::debug!(capture = %name, path = %path, "captured value");
            captures.insert(name.clone(), value);
        }

        Ok(captures)
    }
}
