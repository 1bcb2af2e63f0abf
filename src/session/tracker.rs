use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::Location;
use std::rc::Rc;

use reqwest::Method;
use url::Url;

use crate::assertion::{fatal, must};
use crate::error::{HttpTesterError, Result};
use crate::http::{Client, PendingRequest, RequestOption, Transport};
use crate::reporter::{PanicReporter, Reporter};
use crate::session::config::{ConfigLoader, SessionConfig};

struct TrackedRequest {
    method: Method,
    path: String,
    location: &'static Location<'static>,
    done: Rc<Cell<bool>>,
}

/// Issues requests against one server for one test and makes sure every
/// request it hands out gets executed.
///
/// ```no_run
/// use httptester::{PanicReporter, RequestOption, ResponseOption, Session};
///
/// let session = Session::new("http://127.0.0.1:8080", PanicReporter)?;
/// let captures = session
///     .request("GET", "/people", [RequestOption::bearer("token")])?
///     .expect([
///         ResponseOption::expect_code(200),
///         ResponseOption::capture_json("street", "$[0].address.street"),
///     ])
///     .test()?;
/// println!("{}", captures["street"]);
/// # Ok::<(), httptester::HttpTesterError>(())
/// ```
///
/// On drop the session reports every request that was built but never
/// tested, together with where it was built.
pub struct Session {
    base_url: String,
    reporter: Box<dyn Reporter>,
    transport: Box<dyn Transport>,
    config: SessionConfig,
    requests: RefCell<Vec<TrackedRequest>>,
    torn_down: Cell<bool>,
}

impl Session {
    /// A session with the default transport and config.
    pub fn new(base_url: impl Into<String>, reporter: impl Reporter + 'static) -> Result<Self> {
        Self::builder(base_url).reporter(reporter).build()
    }

    pub fn builder(base_url: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(base_url)
    }

    /// Builds a request. `path` is joined onto the base URL when the request
    /// executes.
    #[track_caller]
    pub fn request<I>(&self, method: &str, path: &str, options: I) -> Result<PendingRequest<'_>>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let location = Location::caller();
        let context = [format!("request created at {}", location)];

        let method = must(self.reporter(), parse_method(method), &context)?;
        let mut request = PendingRequest::new(self, method, path.to_string(), location);

        for option in options {
            must(self.reporter(), option.apply(&mut request), &context)?;
        }

        self.requests.borrow_mut().push(TrackedRequest {
            method: request.method().clone(),
            path: request.path().to_string(),
            location,
            done: request.done_flag(),
        });

        Ok(request)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests built but not tested yet.
    pub fn pending(&self) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| !r.done.get())
            .count()
    }

    /// Reports one failure per request that was never tested. Runs at most
    /// once; dropping the session calls it too.
    pub fn teardown(&self) {
        if self.torn_down.replace(true) {
            return;
        }

        let forgotten: Vec<(String, String)> = self
            .requests
            .borrow()
            .iter()
            .filter(|r| !r.done.get())
            .map(|r| {
                (
                    format!("forgot to execute test on request {} {} created at:", r.method, r.path),
                    r.location.to_string(),
                )
            })
            .collect();

        for (failure, location) in forgotten {
            fatal(self.reporter(), failure, &[location]);
        }
    }

    pub(crate) fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn resolve_url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let joined = if path.is_empty() || path.starts_with('/') || path.starts_with('?') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        };

        Url::parse(&joined).map_err(|e| HttpTesterError::InvalidUrl(format!("{}: {}", joined, e)))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.teardown();
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

fn parse_method(method: &str) -> Result<Method> {
    if method.is_empty() {
        return Err(HttpTesterError::InvalidRequest(
            "HTTP method must not be empty".to_string(),
        ));
    }

    Method::from_bytes(method.as_bytes())
        .map_err(|_| HttpTesterError::InvalidRequest(format!("invalid HTTP method {:?}", method)))
}

/// Assembles a [`Session`].
pub struct SessionBuilder {
    base_url: String,
    reporter: Option<Box<dyn Reporter>>,
    transport: Option<Box<dyn Transport>>,
    config: SessionConfig,
}

impl SessionBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            reporter: None,
            transport: None,
            config: SessionConfig::default(),
        }
    }

    pub fn reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses the `httptester.toml` found by [`ConfigLoader::find_and_load`],
    /// or the default config when there is none.
    pub fn discover_config(self) -> Self {
        let config = ConfigLoader::find_and_load().unwrap_or_default();
        self.config(config)
    }

    /// Fails, through the reporter, unless the base URL is absolute.
    pub fn build(self) -> Result<Session> {
        let reporter = self
            .reporter
            .unwrap_or_else(|| Box::new(PanicReporter));

        let valid = Url::parse(&self.base_url)
            .map_err(|e| HttpTesterError::InvalidUrl(format!("{}: {}", self.base_url, e)))
            .and_then(|url| {
                if url.cannot_be_a_base() {
                    Err(HttpTesterError::InvalidUrl(format!(
                        "{} cannot be used as a base URL",
                        self.base_url
                    )))
                } else {
                    Ok(())
                }
            });
        must(reporter.as_ref(), valid, &[])?;

        Ok(Session {
            base_url: self.base_url,
            reporter,
            transport: self
                .transport
                .unwrap_or_else(|| Box::new(Client::new())),
            config: self.config,
            requests: RefCell::new(Vec::new()),
            torn_down: Cell::new(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{OutgoingRequest, RawResponse};
    use crate::reporter::RecordingReporter;
    use reqwest::header::HeaderMap;

    struct NoopTransport;

    impl Transport for NoopTransport {
        fn send(&self, _request: &OutgoingRequest) -> anyhow::Result<RawResponse> {
            Ok(RawResponse {
                status: 200,
                headers: HeaderMap::new(),
                body: b"{}".to_vec(),
            })
        }
    }

    fn create_test_session(reporter: &RecordingReporter) -> Session {
        Session::builder("http://127.0.0.1:8080/")
            .reporter(reporter.clone())
            .transport(NoopTransport)
            .build()
            .unwrap()
    }

    #[test]
    fn test_forgotten_request_reported_once_with_location() {
        let reporter = RecordingReporter::new();
        let session = create_test_session(&reporter);

        let line = line!() + 1;
        let request = session.request("GET", "/forgotten", []).unwrap();
        drop(request);

        assert_eq!(session.pending(), 1);
        drop(session);

        let failures = reporter.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("forgot to execute test on request GET /forgotten"));
        assert!(failures[0].contains(&format!("{}:{}", file!(), line)));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let reporter = RecordingReporter::new();
        let session = create_test_session(&reporter);
        let _ = session.request("DELETE", "/a", []).unwrap();

        session.teardown();
        session.teardown();
        drop(session);

        assert_eq!(reporter.failures().len(), 1);
    }

    #[test]
    fn test_executed_request_not_reported() {
        let reporter = RecordingReporter::new();
        let session = create_test_session(&reporter);

        session.request("GET", "/", []).unwrap().expect([]).test().unwrap();

        assert_eq!(session.pending(), 0);
        drop(session);
        assert!(!reporter.has_failed());
    }

    #[test]
    fn test_empty_method_rejected() {
        let reporter = RecordingReporter::new();
        let session = create_test_session(&reporter);

        let err = session.request("", "/", []).unwrap_err();
        assert!(err.is_reported());
        assert!(reporter.failures()[0].starts_with("invalid request: HTTP method must not be empty"));
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn test_invalid_method_rejected() {
        let reporter = RecordingReporter::new();
        let session = create_test_session(&reporter);
        assert!(session.request("GE T", "/", []).is_err());
    }

    #[test]
    fn test_invalid_header_rejected() {
        let reporter = RecordingReporter::new();
        let session = create_test_session(&reporter);

        let result = session.request("GET", "/", [RequestOption::header("bad header", "x")]);
        assert!(result.is_err());
        assert!(reporter.failures()[0].contains("request created at"));
    }

    struct BrokenReader;

    impl std::io::Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk unplugged"))
        }
    }

    #[test]
    fn test_unreadable_multipart_file_rejected() {
        let reporter = RecordingReporter::new();
        let session = create_test_session(&reporter);

        let result = session.request(
            "POST",
            "/upload",
            [RequestOption::multipart_file("doc", "notes.txt", BrokenReader)],
        );

        assert!(result.is_err());
        let failures = reporter.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("disk unplugged"));
        assert!(failures[0].contains("request created at"));
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn test_malformed_base_url() {
        let reporter = RecordingReporter::new();
        let result = Session::builder("not a url")
            .reporter(reporter.clone())
            .transport(NoopTransport)
            .build();

        assert!(result.is_err());
        assert!(reporter.failures()[0].starts_with("invalid URL: not a url"));
    }

    #[test]
    fn test_resolve_url() {
        let reporter = RecordingReporter::new();
        let session = create_test_session(&reporter);

        assert_eq!(
            session.resolve_url("/api/users?page=2").unwrap().as_str(),
            "http://127.0.0.1:8080/api/users?page=2"
        );
        assert_eq!(
            session.resolve_url("api").unwrap().as_str(),
            "http://127.0.0.1:8080/api"
        );
        assert_eq!(
            session.resolve_url("").unwrap().as_str(),
            "http://127.0.0.1:8080/"
        );
    }
}
