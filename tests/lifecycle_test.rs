use httptester::{RecordingReporter, RequestOption, Session};

#[test]
fn test_forgotten_request_reported_at_drop() {
    let reporter = RecordingReporter::new();
    {
        let session = Session::new("http://127.0.0.1:8080", reporter.clone()).unwrap();
        let _forgotten = session
            .request("PUT", "/people/1", [RequestOption::header("X-Trace", "1")])
            .unwrap();
    }

    let failures = reporter.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].starts_with("forgot to execute test on request PUT /people/1 created at:"));
    assert!(failures[0].contains("lifecycle_test.rs"));
}

#[test]
fn test_each_forgotten_request_reported() {
    let reporter = RecordingReporter::new();
    let session = Session::new("http://127.0.0.1:8080", reporter.clone()).unwrap();

    for path in ["/a", "/b", "/c"] {
        let _ = session.request("GET", path, []).unwrap();
    }
    assert_eq!(session.pending(), 3);

    session.teardown();
    assert_eq!(reporter.failures().len(), 3);
}

#[test]
#[should_panic(expected = "forgot to execute test on request GET /never")]
fn test_default_reporter_panics_on_forgotten_request() {
    let session = Session::builder("http://127.0.0.1:8080").build().unwrap();
    let _ = session.request("GET", "/never", []).unwrap();
}
