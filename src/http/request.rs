use std::cell::Cell;
use std::fmt::{self, Display};
use std::io::Read;
use std::panic::Location;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::Method;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::error::{HttpTesterError, Result};
use crate::expectation::{Expectation, ResponseOption};
use crate::session::Session;

/// Configures a [`PendingRequest`]. Options apply in the order given.
pub enum RequestOption {
    Header { name: String, value: String },
    Body(Vec<u8>),
    JsonBody(Result<String>),
    MultipartField { name: String, value: Vec<u8> },
    MultipartFile {
        field: String,
        file_name: String,
        data: Box<dyn Read>,
    },
}

impl RequestOption {
    /// Sets header `name`. A later value for the same name wins.
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        RequestOption::Header {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn bearer(token: impl Display) -> Self {
        Self::header("Authorization", format!("Bearer {}", token))
    }

    /// A raw body. `Content-Type` is left alone.
    pub fn body(body: impl Into<Vec<u8>>) -> Self {
        RequestOption::Body(body.into())
    }

    /// A JSON body from a printf-style template.
    ///
    /// `%s`, `%v` and `%d` insert the next argument as displayed, `%q`
    /// inserts it as a quoted JSON string and `%%` is a literal percent:
    ///
    /// ```
    /// use httptester::RequestOption;
    ///
    /// let option = RequestOption::json_str(r#"{"name": %q, "age": %d}"#, &[&"Scotty", &42]);
    /// ```
    pub fn json_str(template: &str, args: &[&dyn Display]) -> Self {
        RequestOption::JsonBody(render_template(template, args))
    }

    /// A JSON body read verbatim from `reader`.
    pub fn json_reader(mut reader: impl Read) -> Self {
        let mut body = String::new();
        let read = reader
            .read_to_string(&mut body)
            .map(|_| body)
            .map_err(HttpTesterError::from);
        RequestOption::JsonBody(read)
    }

    /// A JSON body serialized from `value`, indented by two spaces.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        RequestOption::JsonBody(serde_json::to_string_pretty(value).map_err(HttpTesterError::from))
    }

    pub fn multipart_field(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        RequestOption::MultipartField {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn multipart_file(
        field: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Read + 'static,
    ) -> Self {
        RequestOption::MultipartFile {
            field: field.into(),
            file_name: file_name.into(),
            data: Box::new(data),
        }
    }

    pub(crate) fn apply(self, request: &mut PendingRequest<'_>) -> Result<()> {
        match self {
            RequestOption::Header { name, value } => request.set_header(&name, &value),
            RequestOption::Body(body) => {
                request.body = Some(body);
                Ok(())
            }
            RequestOption::JsonBody(body) => {
                let body = body?;
                request.set_header(CONTENT_TYPE.as_str(), "application/json")?;
                request.body = Some(body.into_bytes());
                Ok(())
            }
            RequestOption::MultipartField { name, value } => {
                request.add_part(name, Part::bytes(value));
                Ok(())
            }
            RequestOption::MultipartFile {
                field,
                file_name,
                mut data,
            } => {
                // Read now so a failing reader surfaces while the request is built.
                let mut contents = Vec::new();
                data.read_to_end(&mut contents)?;
                request.add_part(field, Part::bytes(contents).file_name(file_name));
                Ok(())
            }
        }
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestOption::Header { name, value } => f
                .debug_struct("Header")
                .field("name", name)
                .field("value", value)
                .finish(),
            RequestOption::Body(body) => f.debug_tuple("Body").field(&body.len()).finish(),
            RequestOption::JsonBody(body) => f.debug_tuple("JsonBody").field(body).finish(),
            RequestOption::MultipartField { name, .. } => f
                .debug_struct("MultipartField")
                .field("name", name)
                .finish_non_exhaustive(),
            RequestOption::MultipartFile {
                field, file_name, ..
            } => f
                .debug_struct("MultipartFile")
                .field("field", field)
                .field("file_name", file_name)
                .finish_non_exhaustive(),
        }
    }
}

static VERB_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([%svdq])").expect("template verb pattern is valid"));

fn render_template(template: &str, args: &[&dyn Display]) -> Result<String> {
    let mut used = 0;
    let mut missing = false;

    let rendered = VERB_REGEX
        .replace_all(template, |caps: &Captures| {
            let verb = &caps[1];
            if verb == "%" {
                return "%".to_string();
            }

            let Some(arg) = args.get(used) else {
                missing = true;
                return caps[0].to_string();
            };
            used += 1;

            match verb {
                "q" => serde_json::Value::String(arg.to_string()).to_string(),
                _ => arg.to_string(),
            }
        })
        .into_owned();

    if missing {
        return Err(HttpTesterError::Template(format!(
            "{:?} needs more than {} arguments",
            template,
            args.len()
        )));
    }
    if used < args.len() {
        return Err(HttpTesterError::Template(format!(
            "{:?} uses {} of {} arguments",
            template,
            used,
            args.len()
        )));
    }

    Ok(rendered)
}

/// A request that has been built but not executed yet.
///
/// Attach expectations with [`expect`](Self::expect) and run it with
/// [`Expectation::test`]; a request that is never tested is reported when
/// its session tears down.
pub struct PendingRequest<'s> {
    session: &'s Session,
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    multipart: Option<Form>,
    done: Rc<Cell<bool>>,
    location: &'static Location<'static>,
}

impl<'s> PendingRequest<'s> {
    pub(crate) fn new(
        session: &'s Session,
        method: Method,
        path: String,
        location: &'static Location<'static>,
    ) -> Self {
        Self {
            session,
            method,
            path,
            headers: HeaderMap::new(),
            body: None,
            multipart: None,
            done: Rc::new(Cell::new(false)),
            location,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Where the request was built.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn is_done(&self) -> bool {
        self.done.get()
    }

    pub fn uses_multipart(&self) -> bool {
        self.multipart.is_some()
    }

    /// Attaches checks and captures to run once the request executes.
    pub fn expect<I>(self, options: I) -> Expectation<'s>
    where
        I: IntoIterator<Item = ResponseOption>,
    {
        let mut expectation = Expectation::new(self);
        for option in options {
            option.apply(&mut expectation);
        }
        expectation
    }

    pub(crate) fn session(&self) -> &'s Session {
        self.session
    }

    pub(crate) fn done_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.done)
    }

    pub(crate) fn mark_done(&self) {
        self.done.set(true);
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HttpTesterError::InvalidRequest(format!("header name {:?}: {}", name, e)))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            HttpTesterError::InvalidRequest(format!("header {:?} value {:?}: {}", name, value, e))
        })?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    fn add_part(&mut self, name: String, part: Part) {
        let form = self.multipart.take().unwrap_or_else(Form::new);
        self.multipart = Some(form.part(name, part));
    }

    /// Encodes the multipart form, if one was started, and returns the final
    /// headers and body. A multipart form always replaces a body set
    /// directly, whatever the option order was.
    pub(crate) fn finalise(&mut self) -> Result<(HeaderMap, Vec<u8>)> {
        let Some(form) = self.multipart.take() else {
            return Ok((self.headers.clone(), self.body.clone().unwrap_or_default()));
        };

        if self.body.is_some() {
            let note = format!(
                "multipart form replaces the body set on {} {} ({})",
                self.method, self.path, self.location
            );
            tracing::warn!("{}", note);
            self.session.reporter().log(&note);
        }

        let content_type = format!("multipart/form-data; boundary={}", form.boundary());
        let mut body = Vec::new();
        form.into_reader().read_to_end(&mut body)?;
        self.set_header(CONTENT_TYPE.as_str(), &content_type)?;
        Ok((self.headers.clone(), body))
    }
}

impl fmt::Debug for PendingRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("multipart", &self.multipart.is_some())
            .field("done", &self.done.get())
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template() {
        let rendered =
            render_template(r#"{"name": %q, "age": %d, "pct": "100%%"}"#, &[&"Scotty", &42]).unwrap();
        assert_eq!(rendered, r#"{"name": "Scotty", "age": 42, "pct": "100%"}"#);
    }

    #[test]
    fn test_render_template_without_verbs() {
        let rendered = render_template(r#"{"a": {}}"#, &[]).unwrap();
        assert_eq!(rendered, r#"{"a": {}}"#);
    }

    #[test]
    fn test_render_template_missing_args() {
        let err = render_template("%s and %s", &[&"one"]).unwrap_err();
        assert!(matches!(err, HttpTesterError::Template(_)));
    }

    #[test]
    fn test_render_template_extra_args() {
        let err = render_template("%s", &[&"one", &"two"]).unwrap_err();
        assert!(err.to_string().contains("uses 1 of 2 arguments"));
    }

    #[test]
    fn test_json_option_is_indented() {
        let option = RequestOption::json(&serde_json::json!({"a": 1}));
        match option {
            RequestOption::JsonBody(Ok(body)) => assert_eq!(body, "{\n  \"a\": 1\n}"),
            other => panic!("unexpected option {:?}", other),
        }
    }

    #[test]
    fn test_json_reader_reads_verbatim() {
        let option = RequestOption::json_reader(r#"{"raw":true}"#.as_bytes());
        match option {
            RequestOption::JsonBody(Ok(body)) => assert_eq!(body, r#"{"raw":true}"#),
            other => panic!("unexpected option {:?}", other),
        }
    }

    #[test]
    fn test_bearer_is_authorization_header() {
        match RequestOption::bearer("abc") {
            RequestOption::Header { name, value } => {
                assert_eq!(name, "Authorization");
                assert_eq!(value, "Bearer abc");
            }
            other => panic!("unexpected option {:?}", other),
        }
    }
}
