use std::fmt;

use serde_json::{Map, Value};

/// Errors returned by every fallible operation of this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The client could not be configured (empty domain, bad timeout, unreadable rc file).
    #[error("configuration error: {0}")]
    Config(String),

    /// An option, content-type token or sort field was rejected before any request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Network, TLS or timeout failure reported by the transport.
    #[error(transparent)]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// The server answered with a status other than 200 or 202.
    #[error(transparent)]
    Api(#[from] SodaHttpError),

    /// A successful response carried a content type with no decoder.
    #[error("Unknown response format: {0}")]
    UnknownFormat(String),

    #[error("failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse CSV response: {0}")]
    Csv(#[from] csv::Error),

    /// The body decoded fine but does not have the shape the operation needs.
    #[error("unexpected response body: {0}")]
    UnexpectedBody(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Error detail a SODA host may return in the body of a failed request:
///
/// ```json
/// {
///   "code": "query.compiler.malformed",
///   "error": true,
///   "message": "Could not parse SoQL query \"select * where string_column > 42\"",
///   "data": { "query": "select * where string_column > 42" }
/// }
/// ```
///
/// Any of these fields may be missing.
#[derive(Debug, Default, serde::Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

fn text(v: Option<Value>) -> String {
    match v {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

/// A non-success HTTP response together with the diagnostic payload the host sent back.
#[derive(Debug, Clone, PartialEq)]
pub struct SodaHttpError {
    status: u16,
    reason: String,
    request_url: Option<String>,
    error_detail: Map<String, Value>,
}

impl SodaHttpError {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            request_url: None,
            error_detail: Map::new(),
        }
    }

    pub fn with_request_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.request_url = if url.is_empty() { None } else { Some(url) };
        self
    }

    pub fn with_error_detail(mut self, detail: Map<String, Value>) -> Self {
        self.error_detail = detail;
        self
    }

    /// Builds the error from a raw response body. A body that is not a JSON object leaves the
    /// detail empty.
    pub fn from_body(
        status: u16,
        reason: impl Into<String>,
        request_url: impl Into<String>,
        body: &[u8],
    ) -> Self {
        let detail = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self::new(status, reason)
            .with_request_url(request_url)
            .with_error_detail(detail)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn request_url(&self) -> Option<&str> {
        self.request_url.as_deref()
    }

    pub fn error_detail(&self) -> &Map<String, Value> {
        &self.error_detail
    }

    fn detail(&self) -> ErrorDetail {
        serde_json::from_value(Value::Object(self.error_detail.clone())).unwrap_or_default()
    }

    /// Machine-readable error code, e.g. `query.compiler.malformed`.
    pub fn code(&self) -> String {
        text(self.detail().code)
    }

    pub fn error(&self) -> bool {
        self.detail()
            .error
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }

    pub fn message(&self) -> String {
        text(self.detail().message)
    }

    /// The SoQL query the host failed on, if it echoed one back.
    pub fn query(&self) -> String {
        text(self.detail().data.and_then(|d| d.get("query").cloned()))
    }
}

impl fmt::Display for SodaHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.status {
            400..=499 => Some("Client Error"),
            500..=599 => Some("Server Error"),
            _ => None,
        };
        write!(
            f,
            "{} {}: {}",
            class.unwrap_or("Undefined Error"),
            self.status,
            self.reason
        )?;
        if let Some(url) = &self.request_url {
            write!(f, " for url {}", url)?;
        }
        if class.is_some() {
            f.write_str(". See error_detail.")?;
        }
        Ok(())
    }
}

impl std::error::Error for SodaHttpError {}
