//! The HTTP seam. The client hands a fully resolved GET to a [`Transport`] and gets plain data
//! back; status interpretation and decoding stay on the client side.

use hyper::ext::ReasonPhrase;
use reqwest::blocking::Client as HttpClient;
use std::time::Duration;

use crate::error::Result;

/// A GET request ready to be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute URL without query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    /// Final URL of the request, query string included.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Executes GET requests on behalf of a [`Client`](crate::Client).
///
/// Implementations do not need to be thread-safe; a client never issues two requests at once.
/// Any status code, 4xx and 5xx included, must come back as `Ok`. Only network-level failures
/// are errors, and they reach the caller unchanged.
pub trait Transport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse>;

    /// Releases pooled connections. Called once, when the owning client closes.
    fn close(&mut self) {}
}

/// [`Transport`] over a blocking `reqwest` client.
#[derive(Debug)]
pub struct HttpTransport {
    http: Option<HttpClient>,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let http = HttpClient::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { http: Some(http) })
    }

    pub fn from_client(http: HttpClient) -> Self {
        Self { http: Some(http) }
    }
}

impl Transport for HttpTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let http = self.http.as_ref().ok_or_else(|| {
            crate::Error::Transport("transport used after close".into())
        })?;

        let mut req = http
            .get(&request.url)
            .query(&request.query)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let resp = req.send()?;

        let status = resp.status();
        let url = resp.url().to_string();
        let headers = resp
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        // hyper only records the phrase when it differs from the canonical one.
        let reason = match resp.extensions().get::<ReasonPhrase>() {
            Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
            None => status.canonical_reason().unwrap_or("").to_string(),
        };
        let body = resp.bytes()?.to_vec();

        Ok(HttpResponse {
            status: status.as_u16(),
            reason,
            url,
            headers,
            body,
        })
    }

    fn close(&mut self) {
        // Dropping the client shuts down its connection pool.
        self.http = None;
    }
}
