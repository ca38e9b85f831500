use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ClientConfig, load_config};
use crate::decode::{Body, decode, json_kind, normalize};
use crate::error::{Error, Result, SodaHttpError};
use crate::format::Format;
use crate::paging::Pages;
use crate::params::Params;
use crate::request::{self, Request};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Transport};

/// A decoded response, handed over to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub body: Body,
    /// Normalized content type, empty if the host sent none.
    pub content_type: String,
}

/// Result of [`Client::get_metadata`]; its shape depends on whether a dataset id was given.
#[derive(Debug, Clone, PartialEq)]
pub enum Metadata {
    Dataset(Value),
    All(Vec<Value>),
}

/// Client for one SODA host.
///
/// Requests are blocking and strictly sequential. A client is meant to be used from one
/// thread at a time; sharing it across threads is up to the caller and its transport.
/// The transport is closed by [`Client::close`], or when the client is dropped.
#[derive(Debug)]
pub struct Client<T: Transport = HttpTransport> {
    config: ClientConfig,
    transport: T,
    closed: bool,
}

impl Client<HttpTransport> {
    /// Creates a client for `domain` over HTTPS.
    ///
    /// Equivalent to Python: `Socrata(domain, app_token)`.
    pub fn new(domain: impl Into<String>, app_token: Option<&str>) -> Result<Self> {
        let mut config = ClientConfig::new(domain);
        config.app_token = app_token.map(str::to_string);
        Self::open(config)
    }

    /// Creates a client using `SODAPY_*` environment variables and/or `.sodapyrc`.
    pub fn from_env() -> Result<Self> {
        Self::open(load_config(None, None)?)
    }

    pub fn open(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Self::with_transport(config, HttpTransport::new()?)
    }

    /// Runs `f` with a freshly opened client and closes it on every exit path.
    pub fn scoped<R>(config: ClientConfig, f: impl FnOnce(&Self) -> Result<R>) -> Result<R> {
        let client = Self::open(config)?;
        f(&client)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;

        if config.app_token.as_deref().is_none_or(str::is_empty) {
            warn!(
                domain = %config.domain,
                "Requests made without an app_token will be subject to strict throttling limits."
            );
        }

        Ok(Self {
            config,
            transport,
            closed: false,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn domain(&self) -> &str {
        &self.config.domain
    }

    /// Reads one page of rows from `dataset_id`.
    ///
    /// `content_type` is one of `csv`, `json`, `rdfxml`, `xml`. Recognised `params` are
    /// `select`, `where`, `order`, `group`, `limit`, `offset`, `q`, `query` and
    /// `exclude_system_fields`; column equality filters go through [`Params::filter`].
    pub fn get(&self, dataset_id: &str, content_type: &str, params: &Params) -> Result<Response> {
        let format: Format = content_type.parse()?;
        let req = request::row_query(dataset_id, format, params)?;
        self.perform(req)
    }

    /// Reads every row of `dataset_id` as JSON records, paging lazily.
    ///
    /// Options are validated before this returns; no request is made until the first record
    /// is pulled.
    pub fn get_all(&self, dataset_id: &str, params: &Params) -> Result<Pages<'_, T>> {
        Pages::new(self, dataset_id, params)
    }

    /// Searches the catalog. The configured domain is always part of the `domains` filter.
    ///
    /// Returns the raw catalog object (`results`, `resultSetSize`, ...). No paging is done;
    /// pass `limit`/`offset` to walk large result sets.
    pub fn datasets(&self, params: &Params) -> Result<Value> {
        let req = request::discovery(&self.config.domain, params)?;
        let uri = req.path.clone();
        match self.perform(req)?.body {
            Body::Json(v @ Value::Object(_)) => Ok(v),
            other => Err(unexpected(&uri, "a JSON object", &other)),
        }
    }

    /// Metadata of one dataset, or of every dataset on the host when `dataset_id` is `None`.
    pub fn get_metadata(&self, dataset_id: Option<&str>) -> Result<Metadata> {
        let req = request::metadata(dataset_id)?;
        let uri = req.path.clone();
        let body = self.perform(req)?.body;
        match (dataset_id, body) {
            (Some(_), Body::Json(v @ Value::Object(_))) => Ok(Metadata::Dataset(v)),
            (None, Body::Json(Value::Array(all))) => Ok(Metadata::All(all)),
            (Some(_), other) => Err(unexpected(&uri, "a JSON object", &other)),
            (None, other) => Err(unexpected(&uri, "a JSON array", &other)),
        }
    }

    /// Releases the transport. Dropping the client has the same effect.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.closed {
            self.closed = true;
            self.transport.close();
            debug!(domain = %self.config.domain, "Client closed");
        }
    }

    pub(crate) fn fetch_records(&self, dataset_id: &str, params: &Params) -> Result<Vec<Value>> {
        let req = request::row_query(dataset_id, Format::Json, params)?;
        self.perform(req)?.body.into_records()
    }

    fn default_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("User-Agent".to_string(), self.config.user_agent.clone())];
        if let Some(token) = self.config.app_token.as_deref().filter(|t| !t.is_empty()) {
            headers.push(("X-App-Token".to_string(), token.to_string()));
        }
        if let Some(token) = self.config.access_token.as_deref().filter(|t| !t.is_empty()) {
            headers.push(("Authorization".to_string(), format!("OAuth {}", token)));
        }
        headers
    }

    fn perform(&self, req: Request) -> Result<Response> {
        let url = format!(
            "{}://{}{}",
            self.config.scheme, self.config.domain, req.path
        );
        let mut headers = self.default_headers();
        headers.extend(req.headers);

        debug!(url = %url, params = req.query.len(), "GET");
        let resp = self.transport.get(&HttpRequest {
            url,
            headers,
            query: req.query,
            timeout: self.config.timeout,
        })?;

        check_status(&resp)?;

        if resp.body.is_empty() {
            return Ok(Response {
                body: Body::Empty,
                content_type: String::new(),
            });
        }

        let content_type = resp.header("content-type").unwrap_or_default().to_string();
        Ok(Response {
            body: decode(&content_type, resp.body)?,
            content_type: normalize(&content_type),
        })
    }
}

impl<T: Transport> Drop for Client<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Only 200 and 202 count as success. Anything else, redirects included, becomes a
/// [`SodaHttpError`].
fn check_status(resp: &HttpResponse) -> Result<()> {
    if matches!(resp.status, 200 | 202) {
        return Ok(());
    }
    Err(SodaHttpError::from_body(
        resp.status,
        resp.reason.as_str(),
        resp.url.as_str(),
        &resp.body,
    )
    .into())
}

fn unexpected(uri: &str, expected: &str, body: &Body) -> Error {
    let got = match body {
        Body::Empty => "an empty body",
        Body::Json(v) => json_kind(v),
        Body::Rows(_) => "CSV rows",
        Body::Bytes(_) => "raw bytes",
        Body::Text(_) => "plain text",
    };
    Error::UnexpectedBody(format!("{} returned {}, expected {}", uri, got, expected))
}
