use serde_json::Value;

use crate::error::{Error, Result};

/// Decoding strategies, picked from a response content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `application/json` and `application/vnd.geo+json`.
    Json,
    Csv,
    /// Returned undecoded.
    RdfXml,
    /// JSON if it parses, the raw text otherwise.
    PlainText,
}

impl ContentKind {
    /// Classifies a `Content-Type` header value, ignoring case and parameters such as `charset`.
    pub fn classify(content_type: &str) -> Option<Self> {
        match normalize(content_type).as_str() {
            "application/json" | "application/vnd.geo+json" => Some(ContentKind::Json),
            "text/csv" => Some(ContentKind::Csv),
            "application/rdf+xml" => Some(ContentKind::RdfXml),
            "text/plain" => Some(ContentKind::PlainText),
            _ => None,
        }
    }
}

/// Lower-cased media type without parameters.
pub fn normalize(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Successful response without content.
    Empty,
    Json(Value),
    /// CSV rows; the first row is the header.
    Rows(Vec<Vec<String>>),
    Bytes(Vec<u8>),
    Text(String),
}

impl Body {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Body::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Records of a JSON array body. An empty body is an empty page.
    pub fn into_records(self) -> Result<Vec<Value>> {
        match self {
            Body::Empty => Ok(Vec::new()),
            Body::Json(Value::Array(records)) => Ok(records),
            Body::Json(other) => Err(Error::UnexpectedBody(format!(
                "expected a JSON array of records, got {}",
                json_kind(&other)
            ))),
            Body::Rows(_) => Err(Error::UnexpectedBody(
                "expected JSON records, got CSV rows".to_string(),
            )),
            Body::Bytes(_) | Body::Text(_) => Err(Error::UnexpectedBody(
                "expected JSON records, got an undecoded body".to_string(),
            )),
        }
    }
}

pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decodes a successful response body. An empty body short-circuits to [`Body::Empty`]
/// whatever the content type says.
pub fn decode(content_type: &str, body: Vec<u8>) -> Result<Body> {
    if body.is_empty() {
        return Ok(Body::Empty);
    }

    let kind = ContentKind::classify(content_type)
        .ok_or_else(|| Error::UnknownFormat(normalize(content_type)))?;

    match kind {
        ContentKind::Json => Ok(Body::Json(serde_json::from_slice(&body)?)),
        ContentKind::Csv => decode_csv(&body).map(Body::Rows),
        ContentKind::RdfXml => Ok(Body::Bytes(body)),
        ContentKind::PlainText => match serde_json::from_slice(&body) {
            Ok(v) => Ok(Body::Json(v)),
            Err(_) => Ok(Body::Text(String::from_utf8_lossy(&body).into_owned())),
        },
    }
}

fn decode_csv(body: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}
