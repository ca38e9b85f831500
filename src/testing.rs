//! Recording in-memory transport and log capture for unit tests.

use reqwest::Url;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};

type Reply = std::result::Result<HttpResponse, String>;

#[derive(Debug, Default)]
struct Shared {
    replies: VecDeque<Reply>,
    requests: Vec<HttpRequest>,
    closes: usize,
}

/// Replays queued responses in order and records every request. Clones share state, so a
/// test can keep one handle while the client owns another.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTransport {
    shared: Rc<RefCell<Shared>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, resp: HttpResponse) {
        self.shared.borrow_mut().replies.push_back(Ok(resp));
    }

    pub(crate) fn fail(&self, msg: &str) {
        self.shared.borrow_mut().replies.push_back(Err(msg.to_string()));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.shared.borrow().requests.clone()
    }

    pub(crate) fn closes(&self) -> usize {
        self.shared.borrow().closes
    }
}

impl Transport for MockTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut shared = self.shared.borrow_mut();
        shared.requests.push(request.clone());
        let reply = shared
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(format!("no response queued for {}", request.url)))
            .map_err(|msg| Error::Transport(msg.into()))?;

        let url = Url::parse_with_params(&request.url, &request.query)
            .map(String::from)
            .unwrap_or_else(|_| request.url.clone());
        Ok(HttpResponse { url, ..reply })
    }

    fn close(&mut self) {
        self.shared.borrow_mut().closes += 1;
    }
}

impl HttpRequest {
    /// Value of the first query parameter named `name`.
    pub(crate) fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

pub(crate) fn plain(status: u16, reason: &str, content_type: &str, body: &str) -> HttpResponse {
    let headers = if content_type.is_empty() {
        Vec::new()
    } else {
        vec![("content-type".to_string(), content_type.to_string())]
    };
    HttpResponse {
        status,
        reason: reason.to_string(),
        url: String::new(),
        headers,
        body: body.as_bytes().to_vec(),
    }
}

pub(crate) fn json_page(body: &serde_json::Value) -> HttpResponse {
    plain(200, "OK", "application/json; charset=utf-8", &body.to_string())
}

/// In-memory sink for `tracing` output, shared between the subscriber and the test.
#[derive(Clone, Default)]
pub(crate) struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Runs `f` with a plain-text `fmt` subscriber writing into this capture.
    pub(crate) fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
