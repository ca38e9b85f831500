use serde_json::Value;
use std::iter::FusedIterator;
use tracing::debug;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::params::{Param, Params};
use crate::request::DEFAULT_ORDER;
use crate::transport::Transport;

/// Page size used when the caller does not pass a `limit`.
pub const DEFAULT_LIMIT: u64 = 1000;

/// Paging state carried from one page request to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub offset: u64,
    pub limit: u64,
    pub order: String,
}

#[derive(Debug)]
enum State {
    AwaitingPage,
    HasPage {
        records: std::vec::IntoIter<Value>,
        last: bool,
    },
    Exhausted,
}

/// Every record of a dataset, fetched one page at a time.
///
/// The next page is requested only once the current one has been consumed, so dropping the
/// iterator early issues no further requests. A page shorter than the limit ends the sequence.
/// A failed request is yielded once as `Err` and ends the sequence; records already yielded
/// stay valid.
pub struct Pages<'c, T: Transport> {
    client: &'c Client<T>,
    dataset_id: String,
    params: Params,
    cursor: PageCursor,
    state: State,
}

fn count_param(params: &Params, name: &str) -> Result<Option<u64>> {
    let invalid = || {
        Error::InvalidArgument(format!(
            "option `{}` must be a non-negative integer",
            name
        ))
    };
    match params.get(name) {
        None | Some(Param::Null) => Ok(None),
        Some(Param::Int(n)) => u64::try_from(*n).map(Some).map_err(|_| invalid()),
        Some(Param::Text(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

impl<'c, T: Transport> Pages<'c, T> {
    pub(crate) fn new(client: &'c Client<T>, dataset_id: &str, params: &Params) -> Result<Self> {
        if params.get("query").is_some_and(|v| !v.is_null()) {
            return Err(Error::InvalidArgument(
                "a full `query` cannot be paged; use select/where/order instead".to_string(),
            ));
        }

        let offset = count_param(params, "offset")?.unwrap_or(0);
        let limit = count_param(params, "limit")?.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(Error::InvalidArgument(
                "option `limit` must be positive when paging".to_string(),
            ));
        }
        let order = match params.get("order") {
            None | Some(Param::Null) => DEFAULT_ORDER.to_string(),
            Some(v) => v.as_scalar().ok_or_else(|| {
                Error::InvalidArgument("option `order` takes a single value".to_string())
            })?,
        };

        let mut params = params.clone();
        params.remove("offset");
        params.remove("limit");
        params.remove("order");

        let pages = Self {
            client,
            dataset_id: dataset_id.to_string(),
            params,
            cursor: PageCursor {
                offset,
                limit,
                order,
            },
            state: State::AwaitingPage,
        };
        // Option errors are reported here, before any request.
        crate::request::row_query(&pages.dataset_id, crate::Format::Json, &pages.page_params())?;
        Ok(pages)
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    fn page_params(&self) -> Params {
        let mut params = self.params.clone();
        params.insert("order", self.cursor.order.as_str());
        params.insert("limit", self.cursor.limit.to_string());
        params.insert("offset", self.cursor.offset.to_string());
        params
    }

    fn fetch(&mut self) -> Result<State> {
        let records = self
            .client
            .fetch_records(&self.dataset_id, &self.page_params())?;
        let count = records.len() as u64;
        debug!(
            dataset = %self.dataset_id,
            offset = self.cursor.offset,
            limit = self.cursor.limit,
            records = count,
            "Fetched page"
        );

        let last = count < self.cursor.limit;
        if !last {
            self.cursor.offset += count;
        }
        Ok(State::HasPage {
            records: records.into_iter(),
            last,
        })
    }
}

impl<T: Transport> Iterator for Pages<'_, T> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                State::Exhausted => return None,
                State::HasPage { records, last } => {
                    if let Some(record) = records.next() {
                        return Some(Ok(record));
                    }
                    let last = *last;
                    self.state = if last {
                        State::Exhausted
                    } else {
                        State::AwaitingPage
                    };
                }
                State::AwaitingPage => match self.fetch() {
                    Ok(state) => self.state = state,
                    Err(e) => {
                        self.state = State::Exhausted;
                        return Some(Err(e));
                    }
                },
            }
        }
    }
}

impl<T: Transport> FusedIterator for Pages<'_, T> {}
