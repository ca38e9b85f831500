//! Turns a logical call plus its [`Params`] into the path, headers and query string sent to the
//! host. Everything here is pure; nothing touches the network, so every rejection happens
//! before a request exists.

use crate::error::{Error, Result};
use crate::format::{Endpoint, Format};
use crate::params::{Param, Params};

/// Row query options and the SoQL parameter each one maps to.
pub(crate) const ROW_QUERY_OPTIONS: [(&str, &str); 9] = [
    ("select", "$select"),
    ("where", "$where"),
    ("order", "$order"),
    ("group", "$group"),
    ("limit", "$limit"),
    ("offset", "$offset"),
    ("q", "$q"),
    ("query", "$query"),
    ("exclude_system_fields", "$$exclude_system_fields"),
];

/// Ordering applied to row queries that do not choose one, so pages stay stable.
pub const DEFAULT_ORDER: &str = ":id";

/// Discovery filters that may be given several times.
pub(crate) const DISCOVERY_REPEATABLE: [&str; 7] = [
    "ids",
    "domains",
    "categories",
    "tags",
    "only",
    "shared_to",
    "column_names",
];

pub(crate) const DISCOVERY_SINGLE: [&str; 16] = [
    "q",
    "min_should_match",
    "attribution",
    "license",
    "derived_from",
    "provenance",
    "for_user",
    "visibility",
    "public",
    "published",
    "approval_status",
    "explicitly_hidden",
    "derived",
    "limit",
    "offset",
    "order",
];

/// Fields the catalog can sort on.
pub(crate) const DISCOVERY_ORDER_FIELDS: [&str; 11] = [
    "relevance",
    "name",
    "owner",
    "dataset_id",
    "datatype",
    "domain_category",
    "createdAt",
    "updatedAt",
    "page_views_total",
    "page_views_last_month",
    "page_views_last_week",
];

/// A request described as plain data, relative to the configured host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl Request {
    fn get(path: String) -> Self {
        Self {
            path,
            headers: Vec::new(),
            query: Vec::new(),
        }
    }
}

/// Drops `Null` options. Empty strings survive.
pub fn prune(params: &Params) -> Vec<(&str, &Param)> {
    params.iter().filter(|(_, v)| !v.is_null()).collect()
}

fn reject_unknown<'a>(
    params: &'a Params,
    known: impl Fn(&str) -> bool,
    operation: &str,
) -> Result<()> {
    let mut unknown: Vec<&'a str> = params
        .iter()
        .map(|(k, _)| k)
        .filter(|k| !known(k))
        .collect();
    if unknown.is_empty() {
        return Ok(());
    }
    unknown.sort_unstable();
    Err(Error::InvalidArgument(format!(
        "unexpected {} option(s): {}",
        operation,
        unknown.join(", ")
    )))
}

fn scalar(name: &str, value: &Param) -> Result<String> {
    value.as_scalar().ok_or_else(|| {
        Error::InvalidArgument(format!(
            "option `{}` takes a single value, got a {}",
            name,
            value.kind()
        ))
    })
}

fn check_dataset_id(dataset_id: &str) -> Result<()> {
    if dataset_id.is_empty() || dataset_id.contains(['/', '?', '#']) {
        return Err(Error::InvalidArgument(format!(
            "invalid dataset id `{}`",
            dataset_id
        )));
    }
    Ok(())
}

/// Builds `GET /resource/{dataset_id}`.
///
/// SoQL options are sent with their `$` prefix, column filters unprefixed after them. Unless
/// the caller sets `order` (an empty string included) or passes a full `query`, rows are
/// ordered by [`DEFAULT_ORDER`].
pub fn row_query(dataset_id: &str, format: Format, params: &Params) -> Result<Request> {
    check_dataset_id(dataset_id)?;
    reject_unknown(
        params,
        |k| ROW_QUERY_OPTIONS.iter().any(|(name, _)| *name == k),
        "row query",
    )?;

    let mut req = Request::get(format!("{}/{}", Endpoint::Dataset.path(), dataset_id));
    req.headers
        .push(("Accept".to_string(), format.mimetype().to_string()));

    let full_query = params.get("query").is_some_and(|v| !v.is_null());
    for (name, soql) in ROW_QUERY_OPTIONS {
        match params.get(name) {
            Some(Param::Null) | None if name == "order" && !full_query => req
                .query
                .push((soql.to_string(), DEFAULT_ORDER.to_string())),
            Some(Param::Null) | None => {}
            Some(value) => req.query.push((soql.to_string(), scalar(name, value)?)),
        }
    }

    for (column, value) in params.filters() {
        if column.is_empty() || column.starts_with('$') {
            return Err(Error::InvalidArgument(format!(
                "invalid column filter name `{}`",
                column
            )));
        }
        req.query.push((column.clone(), value.clone()));
    }

    Ok(req)
}

fn check_order(order: &str) -> Result<()> {
    let field = order
        .strip_suffix(" ASC")
        .or_else(|| order.strip_suffix(" DESC"))
        .unwrap_or(order);
    if DISCOVERY_ORDER_FIELDS.contains(&field) {
        return Ok(());
    }
    Err(Error::InvalidArgument(format!(
        "order must be one of: {} (optionally followed by ` ASC` or ` DESC`), got `{}`",
        DISCOVERY_ORDER_FIELDS.join(", "),
        order
    )))
}

/// Builds `GET /api/catalog/v1`. The configured `domain` always leads the `domains` filter.
pub fn discovery(domain: &str, params: &Params) -> Result<Request> {
    reject_unknown(
        params,
        |k| DISCOVERY_REPEATABLE.contains(&k) || DISCOVERY_SINGLE.contains(&k),
        "discovery",
    )?;
    if !params.filters().is_empty() {
        return Err(Error::InvalidArgument(
            "column filters only apply to row queries".to_string(),
        ));
    }

    let mut req = Request::get(Endpoint::Discovery.path().to_string());
    req.query.push(("domains".to_string(), domain.to_string()));

    for (name, value) in prune(params) {
        if DISCOVERY_REPEATABLE.contains(&name) {
            let Param::List(items) = value else {
                return Err(Error::InvalidArgument(format!(
                    "option `{}` takes a list, got a {}",
                    name,
                    value.kind()
                )));
            };
            for item in items {
                req.query.push((name.to_string(), item.clone()));
            }
        } else {
            let value = scalar(name, value)?;
            if name == "order" {
                check_order(&value)?;
            }
            req.query.push((name.to_string(), value));
        }
    }

    Ok(req)
}

/// Builds `GET /api/views/metadata/v1[/{dataset_id}]`.
pub fn metadata(dataset_id: Option<&str>) -> Result<Request> {
    let path = match dataset_id {
        Some(id) => {
            check_dataset_id(id)?;
            format!("{}/{}", Endpoint::Metadata.path(), id)
        }
        None => Endpoint::Metadata.path().to_string(),
    };
    Ok(Request::get(path))
}
