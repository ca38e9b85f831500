//! A small blocking Rust client for Socrata Open Data (SODA) APIs.
//!
//! This crate implements a `sodapy`-style flow:
//! build a SoQL query, fetch rows (one page or all of them, lazily), search the catalog, and
//! read dataset metadata. Responses are decoded by content type into JSON values, CSV rows,
//! raw bytes or text.
//!
//! ## Quick start
//! - Pass the host directly, or configure it via environment variables (`SODAPY_DOMAIN`,
//!   `SODAPY_APPTOKEN`) or a `.sodapyrc` file (current directory or home directory).
//! - Call [`Client::get`] for a single page or [`Client::get_all`] to walk a whole dataset.
//!
//! ```no_run
//! use sodapi::{Client, Params};
//!
//! fn main() -> sodapi::Result<()> {
//!     let client = Client::new("data.cityofnewyork.us", Some("MyAppToken"))?;
//!     let params = Params::new()
//!         .set("select", "animalname, breedname")
//!         .set("where", "animalbirth > 2015");
//!     for record in client.get_all("nu7n-tubp", &params)?.take(5000) {
//!         println!("{}", record?);
//!     }
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! For full usage and configuration details, see the crate README.

#![forbid(unsafe_code)]

mod client;
mod config;
mod decode;
mod error;
mod format;
mod paging;
mod params;
pub mod request;
#[cfg(test)]
mod testing;
mod transport;

pub use client::{Client, Metadata, Response};
pub use config::ClientConfig;
pub use decode::{Body, ContentKind};
pub use error::{Error, Result, SodaHttpError};
pub use format::{Endpoint, Format};
pub use paging::{DEFAULT_LIMIT, PageCursor, Pages};
pub use params::{Param, Params};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
