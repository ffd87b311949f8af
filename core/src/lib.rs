//! Composable HTTP request building over a pluggable transport.
//!
//! # Overview
//! A `Client` turns a method, a URL and an ordered list of `RequestOption`s
//! into an `HttpRequest`, hands it to a caller-supplied `Transport`, and
//! wraps what comes back in a `Response`. The network I/O itself (pooling,
//! TLS, retries, redirects, timeouts) stays with the transport.
//!
//! # Design
//! - Options are closures over a per-request `RequestOptions` accumulator,
//!   applied left to right; later options override earlier ones.
//! - Bodies are deferred thunks realized once during assembly; the last body
//!   option wins.
//! - Every request starts from a copy of the client's immutable
//!   `RequestDefaults`, so concurrent calls never share mutable state.
//! - `Client::build_request` stops before the transport for callers that
//!   execute the round-trip themselves.
//!
//! ```no_run
//! use requests_core::{with_body_json, with_header, Client, HttpRequest, HttpResponse, BoxError};
//!
//! fn send(_req: HttpRequest) -> Result<HttpResponse, BoxError> {
//!     unimplemented!("plug a real HTTP client in here")
//! }
//!
//! let client = Client::with_base_url(send, "http://localhost:3000");
//! let mut resp = client
//!     .post(
//!         "/todos",
//!         [
//!             with_header("x-request-id", ["42"]),
//!             with_body_json(serde_json::json!({"title": "Buy milk"})),
//!         ],
//!     )
//!     .unwrap();
//! let created: serde_json::Value = resp.json().unwrap();
//! # let _ = created;
//! ```

pub mod body;
pub mod client;
pub mod context;
pub mod error;
pub mod file;
pub mod header;
pub mod http;
mod multipart;
pub mod options;
pub mod query;
pub mod response;

pub use body::{Body, BodyFn, Closable, ReadClose};
pub use client::{Client, ClientBuilder};
pub use context::Context;
pub use error::{BoxError, Error};
pub use file::{FormFile, RequestFile};
pub use header::Headers;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use options::{
    with_base_url, with_body_bytes, with_body_json, with_body_reader, with_context, with_form,
    with_form_url_encoded, with_header, with_headers, with_on_before_request, with_params,
    with_timeout, Hook, RequestDefaults, RequestOption, RequestOptions,
};
pub use query::Query;
pub use response::Response;
