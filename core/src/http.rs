//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! The core assembles `HttpRequest` values and wraps `HttpResponse` values
//! without touching the network. A `Transport` implementation (supplied by
//! the caller) performs the actual I/O, including any pooling, TLS, retries
//! and redirect handling, and is expected to honor the request `Context`.

use std::fmt;

use url::Url;

use crate::body::{Body, ReadClose};
use crate::context::Context;
use crate::error::BoxError;
use crate::header::Headers;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully assembled request, ready for a `Transport`.
///
/// Built by `RequestOptions::build` (usually via `Client`). `host` is set
/// when a `host` header was supplied; the transport should use it as the
/// target host instead of the URL's authority.
#[derive(Debug)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub host: Option<String>,
    pub headers: Headers,
    pub body: Body,
    pub context: Context,
}

/// A raw response as returned by the transport.
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Box<dyn ReadClose>,
}

impl HttpResponse {
    pub fn new(status: u16, headers: Headers, body: impl ReadClose + 'static) -> Self {
        Self {
            status,
            headers,
            body: Box::new(body),
        }
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Performs the network round-trip for an assembled request.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

impl<F> Transport for F
where
    F: Fn(HttpRequest) -> Result<HttpResponse, BoxError> + Send + Sync,
{
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        self(request)
    }
}
