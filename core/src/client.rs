//! Client entry points and request dispatch.
//!
//! # Design
//! `Client` holds a transport and an immutable `RequestDefaults` snapshot and
//! carries no mutable state between calls. Every verb funnels into
//! `request`, which derives a fresh `RequestOptions` from the defaults,
//! applies the caller's options in order, resolves the target URL against the
//! base URL, assembles the request and hands it to the transport.
//! `build_request` stops before the transport, for callers that execute the
//! round-trip themselves.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{BoxError, Error};
use crate::header::Headers;
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::options::{Hook, RequestDefaults, RequestOption, RequestOptions};
use crate::query::Query;
use crate::response::Response;

/// Cheap to clone; clones share the transport and defaults.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    defaults: Arc<RequestDefaults>,
}

impl Client {
    pub fn new(transport: impl Transport + 'static) -> Self {
        ClientBuilder::new(transport).build()
    }

    /// Client that joins every request path onto `base_url`.
    pub fn with_base_url(transport: impl Transport + 'static, base_url: &str) -> Self {
        ClientBuilder::new(transport).base_url(base_url).build()
    }

    pub fn builder(transport: impl Transport + 'static) -> ClientBuilder {
        ClientBuilder::new(transport)
    }

    pub fn defaults(&self) -> &RequestDefaults {
        &self.defaults
    }

    pub fn base_url(&self) -> Option<&str> {
        self.defaults.base_url()
    }

    /// Assemble a request without sending it.
    pub fn build_request<I>(&self, method: HttpMethod, url: &str, options: I) -> Result<HttpRequest, Error>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let mut opts = RequestOptions::from_defaults(&self.defaults);
        opts.apply(options);
        let target = opts.target_url(url);
        opts.build(method, &target)
    }

    /// Assemble and send a request, wrapping the transport's response.
    pub fn request<I>(&self, method: HttpMethod, url: &str, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let request = self.build_request(method, url, options)?;
        log::debug!("sending {} {}", request.method, request.url);
        let response = self.transport.execute(request).map_err(Error::Transport)?;
        log::debug!("received {} for {method} {url}", response.status);
        Ok(Response::new(response))
    }

    pub fn get<I>(&self, url: &str, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.request(HttpMethod::Get, url, options)
    }

    pub fn post<I>(&self, url: &str, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.request(HttpMethod::Post, url, options)
    }

    pub fn put<I>(&self, url: &str, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.request(HttpMethod::Put, url, options)
    }

    pub fn patch<I>(&self, url: &str, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.request(HttpMethod::Patch, url, options)
    }

    pub fn delete<I>(&self, url: &str, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.request(HttpMethod::Delete, url, options)
    }

    pub fn head<I>(&self, url: &str, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.request(HttpMethod::Head, url, options)
    }

    pub fn options<I>(&self, url: &str, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.request(HttpMethod::Options, url, options)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// Configures the defaults every request of a `Client` starts from.
pub struct ClientBuilder {
    transport: Arc<dyn Transport>,
    defaults: RequestDefaults,
}

impl ClientBuilder {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            defaults: RequestDefaults::default(),
        }
    }

    /// Trailing slashes are stripped.
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.defaults.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.defaults.headers.add(name, value);
        self
    }

    pub fn headers(mut self, headers: &Headers) -> Self {
        self.defaults.headers.override_with([headers]);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.query.add(key, value);
        self
    }

    pub fn params(mut self, query: Query) -> Self {
        self.defaults.query = query;
        self
    }

    /// Each request gets its own deadline `timeout` after it starts.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = Some(timeout);
        self
    }

    pub fn on_before_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut HttpRequest) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let hook: Hook = Arc::new(hook);
        self.defaults.hooks.push(hook);
        self
    }

    pub fn build(self) -> Client {
        Client {
            transport: self.transport,
            defaults: Arc::new(self.defaults),
        }
    }
}
