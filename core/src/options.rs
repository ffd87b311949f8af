//! Request options and the per-request accumulator they mutate.
//!
//! # Design
//! A `RequestOption` is a boxed `FnOnce(&mut RequestOptions)`. Options are
//! applied strictly left to right, so a later option always sees (and may
//! replace) what earlier ones configured. Body options store a deferred
//! `BodyFn` instead of a body: the last one applied wins, and its work
//! (JSON serialization, multipart encoding) only runs when the request is
//! assembled.
//!
//! Each dispatch starts from a deep copy of an immutable `RequestDefaults`,
//! so options never mutate state shared with another call.

use std::fmt;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::body::{self, Body, BodyFn};
use crate::context::Context;
use crate::error::{BoxError, Error};
use crate::file::FormFile;
use crate::header::Headers;
use crate::http::{HttpMethod, HttpRequest};
use crate::multipart::{self, Attachment};
use crate::query::Query;

const CONTENT_TYPE: &str = "content-type";

/// Callback run on the assembled request right before dispatch.
pub type Hook = Arc<dyn Fn(&mut HttpRequest) -> Result<(), BoxError> + Send + Sync>;

fn strip_trailing_slash(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// The base configuration every request starts from.
///
/// Immutable once built (see `ClientBuilder`); `RequestOptions::from_defaults`
/// deep-copies it, so per-request mutations never leak back.
#[derive(Clone, Default)]
pub struct RequestDefaults {
    pub(crate) base_url: Option<String>,
    pub(crate) headers: Headers,
    pub(crate) query: Query,
    pub(crate) timeout: Option<Duration>,
    pub(crate) hooks: Vec<Hook>,
}

impl RequestDefaults {
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Debug for RequestDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDefaults")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("timeout", &self.timeout)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// `content-type` that travels with a body strategy and is applied at
/// assembly, so a replaced strategy leaves no header behind.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BodyContentType {
    /// Used only when the caller set no content type.
    Fallback(&'static str),
    /// Always applied; the encoding depends on it.
    Fixed(String),
}

/// Mutable configuration for one outbound request.
pub struct RequestOptions {
    headers: Headers,
    query: Query,
    body: BodyFn,
    body_content_type: Option<BodyContentType>,
    context: Context,
    hooks: Vec<Hook>,
    base_url: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::from_defaults(&RequestDefaults::default())
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh accumulator seeded from a copy of `defaults`.
    pub fn from_defaults(defaults: &RequestDefaults) -> Self {
        let context = match defaults.timeout {
            Some(timeout) => Context::with_timeout(timeout),
            None => Context::background(),
        };
        Self {
            headers: defaults.headers.clone(),
            query: defaults.query.clone(),
            body: body::no_body(),
            body_content_type: None,
            context,
            hooks: defaults.hooks.clone(),
            base_url: defaults.base_url.clone(),
        }
    }

    /// Apply `options` in order.
    pub fn apply<I>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = RequestOption>,
    {
        for option in options {
            option.apply(self);
        }
        self
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Query {
        &mut self.query
    }

    pub fn set_query(&mut self, query: Query) {
        self.query = query;
    }

    /// Replace the body strategy. Runs once, during `build`.
    ///
    /// Also drops any content type a previous body option attached.
    pub fn set_body<F>(&mut self, strategy: F)
    where
        F: FnOnce() -> Result<Body, Error> + Send + 'static,
    {
        self.body = Box::new(strategy);
        self.body_content_type = None;
    }

    fn set_typed_body<F>(&mut self, strategy: F, content_type: BodyContentType)
    where
        F: FnOnce() -> Result<Body, Error> + Send + 'static,
    {
        self.set_body(strategy);
        self.body_content_type = Some(content_type);
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    pub fn add_hook(&mut self, hook: Hook) {
        self.hooks.push(hook);
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn set_base_url(&mut self, base_url: Option<&str>) {
        self.base_url = base_url.map(strip_trailing_slash);
    }

    /// `path` joined onto the base URL, or `path` unchanged without one.
    pub fn target_url(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{base}/{}", path.trim_start_matches('/')),
            None => path.to_string(),
        }
    }

    /// Assemble the request for `method` and `url`.
    ///
    /// Realizes the body and its content type, copies headers (a `host` header sets
    /// `HttpRequest::host` instead), appends encoded query parameters to any
    /// existing query string verbatim, then runs the hooks in order.
    pub fn build(self, method: HttpMethod, url: &str) -> Result<HttpRequest, Error> {
        let RequestOptions {
            mut headers,
            query,
            body,
            body_content_type,
            context,
            hooks,
            ..
        } = self;

        let body = body()?;
        log::trace!("realized body for {method} {url}: {body:?}");

        match body_content_type {
            Some(BodyContentType::Fixed(value)) => {
                headers.set(CONTENT_TYPE, value);
            }
            Some(BodyContentType::Fallback(value)) if !headers.contains(CONTENT_TYPE) => {
                headers.set(CONTENT_TYPE, value);
            }
            _ => {}
        }

        let mut parsed = Url::parse(url).map_err(|source| Error::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let host = headers.get_all("host").last().cloned();
        headers.delete("host");

        let params = query.encode();
        if !params.is_empty() {
            let merged = match parsed.query() {
                Some(existing) if !existing.is_empty() && !existing.ends_with('&') => {
                    format!("{existing}&{params}")
                }
                Some(existing) => format!("{existing}{params}"),
                None => params,
            };
            parsed.set_query(Some(&merged));
        }

        let mut request = HttpRequest {
            method,
            url: parsed,
            host,
            headers,
            body,
            context,
        };

        for hook in &hooks {
            hook(&mut request).map_err(Error::Hook)?;
        }

        Ok(request)
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("context", &self.context)
            .field("hooks", &self.hooks.len())
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// One configuration directive.
///
/// Build custom options with `RequestOption::new` and the public mutators on
/// `RequestOptions`.
pub struct RequestOption(Box<dyn FnOnce(&mut RequestOptions) + Send>);

impl RequestOption {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut RequestOptions) + Send + 'static,
    {
        RequestOption(Box::new(f))
    }

    pub fn apply(self, options: &mut RequestOptions) {
        (self.0)(options)
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestOption(..)")
    }
}

/// Replace the query parameters wholesale.
pub fn with_params(query: Query) -> RequestOption {
    RequestOption::new(move |o| o.set_query(query))
}

/// Adopt `headers`, or override existing headers name by name.
pub fn with_headers(headers: Headers) -> RequestOption {
    RequestOption::new(move |o| {
        if o.headers.is_empty() {
            o.headers = headers;
        } else {
            o.headers.override_with([&headers]);
        }
    })
}

/// Set all values of one header.
pub fn with_header<I, V>(name: &str, values: I) -> RequestOption
where
    I: IntoIterator<Item = V>,
    V: Into<String>,
{
    let name = name.to_string();
    let values: Vec<String> = values.into_iter().map(Into::into).collect();
    RequestOption::new(move |o| {
        o.headers.set_all(&name, values);
    })
}

/// JSON body, serialized when the request is assembled. Sets
/// `content-type: application/json` unless a content type is already set.
pub fn with_body_json<T>(value: T) -> RequestOption
where
    T: Serialize + Send + 'static,
{
    RequestOption::new(move |o| {
        o.set_typed_body(
            move || {
                serde_json::to_vec(&value)
                    .map(Body::from_bytes)
                    .map_err(Error::Serialization)
            },
            BodyContentType::Fallback("application/json"),
        );
    })
}

/// Raw bytes body; replayable.
pub fn with_body_bytes(bytes: impl Into<Vec<u8>>) -> RequestOption {
    let bytes = bytes.into();
    RequestOption::new(move |o| o.set_body(move || Ok(Body::from_bytes(bytes))))
}

/// Stream body, used verbatim. Cannot be replayed.
pub fn with_body_reader(reader: impl Read + Send + 'static) -> RequestOption {
    RequestOption::new(move |o| o.set_body(move || Ok(Body::from_reader(reader))))
}

/// `application/x-www-form-urlencoded` body from `fields`.
pub fn with_form_url_encoded(fields: Query) -> RequestOption {
    RequestOption::new(move |o| {
        o.set_typed_body(
            move || Ok(Body::from_bytes(fields.encode())),
            BodyContentType::Fixed("application/x-www-form-urlencoded".to_string()),
        );
    })
}

/// `multipart/form-data` body with text `fields` and named `files`.
///
/// Every file is closed exactly once: after its content is copied, when
/// encoding fails, or when this option is dropped or superseded unused.
pub fn with_form<I, K, F>(fields: Query, files: I) -> RequestOption
where
    I: IntoIterator<Item = (K, F)>,
    K: Into<String>,
    F: FormFile + 'static,
{
    let attachments: Vec<Attachment> = files
        .into_iter()
        .map(|(field, file)| Attachment::new(field.into(), Box::new(file)))
        .collect();
    RequestOption::new(move |o| {
        let boundary = multipart::new_boundary();
        let content_type = multipart::content_type(&boundary);
        o.set_typed_body(
            move || {
                multipart::encode_attachments(Vec::new(), &boundary, &fields, attachments)
                    .map(Body::from_bytes)
            },
            BodyContentType::Fixed(content_type),
        );
    })
}

pub fn with_context(context: Context) -> RequestOption {
    RequestOption::new(move |o| o.set_context(context))
}

/// Deadline `timeout` after the option is applied.
pub fn with_timeout(timeout: Duration) -> RequestOption {
    RequestOption::new(move |o| o.set_context(Context::with_timeout(timeout)))
}

/// Append a pre-send hook. Hooks run in registration order; the first error
/// aborts assembly and skips the rest.
pub fn with_on_before_request<F>(hook: F) -> RequestOption
where
    F: Fn(&mut HttpRequest) -> Result<(), BoxError> + Send + Sync + 'static,
{
    let hook: Hook = Arc::new(hook);
    RequestOption::new(move |o| o.add_hook(hook))
}

/// Per-request base URL, replacing the client's.
pub fn with_base_url(base_url: &str) -> RequestOption {
    let base_url = base_url.to_string();
    RequestOption::new(move |o| o.set_base_url(Some(&base_url)))
}
