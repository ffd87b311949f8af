//! Convenience wrapper around a transport response.
//!
//! The wrapper owns the body stream but never closes it on the caller's
//! behalf, except through `close_body_silently`.

use std::fmt;
use std::io::{self, Read, Write};
use std::ops::{Deref, DerefMut};

use serde::de::DeserializeOwned;

use crate::body::ReadClose;
use crate::error::Error;
use crate::header::Headers;
use crate::http::HttpResponse;

#[derive(Debug)]
pub struct Response {
    inner: HttpResponse,
}

impl Response {
    pub fn new(inner: HttpResponse) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> u16 {
        self.inner.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.inner.status)
    }

    pub fn headers(&self) -> &Headers {
        &self.inner.headers
    }

    pub fn body_mut(&mut self) -> &mut dyn ReadClose {
        self.inner.body.as_mut()
    }

    /// Read the rest of the body and deserialize it as JSON.
    ///
    /// A read failure is returned as `Error::Io` with the original error. The
    /// body is left open either way.
    pub fn json<T: DeserializeOwned>(&mut self) -> Result<T, Error> {
        let mut buf = Vec::new();
        self.inner.body.read_to_end(&mut buf)?;
        serde_json::from_slice(&buf).map_err(Error::Deserialization)
    }

    /// Read the rest of the body as UTF-8 text.
    pub fn text(&mut self) -> Result<String, Error> {
        let mut buf = String::new();
        self.inner.body.read_to_string(&mut buf)?;
        Ok(buf)
    }

    /// Copy the rest of the body into `sink`, returning the bytes copied.
    pub fn write_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> io::Result<u64> {
        io::copy(&mut self.inner.body, sink)
    }

    /// Close the body, ignoring any close error. Close the stream through
    /// `body_mut` instead when the error matters.
    pub fn close_body_silently(&mut self) {
        let _ = self.inner.body.close();
    }

    pub fn into_inner(self) -> HttpResponse {
        self.inner
    }
}

impl Deref for Response {
    type Target = HttpResponse;

    fn deref(&self) -> &HttpResponse {
        &self.inner
    }
}

impl DerefMut for Response {
    fn deref_mut(&mut self) -> &mut HttpResponse {
        &mut self.inner
    }
}

impl From<HttpResponse> for Response {
    fn from(inner: HttpResponse) -> Self {
        Self::new(inner)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.inner.status)?;
        for (name, value) in self.inner.headers.pairs() {
            write!(f, "\n{name}: {value}")?;
        }
        Ok(())
    }
}
