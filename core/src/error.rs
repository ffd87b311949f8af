//! Error types for request assembly, dispatch and response decoding.
//!
//! # Design
//! Every stage of the pipeline reports through one enum so callers can match
//! on where a call failed. Errors raised by collaborators (transport, hooks,
//! custom body strategies) are kept boxed and exposed via `source()` rather
//! than flattened into strings, so the original error can be downcast.

use std::fmt;
use std::io;

/// Boxed error used at the seams where callers supply their own code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `Client`, `RequestOptions::build` and `Response`.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A JSON body could not be serialized while realizing the request body.
    Serialization(serde_json::Error),

    /// A response body could not be deserialized into the requested type.
    Deserialization(serde_json::Error),

    /// The target URL (after base URL joining) did not parse.
    InvalidUrl { url: String, source: url::ParseError },

    /// Reading or writing a body stream failed.
    Io(io::Error),

    /// A caller-supplied body strategy failed.
    Body(BoxError),

    /// A pre-send hook rejected the request. Later hooks did not run.
    Hook(BoxError),

    /// The transport failed. Passed through untouched.
    Transport(BoxError),
}

impl Error {
    /// Wrap an arbitrary error raised by a custom body strategy.
    pub fn body(err: impl Into<BoxError>) -> Self {
        Error::Body(err.into())
    }

    /// True when the transport was reached, i.e. assembly succeeded.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Serialization(e) => write!(f, "serialization failed: {e}"),
            Error::Deserialization(e) => write!(f, "deserialization failed: {e}"),
            Error::InvalidUrl { url, source } => write!(f, "invalid url {url:?}: {source}"),
            Error::Io(e) => write!(f, "body i/o failed: {e}"),
            Error::Body(e) => write!(f, "body strategy failed: {e}"),
            Error::Hook(e) => write!(f, "before-request hook failed: {e}"),
            Error::Transport(e) => write!(f, "transport failed: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Serialization(e) | Error::Deserialization(e) => Some(e),
            Error::InvalidUrl { source, .. } => Some(source),
            Error::Io(e) => Some(e),
            Error::Body(e) | Error::Hook(e) | Error::Transport(e) => Some(e.as_ref()),
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::Io(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn transport_error_keeps_source() {
        let inner: BoxError = "connection refused".into();
        let err = Error::Transport(inner);
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "transport failed: connection refused");
        assert_eq!(err.source().unwrap().to_string(), "connection refused");
    }

    #[test]
    fn io_error_converts() {
        let err: Error = io::Error::new(io::ErrorKind::UnexpectedEof, "short read").into();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_url_display_names_url() {
        let source = url::Url::parse("not a url").unwrap_err();
        let err = Error::InvalidUrl {
            url: "not a url".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("invalid url \"not a url\""));
        assert!(!err.is_transport());
    }
}
