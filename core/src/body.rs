//! Request payloads and closable byte streams.
//!
//! # Design
//! A request body is realized lazily: options store a `BodyFn` thunk and the
//! assembler calls it exactly once. The realized `Body` remembers whether it
//! is backed by owned bytes (and can be replayed) or by a caller stream
//! (consumed on first read).
//!
//! `ReadClose` is the closable-stream abstraction shared by multipart file
//! attachments and raw response bodies; closing is explicit so the
//! "closed exactly once" contract can be observed.

use std::fmt;
use std::io::{self, Cursor, Read};

use crate::error::Error;

/// Deferred body construction, invoked once during assembly.
pub type BodyFn = Box<dyn FnOnce() -> Result<Body, Error> + Send>;

/// A readable stream with an explicit close.
pub trait ReadClose: Read + Send {
    /// Release the underlying resource. Reads after a close return EOF.
    fn close(&mut self) -> io::Result<()>;
}

impl ReadClose for Box<dyn ReadClose> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Adapts any `Read` into a `ReadClose` whose close drops the reader.
pub struct Closable<R> {
    inner: Option<R>,
}

impl<R: Read + Send> Closable<R> {
    pub fn new(inner: R) -> Self {
        Self { inner: Some(inner) }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl<R: Read + Send> Read for Closable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.as_mut() {
            Some(r) => r.read(buf),
            None => Ok(0),
        }
    }
}

impl<R: Read + Send> ReadClose for Closable<R> {
    fn close(&mut self) -> io::Result<()> {
        self.inner = None;
        Ok(())
    }
}

impl<R> fmt::Debug for Closable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closable")
            .field("closed", &self.inner.is_none())
            .finish()
    }
}

/// The realized request payload.
#[derive(Default)]
pub enum Body {
    #[default]
    Empty,
    /// Owned bytes; can be replayed with `try_clone`.
    Bytes(Cursor<Vec<u8>>),
    /// Caller stream, consumed by the first read.
    Reader(Box<dyn Read + Send>),
}

impl Body {
    pub fn empty() -> Self {
        Body::Empty
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Body::Bytes(Cursor::new(bytes.into()))
    }

    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Body::Reader(Box::new(reader))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Bytes(c) => c.get_ref().is_empty(),
            Body::Reader(_) => false,
        }
    }

    /// Known length, `None` for streams.
    pub fn len(&self) -> Option<u64> {
        match self {
            Body::Empty => Some(0),
            Body::Bytes(c) => Some(c.get_ref().len() as u64),
            Body::Reader(_) => None,
        }
    }

    /// Whether the body can be sent again, e.g. by a retrying transport.
    pub fn is_reusable(&self) -> bool {
        !matches!(self, Body::Reader(_))
    }

    /// A fresh copy from the start, for reusable bodies only.
    pub fn try_clone(&self) -> Option<Body> {
        match self {
            Body::Empty => Some(Body::Empty),
            Body::Bytes(c) => Some(Body::from_bytes(c.get_ref().clone())),
            Body::Reader(_) => None,
        }
    }

    /// Drain the remaining payload.
    pub fn read_to_vec(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Body::Empty => Ok(0),
            Body::Bytes(c) => c.read(buf),
            Body::Reader(r) => r.read(buf),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => write!(f, "Body::Empty"),
            Body::Bytes(c) => write!(f, "Body::Bytes({} bytes)", c.get_ref().len()),
            Body::Reader(_) => write!(f, "Body::Reader(..)"),
        }
    }
}

/// Strategy used when no body option was applied.
pub(crate) fn no_body() -> BodyFn {
    Box::new(|| Ok(Body::Empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_body_is_reusable() {
        let mut body = Body::from_bytes(b"name".to_vec());
        assert_eq!(body.len(), Some(4));
        let mut copy = body.try_clone().unwrap();
        assert_eq!(body.read_to_vec().unwrap(), b"name");
        assert_eq!(copy.read_to_vec().unwrap(), b"name");
    }

    #[test]
    fn reader_body_is_one_shot() {
        let mut body = Body::from_reader(Cursor::new(vec![1u8, 2, 12]));
        assert!(!body.is_reusable());
        assert!(body.try_clone().is_none());
        assert_eq!(body.len(), None);
        assert_eq!(body.read_to_vec().unwrap(), vec![1, 2, 12]);
        assert!(body.read_to_vec().unwrap().is_empty());
    }

    #[test]
    fn empty_bytes_count_as_empty() {
        assert!(Body::from_bytes(Vec::new()).is_empty());
        assert!(Body::empty().is_empty());
        assert!(matches!(Body::default(), Body::Empty));
        assert!(!Body::from_reader(io::empty()).is_empty());
    }

    #[test]
    fn closable_reads_nothing_after_close() {
        let mut c = Closable::new(Cursor::new(b"abc".to_vec()));
        let mut one = [0u8; 1];
        assert_eq!(c.read(&mut one).unwrap(), 1);
        c.close().unwrap();
        assert!(c.is_closed());
        assert_eq!(c.read(&mut one).unwrap(), 0);
    }
}
