//! Named attachments for multipart form bodies.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::body::{Closable, ReadClose};

/// A closable byte stream with the file name sent in `Content-Disposition`.
///
/// Ownership passes to the multipart body strategy, which calls `close`
/// exactly once after copying the content, including when encoding fails.
pub trait FormFile: ReadClose {
    fn name(&self) -> &str;
}

/// The stock `FormFile`: a name plus any reader.
pub struct RequestFile {
    name: String,
    inner: Box<dyn ReadClose>,
}

impl RequestFile {
    pub fn new(name: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self {
            name: name.into(),
            inner: Box::new(Closable::new(reader)),
        }
    }

    /// Use a stream that has its own close behaviour.
    pub fn from_read_close(name: impl Into<String>, stream: impl ReadClose + 'static) -> Self {
        Self {
            name: name.into(),
            inner: Box::new(stream),
        }
    }

    /// Open `path` for reading, naming the attachment after its file name.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = fs::File::open(path)?;
        Ok(Self::new(name, file))
    }
}

impl Read for RequestFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl ReadClose for RequestFile {
    fn close(&mut self) -> io::Result<()> {
        self.inner.close()
    }
}

impl FormFile for RequestFile {
    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for RequestFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestFile").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_file_reads_then_closes() {
        let mut file = RequestFile::new("a.txt", Cursor::new(b"hello".to_vec()));
        assert_eq!(file.name(), "a.txt");
        let mut buf = String::new();
        file.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "hello");
        file.close().unwrap();
    }

    #[test]
    fn open_names_file_after_path() {
        let path = std::env::temp_dir().join(format!("requests-core-{}.txt", std::process::id()));
        fs::write(&path, b"on disk").unwrap();
        let mut file = RequestFile::open(&path).unwrap();
        assert_eq!(file.name(), path.file_name().unwrap().to_str().unwrap());
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"on disk");
        file.close().unwrap();
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn open_missing_file_fails() {
        assert!(RequestFile::open("/definitely/not/here.bin").is_err());
    }
}
