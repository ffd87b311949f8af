//! multipart/form-data encoding.
//!
//! # Design
//! The encoder writes into any `Write`, so the body strategy can encode into
//! a `Vec<u8>` while tests can inject a failing sink. Every attachment is
//! wrapped in a drop guard as soon as it is handed over: it is closed
//! explicitly after its content is copied, and the guard closes whatever is
//! left when an error unwinds the loop or the encode never runs. Either way
//! each file is closed once.

use std::io::{self, Write};

use uuid::Uuid;

use crate::error::Error;
use crate::file::FormFile;
use crate::query::Query;

/// A random boundary token, safe to use unquoted.
pub(crate) fn new_boundary() -> String {
    Uuid::new_v4().simple().to_string()
}

/// `Content-Type` value announcing `boundary`.
pub(crate) fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Low-level part writer.
pub(crate) struct MultipartWriter<W> {
    w: W,
    boundary: String,
    wrote_part: bool,
}

impl<W: Write> MultipartWriter<W> {
    pub(crate) fn new(w: W, boundary: impl Into<String>) -> Self {
        Self {
            w,
            boundary: boundary.into(),
            wrote_part: false,
        }
    }

    fn begin_part(&mut self, headers: &[(&str, String)]) -> io::Result<()> {
        if self.wrote_part {
            write!(self.w, "\r\n--{}\r\n", self.boundary)?;
        } else {
            write!(self.w, "--{}\r\n", self.boundary)?;
        }
        self.wrote_part = true;
        for (name, value) in headers {
            write!(self.w, "{name}: {value}\r\n")?;
        }
        self.w.write_all(b"\r\n")
    }

    pub(crate) fn write_field(&mut self, name: &str, value: &str) -> io::Result<()> {
        let disposition = format!("form-data; name=\"{}\"", escape_quotes(name));
        self.begin_part(&[("Content-Disposition", disposition)])?;
        self.w.write_all(value.as_bytes())
    }

    /// Copy the whole of `file` into a new part. Does not close it.
    pub(crate) fn write_file(&mut self, field: &str, file: &mut dyn FormFile) -> io::Result<u64> {
        let disposition = format!(
            "form-data; name=\"{}\"; filename=\"{}\"",
            escape_quotes(field),
            escape_quotes(file.name())
        );
        self.begin_part(&[
            ("Content-Disposition", disposition),
            ("Content-Type", "application/octet-stream".to_string()),
        ])?;
        io::copy(file, &mut self.w)
    }

    /// Write the closing delimiter and hand back the sink.
    pub(crate) fn finish(mut self) -> io::Result<W> {
        write!(self.w, "\r\n--{}--\r\n", self.boundary)?;
        self.w.flush()?;
        Ok(self.w)
    }
}

/// A form file bound to its field name. Closed when dropped unless it was
/// closed explicitly first, so a superseded or failed encode never leaks it.
pub(crate) struct Attachment {
    field: String,
    file: Option<Box<dyn FormFile>>,
}

impl Attachment {
    pub(crate) fn new(field: String, file: Box<dyn FormFile>) -> Self {
        Self {
            field,
            file: Some(file),
        }
    }

    fn close(mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => file.close(),
            None => Ok(()),
        }
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.close();
        }
    }
}

/// Encode `fields` then `attachments` into `w`. All files are closed on return.
pub(crate) fn encode_attachments<W: Write>(
    w: W,
    boundary: &str,
    fields: &Query,
    attachments: Vec<Attachment>,
) -> Result<W, Error> {
    let mut mw = MultipartWriter::new(w, boundary);
    for (name, values) in fields.iter() {
        for value in values {
            mw.write_field(name, value)?;
        }
    }
    for mut attachment in attachments {
        if let Some(file) = attachment.file.as_deref_mut() {
            let copied = mw.write_file(&attachment.field, file)?;
            log::trace!("multipart: copied {copied} bytes for field {:?}", attachment.field);
        }
        attachment.close()?;
    }
    Ok(mw.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::ReadClose;
    use crate::file::RequestFile;
    use std::io::{Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingFile {
        name: String,
        data: Cursor<Vec<u8>>,
        fail_read: bool,
        closes: Arc<AtomicUsize>,
    }

    impl CountingFile {
        fn new(name: &str, data: &[u8], closes: &Arc<AtomicUsize>) -> Self {
            Self {
                name: name.to_string(),
                data: Cursor::new(data.to_vec()),
                fail_read: false,
                closes: Arc::clone(closes),
            }
        }
    }

    impl Read for CountingFile {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.fail_read {
                return Err(io::Error::new(io::ErrorKind::Other, "disk gone"));
            }
            self.data.read(buf)
        }
    }

    impl ReadClose for CountingFile {
        fn close(&mut self) -> io::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl FormFile for CountingFile {
        fn name(&self) -> &str {
            &self.name
        }
    }

    fn boxed(file: impl FormFile + 'static) -> Box<dyn FormFile> {
        Box::new(file)
    }

    fn encode_form<W: Write>(
        w: W,
        boundary: &str,
        fields: &Query,
        files: Vec<(String, Box<dyn FormFile>)>,
    ) -> Result<W, Error> {
        let attachments = files
            .into_iter()
            .map(|(field, file)| Attachment::new(field, file))
            .collect();
        encode_attachments(w, boundary, fields, attachments)
    }

    #[derive(Debug)]
    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn encodes_fields_then_files() {
        let fields = Query::from([("name", "abc")]);
        let files: Vec<(String, Box<dyn FormFile>)> = vec![(
            "upload".to_string(),
            boxed(RequestFile::new("a.txt", Cursor::new(b"hello".to_vec()))),
        )];
        let out = encode_form(Vec::new(), "XYZ", &fields, files).unwrap();
        let expected = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"name\"\r\n\r\n\
            abc\r\n\
            --XYZ\r\n\
            Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            hello\r\n\
            --XYZ--\r\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn file_closed_once_when_field_write_fails() {
        let closes = Arc::new(AtomicUsize::new(0));
        let fields = Query::from([("name", "abc")]);
        let files: Vec<(String, Box<dyn FormFile>)> =
            vec![("f".to_string(), boxed(CountingFile::new("f.bin", b"data", &closes)))];
        let err = encode_form(FailingWriter, "b", &fields, files).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn every_file_closed_once_when_a_read_fails() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut broken = CountingFile::new("b.bin", b"", &closes);
        broken.fail_read = true;
        let files: Vec<(String, Box<dyn FormFile>)> = vec![
            ("a".to_string(), boxed(CountingFile::new("a.bin", b"ok", &closes))),
            ("b".to_string(), boxed(broken)),
            ("c".to_string(), boxed(CountingFile::new("c.bin", b"never", &closes))),
        ];
        let err = encode_form(Vec::new(), "b", &Query::new(), files).unwrap_err();
        assert!(err.to_string().contains("disk gone"));
        assert_eq!(closes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn every_file_closed_once_on_success() {
        let closes = Arc::new(AtomicUsize::new(0));
        let files: Vec<(String, Box<dyn FormFile>)> = vec![
            ("a".to_string(), boxed(CountingFile::new("a.bin", b"1", &closes))),
            ("b".to_string(), boxed(CountingFile::new("b.bin", b"2", &closes))),
        ];
        encode_form(Vec::new(), "b", &Query::new(), files).unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let fields = Query::from([("we\"ird\\", "v")]);
        let out = encode_form(Vec::new(), "b", &fields, Vec::new()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("name=\"we\\\"ird\\\\\""));
    }

    #[test]
    fn boundary_is_unquoted_hex() {
        let b = new_boundary();
        assert_eq!(b.len(), 32);
        assert!(b.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(content_type(&b), format!("multipart/form-data; boundary={b}"));
    }
}
