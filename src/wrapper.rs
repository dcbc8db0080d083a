//! The lifecycle wrapper: listeners fired at close, peek with fallback,
//! and idempotent close semantics.
//!
//! Grounded in `xphyle.__init__.FileLikeWrapper`/`EventManager`/
//! `BufferWrapper`. Rust's ownership model means a wrapper always holds
//! the only handle to its inner stream, so — unlike the Python original,
//! which may wrap a stream someone else can also read from — the
//! save-read-seek fallback can be implemented as an internal buffer that
//! never loses bytes. `peek` therefore never raises `NotPeekable` in this
//! implementation; the error variant is kept in the taxonomy because the
//! process adapter's wrapped pipes are a case where it could still apply
//! (see `process.rs`).

use std::collections::VecDeque;
use std::io::{Read, Result as IoResult, Write};
use std::path::PathBuf;

use crate::error::Error;

/// The event a listener is registered against. Only `Close` exists today;
/// kept as an enum (rather than a bare function list) so new event types
/// don't require changing every call site.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Event {
    /// Fired once, after the wrapper's inner stream has been flushed and
    /// closed.
    Close,
}

/// Context passed to a listener when it fires.
pub struct CloseContext<'a> {
    /// The path associated with the closed handle, if any (absent for
    /// stdin/stdout/buffers).
    pub path: Option<&'a std::path::Path>,
    /// The canonical compression format name applied to the handle, if any.
    pub compression: Option<&'static str>,
}

type CloseListener = Box<dyn FnMut(&CloseContext<'_>) + Send>;

/// A stream with close-time listeners, in-memory peek support, and
/// idempotent close, wrapping a readable inner stream.
pub struct WrappedReader {
    inner: Box<dyn Read + Send>,
    peeked: VecDeque<u8>,
    path: Option<PathBuf>,
    compression: Option<&'static str>,
    closed: bool,
    listeners: Vec<CloseListener>,
}

impl WrappedReader {
    /// Wrap `inner`, tagging it with `path` (if any) and the canonical
    /// `compression` format name applied (if any).
    pub fn new(inner: Box<dyn Read + Send>, path: Option<PathBuf>, compression: Option<&'static str>) -> Self {
        WrappedReader {
            inner,
            peeked: VecDeque::new(),
            path,
            compression,
            closed: false,
            listeners: Vec::new(),
        }
    }

    /// The path associated with this handle, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    /// The canonical compression format name applied, if any.
    pub fn compression(&self) -> Option<&'static str> {
        self.compression
    }

    /// Whether this handle has already been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Register a listener for `event`; fired in registration order.
    pub fn register(&mut self, event: Event, listener: CloseListener) {
        match event {
            Event::Close => self.listeners.push(listener),
        }
    }

    /// Peek up to `n` bytes without consuming them.
    ///
    /// Reads through to the inner stream and buffers the result
    /// internally, so a subsequent `read` still observes those bytes.
    pub fn peek(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        while self.peeked.len() < n {
            let mut buf = vec![0u8; n - self.peeked.len()];
            let read = self.inner.read(&mut buf)?;
            if read == 0 {
                break;
            }
            self.peeked.extend(&buf[..read]);
        }
        Ok(self.peeked.iter().copied().take(n).collect())
    }

    /// Flush (a no-op for a pure reader), fire `Close` listeners, and mark
    /// the handle closed. Calling this more than once is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let ctx = CloseContext {
            path: self.path.as_deref(),
            compression: self.compression,
        };
        for listener in &mut self.listeners {
            listener(&ctx);
        }
    }
}

impl Read for WrappedReader {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        if !self.peeked.is_empty() {
            let n = buf.len().min(self.peeked.len());
            for (slot, byte) in buf[..n].iter_mut().zip(self.peeked.drain(..n)) {
                *slot = byte;
            }
            return Ok(n);
        }
        self.inner.read(buf)
    }
}

impl Drop for WrappedReader {
    fn drop(&mut self) {
        self.close();
    }
}

/// A stream with close-time listeners and idempotent close, wrapping a
/// writable inner stream.
pub struct WrappedWriter {
    inner: Box<dyn Write + Send>,
    path: Option<PathBuf>,
    compression: Option<&'static str>,
    closed: bool,
    listeners: Vec<CloseListener>,
}

impl WrappedWriter {
    /// Wrap `inner`, tagging it with `path` (if any) and the canonical
    /// `compression` format name applied (if any).
    pub fn new(inner: Box<dyn Write + Send>, path: Option<PathBuf>, compression: Option<&'static str>) -> Self {
        WrappedWriter {
            inner,
            path,
            compression,
            closed: false,
            listeners: Vec::new(),
        }
    }

    /// The path associated with this handle, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    /// The canonical compression format name applied, if any.
    pub fn compression(&self) -> Option<&'static str> {
        self.compression
    }

    /// Whether this handle has already been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Register a listener for `event`; fired in registration order.
    pub fn register(&mut self, event: Event, listener: CloseListener) {
        match event {
            Event::Close => self.listeners.push(listener),
        }
    }

    /// Flush the inner stream, fire `Close` listeners, and mark the
    /// handle closed. Calling this more than once is a no-op.
    pub fn close(&mut self) -> IoResult<()> {
        if self.closed {
            return Ok(());
        }
        self.inner.flush()?;
        self.closed = true;
        let ctx = CloseContext {
            path: self.path.as_deref(),
            compression: self.compression,
        };
        for listener in &mut self.listeners {
            listener(&ctx);
        }
        Ok(())
    }
}

impl Write for WrappedWriter {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> IoResult<()> {
        self.inner.flush()
    }
}

impl Drop for WrappedWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// An in-memory writable buffer that snapshots its contents, flushing any
/// codec layered above the raw buffer before taking the snapshot.
///
/// Grounded in `xphyle.__init__.BufferWrapper.value`.
pub struct BufferWrapper {
    writer: WrappedWriter,
    shared: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

impl BufferWrapper {
    /// Wrap a fresh in-memory buffer, optionally layering `make_writer`
    /// (a compressing writer) over the raw backing store.
    pub fn new(
        make_writer: impl FnOnce(Box<dyn Write + Send>) -> Box<dyn Write + Send>,
        compression: Option<&'static str>,
    ) -> Self {
        let shared = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = SharedVecWriter {
            shared: shared.clone(),
        };
        let writer = make_writer(Box::new(sink));
        BufferWrapper {
            writer: WrappedWriter::new(writer, None, compression),
            shared,
        }
    }

    /// The buffer's contents so far. Flushes any codec layer first so a
    /// compressor's internal buffering doesn't hide unflushed bytes.
    pub fn value(&mut self) -> IoResult<Vec<u8>> {
        self.writer.flush()?;
        Ok(self.shared.lock().expect("buffer lock poisoned").clone())
    }

    /// Access the underlying writer, e.g. to register close listeners.
    pub fn writer_mut(&mut self) -> &mut WrappedWriter {
        &mut self.writer
    }
}

struct SharedVecWriter {
    shared: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

impl Write for SharedVecWriter {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        self.shared.lock().expect("buffer lock poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn close_is_idempotent_and_fires_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let mut w = WrappedReader::new(Box::new(Cursor::new(b"abc".to_vec())), None, None);
        w.register(
            Event::Close,
            Box::new(move |_| {
                count2.fetch_add(1, Ordering::SeqCst);
            }),
        );
        w.close();
        w.close();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut w = WrappedReader::new(Box::new(Cursor::new(b"hello world".to_vec())), None, None);
        let peeked = w.peek(5).unwrap();
        assert_eq!(peeked, b"hello");
        // a read after peek sees the peeked bytes first, then the rest of
        // the stream; short reads are legal, so drain with read_to_end
        let mut buf = Vec::new();
        w.read_to_end(&mut buf).unwrap();
        assert_eq!(&buf, b"hello world");
    }

    #[test]
    fn buffer_wrapper_snapshots_current_value() {
        let mut buf = BufferWrapper::new(|w| w, None);
        buf.writer_mut().write_all(b"hi").unwrap();
        assert_eq!(buf.value().unwrap(), b"hi");
    }
}
