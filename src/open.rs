//! The unified opener: classify a source, validate/normalise the mode,
//! layer a compression codec, and produce a handle with predictable
//! close semantics.
//!
//! Grounded in `xphyle.__init__.xopen` for classification precedence and
//! per-file-type rules; teacher's `fs.rs::file_open_read`/`WriteBuilder`
//! for the `Box<dyn Read>`/`Box<dyn Write>` return shape and the
//! buffered-magic-sniff trick (here: buffer-then-peek, since most of our
//! sources aren't seekable).

use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::Config;
use crate::error::Error;
use crate::format::dispatch::{self, CompressionHint, Peekable};
use crate::format::{self, FormatRegistry, PathOrSink, PathOrStream, UseSystem};
use crate::mode::{FileMode, FileType};
use crate::wrapper::{WrappedReader, WrappedWriter};

#[cfg(feature = "process")]
use crate::process::ProcessHandle;

/// The input to the opener: what to open.
///
/// Built either directly (for [`SourceDescriptor::Buffer`] and
/// [`SourceDescriptor::FileLike`], which have no string form) or via
/// [`SourceDescriptor::classify`] for the string-based grammar in
/// `spec.md` §6 (`"-"`, `"_"`, `"|<command>"`, a URL, or a path).
pub enum SourceDescriptor {
    /// A path on the local filesystem.
    Path(PathBuf),
    /// A remote resource addressed by URL (feature `url`).
    Url(String),
    /// A shell command to spawn, without its leading `"|"` (feature
    /// `process`).
    ShellCommand(String),
    /// Standard input.
    Stdin,
    /// Standard output.
    Stdout,
    /// Standard error (write-only).
    Stderr,
    /// A caller-provided, already-open stream.
    FileLike(PreOpened),
    /// A fresh or seeded in-memory buffer.
    Buffer(BufferKind),
}

/// A caller-supplied stream, tagged by which direction it supports.
pub enum PreOpened {
    /// A readable stream.
    Read(Box<dyn Read + Send>),
    /// A writable stream.
    Write(Box<dyn Write + Send>),
}

/// Whether an in-memory buffer starts empty or pre-filled.
pub enum BufferKind {
    /// An empty buffer (meaningful for write mode).
    Fresh,
    /// A buffer seeded with existing content (meaningful for read mode).
    ///
    /// This crate resolves the ambiguity the original library left open
    /// (see `SPEC_FULL.md` §9) by giving the seeded case its own
    /// constructor rather than overloading the "fresh buffer" token.
    Seeded(BufferSource),
}

/// The seed content for [`BufferKind::Seeded`].
pub enum BufferSource {
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// UTF-8 text, stored as its byte representation.
    Text(String),
}

impl SourceDescriptor {
    /// Classify a plain string per the source-descriptor grammar in
    /// `spec.md` §6: `"-"` and `"_"` are standard-stream sentinels
    /// (disambiguated against stdin/stdout by the requested mode at open
    /// time), `"|<command>"` spawns a subprocess, a string with a scheme
    /// and non-empty remainder is a URL, anything else is a local path.
    pub fn classify(s: &str) -> SourceDescriptor {
        if s == "-" {
            return SourceDescriptor::Stdin;
        }
        if s == "_" {
            return SourceDescriptor::Stderr;
        }
        if let Some(command) = s.strip_prefix('|') {
            return SourceDescriptor::ShellCommand(command.to_string());
        }
        #[cfg(feature = "url")]
        if crate::support::url::parse(s).is_some() {
            return SourceDescriptor::Url(s.to_string());
        }
        SourceDescriptor::Path(PathBuf::from(s))
    }

    fn file_type(&self) -> FileType {
        match self {
            SourceDescriptor::Path(_) => FileType::Local,
            SourceDescriptor::Url(_) => FileType::Url,
            SourceDescriptor::ShellCommand(_) => FileType::Process,
            SourceDescriptor::Stdin | SourceDescriptor::Stdout | SourceDescriptor::Stderr => {
                FileType::Stdio
            }
            SourceDescriptor::FileLike(_) => FileType::FileLike,
            SourceDescriptor::Buffer(_) => FileType::Buffer,
        }
    }
}

/// A successfully opened handle: either the read side or the write side,
/// depending on the requested mode.
pub enum Handle {
    /// A readable, listener-bearing stream.
    Reader(WrappedReader),
    /// A writable, listener-bearing stream.
    Writer(WrappedWriter),
}

impl Handle {
    /// The canonical compression format name applied, if any.
    pub fn compression(&self) -> Option<&'static str> {
        match self {
            Handle::Reader(r) => r.compression(),
            Handle::Writer(w) => w.compression(),
        }
    }

    /// Take the reader side, failing if this handle was opened for
    /// writing.
    pub fn into_reader(self) -> Result<WrappedReader, Error> {
        match self {
            Handle::Reader(r) => Ok(r),
            Handle::Writer(_) => Err(Error::IncompatibleStreamMode(
                "handle was opened for writing".to_string(),
            )),
        }
    }

    /// Take the writer side, failing if this handle was opened for
    /// reading.
    pub fn into_writer(self) -> Result<WrappedWriter, Error> {
        match self {
            Handle::Writer(w) => Ok(w),
            Handle::Reader(_) => Err(Error::IncompatibleStreamMode(
                "handle was opened for reading".to_string(),
            )),
        }
    }
}

/// Builder for the unified opener. Mirrors the teacher's `WriteBuilder`
/// in shape: construct with [`Opener::new`], configure with the setter
/// methods, then call [`Opener::open`].
pub struct Opener<'r> {
    source: SourceDescriptor,
    mode: FileMode,
    compression: CompressionHint,
    use_system: UseSystem,
    file_type: Option<FileType>,
    validate: bool,
    level: Option<u8>,
    threads: Option<u32>,
    registry: &'r FormatRegistry,
}

impl<'r> Opener<'r> {
    /// Start building a request to open `source` against `registry`.
    pub fn new(source: SourceDescriptor, registry: &'r FormatRegistry) -> Self {
        Opener {
            source,
            mode: FileMode::default(),
            compression: CompressionHint::GuessOrNone,
            use_system: UseSystem::default(),
            file_type: None,
            validate: false,
            level: None,
            threads: None,
            registry,
        }
    }

    /// Set the mode (defaults to read-text).
    pub fn mode(mut self, mode: FileMode) -> Self {
        self.mode = mode;
        self
    }

    /// Parse and set the mode from its canonical string form.
    pub fn mode_str(mut self, mode: &str) -> Result<Self, Error> {
        self.mode = mode.parse()?;
        Ok(self)
    }

    /// Set the compression request.
    pub fn compression(mut self, compression: CompressionHint) -> Self {
        self.compression = compression;
        self
    }

    /// Set whether to prefer an external compressor executable.
    pub fn use_system(mut self, use_system: UseSystem) -> Self {
        self.use_system = use_system;
        self
    }

    /// Override the classifier's file-type decision.
    pub fn file_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }

    /// Require the guessed format to match an explicit `compression` name.
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Set the compression level (ignored unless a codec is applied).
    pub fn level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    /// Set the thread count handed to a parallel codec.
    pub fn threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Classify, validate, layer compression, and produce the handle.
    pub fn open(self) -> Result<Handle, Error> {
        let file_type = self.file_type.unwrap_or_else(|| self.source.file_type());
        debug!("opening source as {file_type:?} with mode {}", self.mode);

        match file_type {
            FileType::Stdio => self.open_stdio(),
            FileType::Local => self.open_local(),
            FileType::Url => self.open_url(),
            FileType::Process => self.open_process(),
            FileType::FileLike => self.open_filelike(),
            FileType::Buffer => self.open_buffer(),
        }
    }

    fn open_stdio(self) -> Result<Handle, Error> {
        match self.source {
            SourceDescriptor::Stdin => {
                if self.mode.writable() {
                    return Err(Error::IncompatibleStreamMode(
                        "stdin is read-only".to_string(),
                    ));
                }
                let mut buffered = BufReader::new(std::io::stdin());
                let name = self.resolve_read_format(&mut buffered, None)?;
                let stream: Box<dyn Read + Send> = match name {
                    Some(fmt) => format::open_decompress(
                        self.registry.get(fmt)?,
                        PathOrStream::Stream(Box::new(buffered)),
                        self.use_system,
                    )?,
                    None => Box::new(buffered),
                };
                Ok(Handle::Reader(WrappedReader::new(stream, None, name)))
            }
            SourceDescriptor::Stdout | SourceDescriptor::Stderr => {
                if self.mode.readable() {
                    return Err(Error::IncompatibleStreamMode(
                        "stdout/stderr are write-only".to_string(),
                    ));
                }
                let raw: Box<dyn Write + Send> = if matches!(self.source, SourceDescriptor::Stdout)
                {
                    Box::new(std::io::stdout())
                } else {
                    Box::new(std::io::stderr())
                };
                let name = self.explicit_format_name()?;
                let stream: Box<dyn Write + Send> = match name {
                    Some(fmt) => format::open_compress(
                        self.registry.get(fmt)?,
                        PathOrSink::Stream(raw),
                        self.use_system,
                        self.level,
                        self.threads,
                    )?,
                    None => raw,
                };
                Ok(Handle::Writer(WrappedWriter::new(stream, None, name)))
            }
            _ => unreachable!("file_type() only maps Stdin/Stdout/Stderr to FileType::Stdio"),
        }
    }

    fn open_local(self) -> Result<Handle, Error> {
        let SourceDescriptor::Path(path) = self.source else {
            unreachable!("file_type() only maps Path to FileType::Local")
        };

        if self.mode.readable() && !self.mode.writable() {
            crate::support::paths::check_readable(&path)?;
            let file = std::fs::File::open(&path)?;
            let mut buffered = BufReader::new(file);
            let name = self.resolve_read_format(&mut buffered, path.to_str())?;
            let stream: Box<dyn Read + Send> = match name {
                Some(fmt) => format::open_decompress(
                    self.registry.get(fmt)?,
                    PathOrStream::Path(path.clone()),
                    self.use_system,
                )?,
                None => Box::new(buffered),
            };
            Ok(Handle::Reader(WrappedReader::new(stream, Some(path), name)))
        } else {
            crate::support::paths::check_writable(&path, false)?;
            let name = self.resolve_write_format(&path)?;
            let stream: Box<dyn Write + Send> = match name {
                Some(fmt) => format::open_compress(
                    self.registry.get(fmt)?,
                    PathOrSink::Path(path.clone()),
                    self.use_system,
                    self.level,
                    self.threads,
                )?,
                None => Box::new(std::io::BufWriter::new(std::fs::File::create(&path)?)),
            };
            Ok(Handle::Writer(WrappedWriter::new(stream, Some(path), name)))
        }
    }

    #[cfg(feature = "url")]
    fn open_url(self) -> Result<Handle, Error> {
        let SourceDescriptor::Url(url) = self.source else {
            unreachable!("file_type() only maps Url to FileType::Url")
        };
        if self.mode.writable() {
            return Err(Error::IncompatibleStreamMode(
                "URLs are read-only".to_string(),
            ));
        }
        let stream = crate::support::url::open(&url)?;
        let mut buffered = BufReader::new(stream);
        let name = self.resolve_read_format(&mut buffered, Some(url.as_str()))?;
        let stream: Box<dyn Read + Send> = match name {
            Some(fmt) => format::open_decompress(
                self.registry.get(fmt)?,
                PathOrStream::Stream(Box::new(buffered)),
                self.use_system,
            )?,
            None => Box::new(buffered),
        };
        Ok(Handle::Reader(WrappedReader::new(stream, None, name)))
    }

    #[cfg(not(feature = "url"))]
    fn open_url(self) -> Result<Handle, Error> {
        Err(Error::CodecError(
            "URL support requires the url feature".to_string(),
        ))
    }

    #[cfg(feature = "process")]
    fn open_process(self) -> Result<Handle, Error> {
        let SourceDescriptor::ShellCommand(command) = self.source else {
            unreachable!("file_type() only maps ShellCommand to FileType::Process")
        };
        let proc = ProcessHandle::spawn(&command)?;
        if self.mode.writable() {
            let name = self.explicit_format_name()?;
            let raw: Box<dyn Write + Send> = Box::new(ProcessStdin(proc));
            let stream: Box<dyn Write + Send> = match name {
                Some(fmt) => format::open_compress(
                    self.registry.get(fmt)?,
                    PathOrSink::Stream(raw),
                    self.use_system,
                    self.level,
                    self.threads,
                )?,
                None => raw,
            };
            Ok(Handle::Writer(WrappedWriter::new(stream, None, name)))
        } else {
            let reader = ProcessStdout(proc);
            let mut buffered = BufReader::new(reader);
            let name = self.resolve_read_format(&mut buffered, None)?;
            let stream: Box<dyn Read + Send> = match name {
                Some(fmt) => {
                    format::inprocess::wrap_reader(self.registry.get(fmt)?, Box::new(buffered))?
                }
                None => Box::new(buffered),
            };
            Ok(Handle::Reader(WrappedReader::new(stream, None, name)))
        }
    }

    #[cfg(not(feature = "process"))]
    fn open_process(self) -> Result<Handle, Error> {
        Err(Error::CodecError(
            "process support requires the process feature".to_string(),
        ))
    }

    fn open_filelike(self) -> Result<Handle, Error> {
        let SourceDescriptor::FileLike(preopened) = self.source else {
            unreachable!("file_type() only maps FileLike to FileType::FileLike")
        };
        match preopened {
            PreOpened::Read(stream) => {
                if self.mode.writable() {
                    return Err(Error::IncompatibleStreamMode(
                        "stream is readable but mode requests write".to_string(),
                    ));
                }
                if self.mode.text() && !matches!(self.compression, CompressionHint::Off) {
                    return Err(Error::IncompatibleStreamMode(
                        "compression requires a binary-coded stream".to_string(),
                    ));
                }
                let mut buffered = BufReader::new(stream);
                let name = self.resolve_read_format(&mut buffered, None)?;
                let stream: Box<dyn Read + Send> = match name {
                    Some(fmt) => format::open_decompress(
                        self.registry.get(fmt)?,
                        PathOrStream::Stream(Box::new(buffered)),
                        self.use_system,
                    )?,
                    None => Box::new(buffered),
                };
                Ok(Handle::Reader(WrappedReader::new(stream, None, name)))
            }
            PreOpened::Write(stream) => {
                if self.mode.readable() {
                    return Err(Error::IncompatibleStreamMode(
                        "stream is writable but mode requests read".to_string(),
                    ));
                }
                if self.mode.text() && !matches!(self.compression, CompressionHint::Off) {
                    return Err(Error::IncompatibleStreamMode(
                        "compression requires a binary-coded stream".to_string(),
                    ));
                }
                let name = self.explicit_format_name()?;
                let threads = self.threads.unwrap_or_else(|| Config::current().threads());
                let out: Box<dyn Write + Send> = match name {
                    Some(fmt) => format::inprocess::wrap_writer(
                        self.registry.get(fmt)?,
                        stream,
                        self.level,
                        threads,
                    )?,
                    None => stream,
                };
                Ok(Handle::Writer(WrappedWriter::new(out, None, name)))
            }
        }
    }

    fn open_buffer(self) -> Result<Handle, Error> {
        let name = if matches!(self.compression, CompressionHint::Off) {
            None
        } else {
            self.explicit_format_name()?
        };
        if name.is_some() && self.mode.text() {
            return Err(Error::IncompatibleStreamMode(
                "compression requires a binary-coded buffer".to_string(),
            ));
        }

        let SourceDescriptor::Buffer(kind) = self.source else {
            unreachable!("file_type() only maps Buffer to FileType::Buffer")
        };

        if self.mode.writable() {
            let sink: Box<dyn Write + Send> = Box::new(Vec::<u8>::new());
            let threads = self.threads.unwrap_or_else(|| Config::current().threads());
            let stream = match name {
                Some(fmt) => {
                    format::inprocess::wrap_writer(self.registry.get(fmt)?, sink, self.level, threads)?
                }
                None => sink,
            };
            Ok(Handle::Writer(WrappedWriter::new(stream, None, name)))
        } else {
            let bytes = match kind {
                BufferKind::Fresh => Vec::new(),
                BufferKind::Seeded(BufferSource::Bytes(b)) => b,
                BufferKind::Seeded(BufferSource::Text(s)) => s.into_bytes(),
            };
            let stream: Box<dyn Read + Send> = match name {
                Some(fmt) => format::inprocess::wrap_reader(
                    self.registry.get(fmt)?,
                    Box::new(std::io::Cursor::new(bytes)),
                )?,
                None => Box::new(std::io::Cursor::new(bytes)),
            };
            Ok(Handle::Reader(WrappedReader::new(stream, None, name)))
        }
    }

    /// Resolve the codec for a readable stream: peek magic bytes, falling
    /// back to name-based guessing against `name_hint` (a path or URL).
    fn resolve_read_format(
        &self,
        stream: &mut dyn BufRead,
        name_hint: Option<&str>,
    ) -> Result<Option<&'static str>, Error> {
        dispatch::resolve(
            self.registry,
            &self.compression,
            name_hint,
            Peekable::Stream(stream),
            self.validate,
        )
    }

    /// Resolve the codec for a writable local path: the only information
    /// available is the filename, so a content guess is impossible (the
    /// file doesn't exist yet); `compression = Guess`/`GuessOrNone` (no
    /// explicit name, write mode) degrades to a name-based guess instead
    /// of failing outright.
    fn resolve_write_format(&self, path: &Path) -> Result<Option<&'static str>, Error> {
        let name_hint = path.to_str();
        match &self.compression {
            CompressionHint::Guess | CompressionHint::GuessOrNone => {
                Ok(name_hint.and_then(|n| self.registry.guess_by_name(n)))
            }
            _ => dispatch::resolve(
                self.registry,
                &self.compression,
                name_hint,
                Peekable::NameOnly,
                self.validate,
            ),
        }
    }

    /// Resolve a codec that must be named explicitly because no peek or
    /// name hint is available (e.g. writing to stdout/a pipe/a buffer).
    fn explicit_format_name(&self) -> Result<Option<&'static str>, Error> {
        match &self.compression {
            CompressionHint::Off => Ok(None),
            CompressionHint::Named(name) => {
                Ok(Some(self.registry.canonical(name).ok_or_else(|| {
                    Error::UnknownFormat {
                        name: name.clone(),
                    }
                })?))
            }
            CompressionHint::Guess => Err(Error::CompressionNotGuessable),
            CompressionHint::GuessOrNone => Ok(None),
        }
    }
}

/// The writable half of a spawned process's stdin, as a plain `Write`
/// implementor so it can be passed through [`format::open_compress`] like
/// any other stream destination.
#[cfg(feature = "process")]
struct ProcessStdin(ProcessHandle);

#[cfg(feature = "process")]
impl Write for ProcessStdin {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write_stdin(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// The readable half of a spawned process's stdout.
#[cfg(feature = "process")]
struct ProcessStdout(ProcessHandle);

#[cfg(feature = "process")]
impl Read for ProcessStdout {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read_stdout(buf)
    }
}

/// Open `source` built from the process-wide default registry. Equivalent
/// to `Opener::new(source, &registry).open()`.
pub fn open(source: SourceDescriptor) -> Opener<'static> {
    Opener::new(source, default_registry())
}

/// Alias kept for readers familiar with the concept this crate
/// generalizes from.
pub fn xopen(source: SourceDescriptor) -> Opener<'static> {
    open(source)
}

/// Like [`Opener::open`], but converts resource-acquisition errors into
/// `None` instead of propagating them (the `errors=false` convenience
/// mode).
pub fn open_or_none(opener: Opener<'_>) -> Option<Handle> {
    opener.open().ok()
}

fn default_registry() -> &'static FormatRegistry {
    static REGISTRY: std::sync::OnceLock<FormatRegistry> = std::sync::OnceLock::new();
    REGISTRY.get_or_init(FormatRegistry::with_builtins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::ModeAccess;

    fn reg() -> FormatRegistry {
        FormatRegistry::with_builtins()
    }

    fn write_gz(path: &Path, content: &[u8]) {
        let mut w = format::open_compress(
            reg().get("gzip").unwrap(),
            PathOrSink::Path(path.to_path_buf()),
            UseSystem::Never,
            None,
            None,
        )
        .unwrap();
        w.write_all(content).unwrap();
    }

    #[test]
    fn transparent_decompress_via_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.gz");
        write_gz(&path, b"hello\n");

        let registry = reg();
        let handle = Opener::new(SourceDescriptor::Path(path), &registry)
            .mode_str("rt")
            .unwrap()
            .compression(CompressionHint::Guess)
            .open()
            .unwrap();
        assert_eq!(handle.compression(), Some("gzip"));
        let mut reader = handle.into_reader().unwrap();
        let mut content = String::new();
        reader.read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello\n");
    }

    #[test]
    fn validation_failure_on_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.gz");
        write_gz(&path, b"hello\n");

        let registry = reg();
        let err = Opener::new(SourceDescriptor::Path(path), &registry)
            .mode_str("rt")
            .unwrap()
            .compression(CompressionHint::Named("bz2".to_string()))
            .validate(true)
            .open()
            .unwrap_err();
        assert!(matches!(err, Error::FormatMismatch { .. }));
    }

    #[test]
    fn compress_file_round_trip_via_opener() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.gz");
        {
            let registry = reg();
            let handle = Opener::new(SourceDescriptor::Path(path.clone()), &registry)
                .mode_str("wt")
                .unwrap()
                .compression(CompressionHint::Named("gzip".to_string()))
                .open()
                .unwrap();
            let mut writer = handle.into_writer().unwrap();
            writer.write_all(b"round trip\n").unwrap();
            writer.close().unwrap();
        }
        let registry = reg();
        let handle = Opener::new(SourceDescriptor::Path(path), &registry)
            .compression(CompressionHint::Guess)
            .open()
            .unwrap();
        let mut reader = handle.into_reader().unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "round trip\n");
    }

    #[test]
    fn buffer_seeded_read_round_trips() {
        let registry = reg();
        let handle = Opener::new(
            SourceDescriptor::Buffer(BufferKind::Seeded(BufferSource::Text("hi".into()))),
            &registry,
        )
        .compression(CompressionHint::Off)
        .open()
        .unwrap();
        let mut reader = handle.into_reader().unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hi");
    }

    #[test]
    fn stdin_rejects_write_mode() {
        let registry = reg();
        let err = Opener::new(SourceDescriptor::Stdin, &registry)
            .mode_str("wt")
            .unwrap()
            .open()
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleStreamMode(_)));
    }

    #[test]
    fn write_mode_access_is_truncate_read_write_for_plus() {
        let m: FileMode = "w+".parse().unwrap();
        assert_eq!(m.access(), ModeAccess::TruncateReadWrite);
    }
}
