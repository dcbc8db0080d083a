//! The crate's error taxonomy.
//!
//! Every fallible operation in this crate returns `Result<T, Error>`.
//! Convenience functions that bridge to caller-provided collaborators (the
//! `fs`/`async_fs` helpers) widen this to `anyhow::Error`, mirroring how the
//! teacher's own `fs` module signatures read.

use std::path::PathBuf;
use std::process::ExitStatus;

/// The error type returned by this crate's fallible operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A mode string did not parse, or combined incompatible pieces (e.g.
    /// universal newlines with an explicit binary coding).
    #[error("invalid mode string {mode:?}")]
    InvalidMode {
        /// The mode string as given by the caller.
        mode: String,
    },

    /// An explicit codec name is not registered.
    #[error("unknown compression format {name:?}")]
    UnknownFormat {
        /// The name the caller asked for.
        name: String,
    },

    /// `compression = true` was requested but no guess succeeded.
    #[error("could not guess a compression format for {0}")]
    FormatUnknown(String),

    /// `validate = true` and the guessed format disagreed with the declared one.
    #[error("declared compression format {declared:?} does not match detected format {detected:?}")]
    FormatMismatch {
        /// The format the caller declared.
        declared: String,
        /// The format detected from content or name.
        detected: String,
    },

    /// A caller-provided stream's coding conflicts with the requested mode
    /// or with the requested compression.
    #[error("stream mode is incompatible with the requested operation: {0}")]
    IncompatibleStreamMode(String),

    /// A format guess was requested on a stream that cannot be peeked.
    #[error("cannot guess compression format: stream is not peekable")]
    CompressionNotGuessable,

    /// The resource does not permit reading.
    #[error("{path} is not readable")]
    NotReadable {
        /// The path or descriptor that was not readable.
        path: String,
    },

    /// The resource does not permit writing.
    #[error("{path} is not writable")]
    NotWritable {
        /// The path or descriptor that was not writable.
        path: String,
    },

    /// A peek was requested on a stream with neither a native peek nor seek.
    #[error("stream does not support peek")]
    NotPeekable,

    /// `decompress_file` could not derive a destination filename.
    #[error("cannot derive a destination path for {0}")]
    DestinationUnresolved(PathBuf),

    /// An external reader's child process exited non-zero: the input was
    /// truncated or otherwise corrupt.
    #[error("input truncated or corrupt, decompressor exited with {status:?}")]
    TruncatedInput {
        /// The decompressor's exit status, if it is known.
        status: Option<ExitStatus>,
    },

    /// An in-process or external codec failed for a reason other than
    /// truncation.
    #[error("codec error: {0}")]
    CodecError(String),

    /// `close(raise_on_error = true)` observed a return code outside the
    /// tolerated set.
    #[error("process failed with {status:?}")]
    ProcessFailed {
        /// The process's exit status, if it is known.
        status: Option<ExitStatus>,
    },

    /// An operation was attempted on an already-closed handle or process.
    #[error("handle is already closed")]
    AlreadyClosed,

    /// A process wait exceeded its timeout.
    #[error("timed out waiting for process")]
    TimedOut,

    /// A path that must point to a file does not.
    #[error("the path {path:?} does not point to a file")]
    NotAFile {
        /// The path that failed validation.
        path: PathBuf,
    },

    /// Passthrough for I/O errors raised by the underlying transport.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
