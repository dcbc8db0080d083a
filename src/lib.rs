#![deny(
    missing_docs,
    rust_2018_compatibility,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    variant_size_differences
)]
#![warn(rust_2018_idioms)]

//! Transparent, multi-transport compressed I/O.
//!
//! [`open`] is the single entry point: it classifies a source string (a
//! path, `"-"`/`"_"` for the standard streams, a `"|<command>"` pipe, a
//! URL, or an already-open stream/buffer), figures out what compression
//! applies, and hands back a [`wrapper::WrappedReader`] or
//! [`wrapper::WrappedWriter`] with predictable close semantics regardless
//! of which transport served it.
//!
//! ```no_run
//! # use xopen::open::{open, SourceDescriptor};
//! # use std::io::Read;
//! # fn main() -> Result<(), xopen::error::Error> {
//! let mut reader = open(SourceDescriptor::classify("archive.tar.gz"))
//!     .open()?
//!     .into_reader()?;
//! let mut content = String::new();
//! reader.read_to_string(&mut content)?;
//! # Ok(())
//! # }
//! ```
//!
//! [`fs`] and [`async_fs`] provide `std::fs`/`tokio::fs`-shaped
//! convenience wrappers (`read`, `write`, ...) for the common case of
//! "just give me the bytes".

pub mod actions;
#[cfg(feature = "async-fs")]
pub mod async_fs;
pub mod config;
pub mod error;
pub mod format;
pub mod fs;
pub mod mode;
pub mod open;
pub mod path;
#[cfg(feature = "process")]
pub mod process;
pub mod support;
pub mod wrapper;

pub use crate::error::Error;
pub use crate::open::{open, open_or_none, xopen, SourceDescriptor};
