//! Filesystem convenience functions built on top of [`crate::open`].
//!
//! ## [`file_open_read`] / [`file_open_read_with_capacity`]
//!
//! Convenience wrappers around file I/O that read compressed files
//! transparently. Reading compressed files works for `.bz2`/`.gz`/`.xz`/
//! `.zst` files; support for each format is gated behind its `file-*`
//! feature (all four are enabled by default).
//!
//! ```no_run
//! # use xopen::fs::file_open_read;
//! # use std::io::Read;
//! # fn main() -> Result<(), anyhow::Error> {
//! let mut reader = file_open_read("./text.txt")?;
//! let mut content = String::new();
//! reader.read_to_string(&mut content)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## [`file_write`]
//!
//! A fluent writer builder. The target format is guessed from the file
//! extension; writing to an unrecognized extension produces a plain-text
//! file. There are two modes the file can be opened in, [`truncate`] or
//! [`append`].
//!
//! ```no_run
//! # use xopen::fs::file_write;
//! # use std::io::Write;
//! # fn main() -> Result<(), anyhow::Error> {
//! let mut writer = file_write("./text.txt").truncate()?;
//! writer.write_all(b"Hello World")?;
//! # Ok(())
//! # }
//! ```
//!
//! [`truncate`]: WriteBuilder::truncate
//! [`append`]: WriteBuilder::append

use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Error};

use crate::format::dispatch::CompressionHint;
use crate::format::UseSystem;
use crate::mode::{FileMode, ModeAccess, ModeCoding};
use crate::open::{open, SourceDescriptor};

/// Open a file for reading, transparently decompressing it if its
/// extension (or, failing that, its leading bytes) names a recognized
/// format.
///
/// The API mirrors [`std::fs::read`]'s "just give me a stream" shape,
/// except the error type is [`anyhow::Error`].
pub fn file_open_read<P: AsRef<Path>>(path: P) -> Result<Box<dyn Read + Send>, Error> {
    let path = path.as_ref();
    let handle = open(SourceDescriptor::Path(path.to_path_buf()))
        .mode(FileMode::new(ModeAccess::Read, ModeCoding::Binary))
        .compression(CompressionHint::GuessOrNone)
        .use_system(UseSystem::Never)
        .open()
        .with_context(|| format!("could not open {} for reading", path.display()))?;
    Ok(Box::new(handle.into_reader()?))
}

/// Like [`file_open_read`], but wraps the result in a [`BufReader`] of the
/// given capacity, for callers that read in small increments and want
/// fewer syscalls than the opener's own internal buffering provides.
pub fn file_open_read_with_capacity<P: AsRef<Path>>(
    path: P,
    capacity: usize,
) -> Result<Box<dyn Read + Send>, Error> {
    let reader = file_open_read(path)?;
    Ok(Box::new(BufReader::with_capacity(capacity, reader)))
}

/// Builder for [`file_write`]. Construct via [`file_write`], pick
/// [`truncate`][WriteBuilder::truncate] or [`append`][WriteBuilder::append]
/// to get the actual writer.
pub struct WriteBuilder {
    path: PathBuf,
    level: Option<u8>,
}

impl WriteBuilder {
    /// Override the compression level used if the target format is
    /// compressed. Ignored for plain-text targets.
    pub fn compression_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    /// Open the file, truncating any existing content.
    pub fn truncate(self) -> Result<Box<dyn Write + Send>, Error> {
        self.open(ModeAccess::Write)
    }

    /// Open the file, appending to any existing content.
    ///
    /// Only meaningful for plain-text and gzip targets: bzip2/xz/zstd
    /// streams cannot be concatenated after compression without
    /// re-framing, so appending to an existing compressed file produces a
    /// multi-stream file each codec's reader happens to still decode
    /// (gzip) or does not (bzip2/xz/zstd) -- the choice is left to the
    /// caller rather than rejected outright, matching the teacher's own
    /// "works for plaintext and gzip" caveat.
    pub fn append(self) -> Result<Box<dyn Write + Send>, Error> {
        self.open(ModeAccess::Append)
    }

    fn open(self, access: ModeAccess) -> Result<Box<dyn Write + Send>, Error> {
        let mut opener = open(SourceDescriptor::Path(self.path.clone()))
            .mode(FileMode::new(access, ModeCoding::Binary))
            .compression(CompressionHint::GuessOrNone)
            .use_system(UseSystem::Never);
        if let Some(level) = self.level {
            opener = opener.level(level);
        }
        let handle = opener
            .open()
            .with_context(|| format!("could not open {} for writing", self.path.display()))?;
        Ok(Box::new(handle.into_writer()?))
    }
}

/// Start building a writer for `path`. The target format is guessed from
/// `path`'s extension; an unrecognized extension writes plain text.
pub fn file_write<P: AsRef<Path>>(path: P) -> WriteBuilder {
    WriteBuilder {
        path: path.as_ref().to_path_buf(),
        level: None,
    }
}

/// Read the entire contents of a file into a bytes vector, transparently
/// decompressing it if recognized.
///
/// The API mirrors [`std::fs::read`] except for the error type.
pub fn read<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    let mut reader = file_open_read(path)?;
    reader.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Read the entire contents of a file into a string, transparently
/// decompressing it if recognized.
///
/// The API mirrors [`std::fs::read_to_string`] except for the error type.
pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String, Error> {
    let mut buffer = String::new();
    let mut reader = file_open_read(path)?;
    reader.read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Write a slice as the entire contents of a file, truncating it first.
///
/// The target format is guessed from the extension; an unrecognized
/// extension writes plain text.
///
/// The API mirrors [`std::fs::write`] except for the error type.
pub fn write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<(), Error> {
    let mut writer = file_write(path).truncate()?;
    writer.write_all(contents.as_ref())?;
    writer.flush()?;
    Ok(())
}

/// Append the content to the file.
///
/// Only meaningful for plaintext and gzip files; see
/// [`WriteBuilder::append`].
pub fn append<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<(), Error> {
    let mut writer = file_write(path).append()?;
    writer.write_all(contents.as_ref())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_plain_text_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        write(&path, b"hello world").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "hello world");
    }

    #[test]
    fn write_then_read_gz_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.gz");
        write(&path, b"compressed payload").unwrap();
        assert_eq!(read(&path).unwrap(), b"compressed payload");
    }

    #[test]
    fn append_adds_to_existing_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        write(&path, b"first\n").unwrap();
        append(&path, b"second\n").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn file_open_read_with_capacity_preserves_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cap.txt");
        write(&path, b"buffered read").unwrap();
        let mut reader = file_open_read_with_capacity(&path, 4).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"buffered read");
    }
}
