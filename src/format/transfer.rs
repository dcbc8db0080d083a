//! The `compress_file`/`decompress_file` algorithm shared by every codec:
//! validate, derive a destination, move bytes through the chosen codec,
//! and optionally remove the source.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::path::PathBufExt;
use crate::support::paths;

use super::{open_compress, open_decompress, CompressionFormat, PathOrSink, PathOrStream, UseSystem};

/// Chunk size used when streaming through the in-process codec path;
/// never loads the whole file into memory.
const CHUNK_SIZE: usize = 64 * 1024;

/// Compress `source` into `dest` (or `source` with `format.default_ext`
/// appended, if `dest` is `None`) using `format`.
///
/// Removes `source` after a successful close unless `keep` is set.
/// Returns the destination path.
pub fn compress_file(
    format: &CompressionFormat,
    source: &Path,
    dest: Option<&Path>,
    keep: bool,
    level: Option<u8>,
    use_system: UseSystem,
) -> Result<PathBuf, Error> {
    paths::check_readable(source)?;
    let dest = match dest {
        Some(d) => d.to_path_buf(),
        None => {
            let mut d = source.to_path_buf();
            if !d.add_extension(format.default_ext) {
                return Err(Error::DestinationUnresolved(source.to_path_buf()));
            }
            d
        }
    };
    paths::check_writable(&dest, false)?;

    {
        let mut reader = std::fs::File::open(source)?;
        let mut writer = open_compress(
            format,
            PathOrSink::Path(dest.clone()),
            use_system,
            level,
            None,
        )?;
        copy_in_chunks(&mut reader, &mut writer)?;
        writer.flush()?;
    }

    if !keep {
        std::fs::remove_file(source)?;
    }
    Ok(dest)
}

/// Decompress `source` into `dest` (or `source` with `format.default_ext`
/// stripped, if `dest` is `None`) using `format`.
///
/// Removes `source` after a successful close unless `keep` is set.
/// Returns the destination path.
pub fn decompress_file(
    format: &CompressionFormat,
    source: &Path,
    dest: Option<&Path>,
    keep: bool,
    use_system: UseSystem,
) -> Result<PathBuf, Error> {
    paths::check_readable(source)?;
    let dest = match dest {
        Some(d) => d.to_path_buf(),
        None => {
            let name = source.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
                Error::DestinationUnresolved(source.to_path_buf())
            })?;
            let suffix = format!(".{}", format.default_ext);
            if let Some(stripped) = name.strip_suffix(&suffix) {
                source.with_file_name(stripped)
            } else {
                return Err(Error::DestinationUnresolved(source.to_path_buf()));
            }
        }
    };
    paths::check_writable(&dest, false)?;

    {
        let mut reader = open_decompress(
            format,
            PathOrStream::Path(source.to_path_buf()),
            use_system,
        )?;
        let mut writer = std::fs::File::create(&dest)?;
        copy_in_chunks(&mut reader, &mut writer)?;
    }

    if !keep {
        std::fs::remove_file(source)?;
    }
    Ok(dest)
}

fn copy_in_chunks<R: std::io::Read + ?Sized, W: std::io::Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
) -> std::io::Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}
