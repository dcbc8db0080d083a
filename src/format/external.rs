//! External-process codecs: pipe through a compressor executable instead
//! of an in-process codec library.
//!
//! Grounded in `xphyle.formats.SystemReader`/`SystemWriter` and the
//! `Gzip`/`BZip2`/`Lzma.get_command` methods in the same module; the exact
//! argument shapes come from `SPEC_FULL.md` §4.2's table.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::error::Error;
use crate::support::exe_cache;

use super::CompressionFormat;

/// `c`(ompress) or `d`(ecompress), passed to [`build_command`].
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Operation {
    /// Compress.
    Compress,
    /// Decompress.
    Decompress,
}

/// Build the argument vector for `format`'s external executable.
///
/// Mirrors `SPEC_FULL.md`'s per-codec command table: gzip/bz2 take a
/// numeric level flag plus `-c`; bz2/xz additionally take an explicit
/// `-z` when compressing; the parallel tools (`pigz`, `pbzip2`, `xz -T`)
/// get a thread-count flag when `threads > 1`.
pub fn build_command(
    format: &CompressionFormat,
    exe_name: &str,
    op: Operation,
    level: Option<u8>,
    threads: u32,
    path: Option<&Path>,
) -> Vec<std::ffi::OsString> {
    let mut args: Vec<std::ffi::OsString> = Vec::new();
    match op {
        Operation::Compress => {
            let level = format.clamp_level(level);
            args.push(format!("-{level}").into());
            if format.name != "gzip" {
                args.push("-z".into());
            }
        }
        Operation::Decompress => args.push("-d".into()),
    }
    args.push("-c".into());

    if threads > 1 {
        if let Some(flag) = format.parallel_flag {
            match format.name {
                "gzip" if exe_name == "pigz" => {
                    args.push(flag.into());
                    args.push(threads.to_string().into());
                }
                "bz2" if exe_name == "pbzip2" => {
                    args.push(format!("{flag}{threads}").into());
                }
                "lzma" | "zstd" => {
                    args.push(flag.into());
                    args.push(threads.to_string().into());
                }
                _ => {}
            }
        }
    }

    if let Some(path) = path {
        args.push(path.as_os_str().to_owned());
    }
    args
}

fn resolve(format: &CompressionFormat) -> std::io::Result<(std::path::PathBuf, String)> {
    exe_cache::resolve(format.executables).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no executable found for format {:?}", format.name),
        )
    })
}

/// A readable stream piped through a decompressor's stdout.
///
/// `read` draws from the child's stdout; on `n <= 0` or EOF, waits for the
/// child and surfaces [`Error::TruncatedInput`] if it exited non-zero,
/// distinguishing truncated/corrupt input from a clean EOF per the
/// tri-state poll this crate's design notes call for.
pub struct ExternalReader {
    child: Child,
    stdout: ChildStdout,
    exited_ok: Option<bool>,
}

impl ExternalReader {
    /// Spawn a decompressor for `format` reading from `path`.
    pub fn spawn(format: &CompressionFormat, path: &Path, threads: u32) -> std::io::Result<Self> {
        let (exe, name) = resolve(format)?;
        let args = build_command(format, &name, Operation::Decompress, None, threads, Some(path));
        let mut child = Command::new(exe)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdout = child.stdout.take().expect("spawned with piped stdout");
        Ok(ExternalReader {
            child,
            stdout,
            exited_ok: None,
        })
    }

    fn finish(&mut self) -> std::io::Result<()> {
        if self.exited_ok.is_some() {
            return Ok(());
        }
        let status = self.child.wait()?;
        self.exited_ok = Some(status.success());
        Ok(())
    }
}

impl Read for ExternalReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.stdout.read(buf)?;
        if n == 0 {
            self.finish()?;
            if self.exited_ok == Some(false) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    Error::TruncatedInput {
                        status: self.child.try_wait().ok().flatten(),
                    },
                ));
            }
        }
        Ok(n)
    }
}

impl Drop for ExternalReader {
    fn drop(&mut self) {
        if self.exited_ok.is_none() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// A writable stream piped through a compressor's stdin, redirected to a
/// destination file.
///
/// `close` (via [`Drop`] or [`Self::finish`]) closes stdin, waits for the
/// child, and surfaces [`Error::CodecError`] on non-zero exit.
pub struct ExternalWriter {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl ExternalWriter {
    /// Spawn a compressor for `format` writing its compressed stdout to
    /// `dest`.
    pub fn spawn(
        format: &CompressionFormat,
        dest: &Path,
        level: Option<u8>,
        threads: u32,
    ) -> std::io::Result<Self> {
        let (exe, name) = resolve(format)?;
        let args = build_command(format, &name, Operation::Compress, level, threads, None);
        let out_file = std::fs::File::create(dest)?;
        let child = Command::new(exe)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::from(out_file))
            .stderr(Stdio::null())
            .spawn()?;
        Ok(ExternalWriter {
            stdin: None,
            child: Some(child),
        }
        .with_stdin())
    }

    fn with_stdin(mut self) -> Self {
        self.stdin = self.child.as_mut().and_then(|c| c.stdin.take());
        self
    }

    /// Close stdin, wait for the child, and fail if it exited non-zero.
    pub fn finish(&mut self) -> Result<(), Error> {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            if !status.success() {
                return Err(Error::CodecError(format!(
                    "compressor exited with {status:?}"
                )));
            }
        }
        Ok(())
    }
}

impl Write for ExternalWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stdin
            .as_mut()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "writer closed"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.stdin.as_mut() {
            Some(s) => s.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for ExternalWriter {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gzip_format() -> CompressionFormat {
        crate::format::FormatRegistry::with_builtins()
            .get("gzip")
            .unwrap()
            .clone()
    }

    #[test]
    fn command_shape_for_gzip_decompress() {
        let fmt = gzip_format();
        let args = build_command(
            &fmt,
            "gzip",
            Operation::Decompress,
            None,
            1,
            Some(Path::new("/tmp/a.gz")),
        );
        let args: Vec<String> = args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-d", "-c", "/tmp/a.gz"]);
    }

    #[test]
    fn command_shape_for_pigz_parallel_compress() {
        let fmt = gzip_format();
        let args = build_command(&fmt, "pigz", Operation::Compress, Some(9), 4, None);
        let args: Vec<String> = args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-9", "-c", "-p", "4"]);
    }

    #[test]
    fn command_shape_for_xz_compress() {
        let reg = crate::format::FormatRegistry::with_builtins();
        let fmt = reg.get("lzma").unwrap();
        let args = build_command(fmt, "xz", Operation::Compress, Some(6), 2, None);
        let args: Vec<String> = args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-6", "-z", "-c", "-T", "2"]);
    }
}
