//! Optional progress hooks over a byte iterator or a running subprocess
//! (feature `progress`), grounded in `xphyle.progress`'s toggleable
//! `ITERABLE_PROGRESS`/`PROCESS_PROGRESS` singletons and implemented over
//! `indicatif`.

use std::io::{Read, Result};

use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;

/// Wrap `reader` in a progress bar that advances by bytes read, unless
/// progress is disabled in the process-wide config, in which case
/// `reader` passes through untouched.
pub fn wrap_reader<R: Read + Send + 'static>(reader: R, label: &str) -> Box<dyn Read + Send> {
    if !Config::current().progress_enabled() {
        return Box::new(reader);
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} {bytes} ({bytes_per_sec})") {
        bar.set_style(style);
    }
    bar.set_message(label.to_string());
    Box::new(ProgressRead { inner: reader, bar })
}

struct ProgressRead<R> {
    inner: R,
    bar: ProgressBar,
}

impl<R: Read> Read for ProgressRead<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            self.bar.finish_and_clear();
        } else {
            self.bar.inc(n as u64);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn passthrough_when_disabled() {
        crate::config::configure(|c| c.progress_enabled(false));
        let mut r = wrap_reader(Cursor::new(b"hello".to_vec()), "test");
        let mut buf = Vec::new();
        r.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"hello");
    }
}
