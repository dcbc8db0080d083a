//! Close-action helpers: `CLOSE` listeners that compress, move, or delete
//! the just-closed file.
//!
//! Grounded in the `EventListener.__call__`/`execute` contract in
//! `xphyle.__init__` (no concrete subclass ships in the kept
//! `original_source` files, so these are modeled directly on that base
//! contract plus `SPEC_FULL.md` §4.7).

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::warn;

use crate::format::{self, CompressionFormat, UseSystem};
use crate::path::PathBufExt;
use crate::wrapper::CloseContext;

/// A listener that compresses the closed file's path with `format`.
///
/// A no-op when the closed handle has no path (e.g. stdin). The
/// destination path is recorded in `result` for retrieval once the
/// listener has fired.
pub fn compress_on_close(
    format: CompressionFormat,
    result: Arc<Mutex<Option<PathBuf>>>,
) -> Box<dyn FnMut(&CloseContext<'_>) + Send> {
    Box::new(move |ctx: &CloseContext<'_>| {
        let Some(path) = ctx.path else { return };
        let mut dest = path.to_path_buf();
        if !dest.add_extension(format.default_ext) {
            warn!("compress-on-close: {} has no file name", path.display());
            return;
        }
        match format::transfer::compress_file(&format, path, Some(&dest), true, None, UseSystem::Never) {
            Ok(dest) => *result.lock().expect("result lock poisoned") = Some(dest),
            Err(e) => warn!("compress-on-close failed for {}: {e}", path.display()),
        }
    })
}

/// A listener that renames the closed file to `dest`.
///
/// A no-op when the closed handle has no path.
pub fn move_on_close(dest: PathBuf) -> Box<dyn FnMut(&CloseContext<'_>) + Send> {
    Box::new(move |ctx: &CloseContext<'_>| {
        let Some(path) = ctx.path else { return };
        if let Err(e) = std::fs::rename(path, &dest) {
            warn!("move-on-close failed for {}: {e}", path.display());
        }
    })
}

/// A listener that removes the closed file.
///
/// A no-op when the closed handle has no path.
pub fn delete_on_close() -> Box<dyn FnMut(&CloseContext<'_>) + Send> {
    Box::new(move |ctx: &CloseContext<'_>| {
        let Some(path) = ctx.path else { return };
        if let Err(e) = std::fs::remove_file(path) {
            warn!("delete-on-close failed for {}: {e}", path.display());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_on_close_is_noop_without_path() {
        let mut listener = delete_on_close();
        let ctx = CloseContext {
            path: None,
            compression: None,
        };
        // must not panic even though there is nothing to delete
        listener(&ctx);
    }

    #[test]
    fn move_on_close_renames_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dest = dir.path().join("b.txt");
        std::fs::write(&src, b"hi").unwrap();

        let mut listener = move_on_close(dest.clone());
        let ctx = CloseContext {
            path: Some(&src),
            compression: None,
        };
        listener(&ctx);

        assert!(!src.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"hi");
    }
}
