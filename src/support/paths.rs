//! Path validation, generalized from the teacher's `fs.rs` `NotAFileError`
//! check (read-only, "must be a file") to the full readable/writable
//! contract `xphyle.paths.check_readable_file`/`check_writeable_file`
//! describe.

use std::path::{Path, PathBuf};

use crate::error::Error;

/// Check that `path` exists, is a file, and is readable; return its
/// canonical form.
pub fn check_readable(path: &Path) -> Result<PathBuf, Error> {
    if !path.is_file() {
        return Err(Error::NotAFile {
            path: path.to_path_buf(),
        });
    }
    std::fs::File::open(path).map_err(|_| Error::NotReadable {
        path: path.display().to_string(),
    })?;
    path.canonicalize().map_err(Error::from)
}

/// Check that `path`'s parent directory exists (creating it when `mkdirs`
/// is set) and that the path is writable; return its canonical form.
///
/// Unlike [`check_readable`], the path itself need not already exist.
pub fn check_writable(path: &Path, mkdirs: bool) -> Result<PathBuf, Error> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        if !parent.exists() {
            if mkdirs {
                std::fs::create_dir_all(parent)?;
            } else {
                return Err(Error::NotWritable {
                    path: path.display().to_string(),
                });
            }
        }
    }

    let probe = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .open(path);
    match probe {
        Ok(_) => {}
        Err(_) => {
            return Err(Error::NotWritable {
                path: path.display().to_string(),
            })
        }
    }

    match path.canonicalize() {
        Ok(canon) => Ok(canon),
        Err(_) => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_readable() {
        let err = check_readable(Path::new("/does/not/exist/at/all")).unwrap_err();
        assert!(matches!(err, Error::NotAFile { .. }));
    }

    #[test]
    fn writable_creates_parent_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c.txt");
        check_writable(&nested, true).unwrap();
        assert!(nested.parent().unwrap().is_dir());
    }
}
