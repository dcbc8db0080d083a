//! Executable resolution, cached for the lifetime of the process.
//!
//! Grounded in `xphyle.paths.ExecutableCache`: resolve a list of candidate
//! names against `$PATH` (plus any extra directories from
//! [`crate::config::Config::executable_search_paths`]), most-preferred
//! name first, and remember the answer until [`reset`] is called.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{OnceLock, RwLock};

use crate::config::Config;

fn cache() -> &'static RwLock<HashMap<String, Option<(PathBuf, String)>>> {
    static CACHE: OnceLock<RwLock<HashMap<String, Option<(PathBuf, String)>>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Find the first of `names` that resolves to an executable file,
/// searching `$PATH` plus the configured extra search paths.
///
/// Returns the resolved path and the name that matched. Cached per the
/// exact `names` list given; call [`reset`] to forget cached answers (e.g.
/// after `$PATH` changes).
pub fn resolve(names: &[&'static str]) -> Option<(PathBuf, String)> {
    let key = names.join(",");
    if let Some(hit) = cache().read().expect("exe cache lock poisoned").get(&key) {
        return hit.clone();
    }

    let search_paths = search_dirs();
    let found = names.iter().find_map(|name| {
        search_paths.iter().find_map(|dir| {
            let candidate = dir.join(name);
            if is_executable_file(&candidate) {
                Some((candidate, (*name).to_string()))
            } else {
                None
            }
        })
    });

    cache()
        .write()
        .expect("exe cache lock poisoned")
        .insert(key, found.clone());
    found
}

/// Forget every cached resolution.
pub fn reset() {
    cache().write().expect("exe cache lock poisoned").clear();
}

fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Config::current().executable_search_paths().to_vec();
    if let Some(path_var) = std::env::var_os("PATH") {
        dirs.extend(std::env::split_paths(&path_var));
    }
    dirs
}

#[cfg(unix)]
fn is_executable_file(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &std::path::Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolvable_names_return_none() {
        reset();
        assert_eq!(
            resolve(&["definitely-not-a-real-executable-name-xyz"]),
            None
        );
    }
}
