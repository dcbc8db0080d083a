//! Process-wide configuration.
//!
//! Mirrors the original library's module-level `THREADS`/`EXECUTABLE_CACHE`
//! singletons as a single immutable record, replaced atomically by
//! [`configure`] and read thereafter through a lock-free snapshot.

use std::sync::{OnceLock, RwLock};

/// The process-wide configuration record.
///
/// Constructed once via [`Config::default`] or [`configure`]; readers call
/// [`Config::current`] to get a cloned snapshot rather than holding a lock.
#[derive(Clone, Debug)]
pub struct Config {
    /// Default thread count handed to parallelisable external codecs when
    /// the caller does not specify one explicitly.
    threads: u32,
    /// Whether `use_system` defaults to true when unspecified.
    use_system_default: bool,
    /// Extra directories searched before `$PATH` when resolving compressor
    /// executables.
    executable_search_paths: Vec<std::path::PathBuf>,
    /// Whether progress hooks are active by default.
    progress_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            threads: num_cpus::get() as u32,
            use_system_default: false,
            executable_search_paths: Vec::new(),
            progress_enabled: false,
        }
    }
}

impl Config {
    /// The default number of threads handed to parallel external codecs.
    pub fn threads(&self) -> u32 {
        self.threads
    }

    /// Whether `use_system` is assumed when the caller leaves it unspecified.
    pub fn use_system_default(&self) -> bool {
        self.use_system_default
    }

    /// Extra directories searched before `$PATH`.
    pub fn executable_search_paths(&self) -> &[std::path::PathBuf] {
        &self.executable_search_paths
    }

    /// Whether progress hooks run by default.
    pub fn progress_enabled(&self) -> bool {
        self.progress_enabled
    }

    /// Read the process-wide configuration.
    ///
    /// Returns the default configuration if [`configure`] has not been
    /// called yet.
    pub fn current() -> Config {
        slot().read().expect("config lock poisoned").clone()
    }
}

/// A builder passed to [`configure`] to change the process-wide defaults.
///
/// Unset fields keep the existing configured value (or the default, on the
/// first call).
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    threads: Option<u32>,
    use_system_default: Option<bool>,
    executable_search_paths: Option<Vec<std::path::PathBuf>>,
    progress_enabled: Option<bool>,
}

impl ConfigBuilder {
    /// Set the default thread count for parallel external codecs.
    pub fn threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Set whether `use_system` defaults to true.
    pub fn use_system_default(mut self, use_system_default: bool) -> Self {
        self.use_system_default = Some(use_system_default);
        self
    }

    /// Set the extra directories searched before `$PATH`.
    pub fn executable_search_paths(mut self, paths: Vec<std::path::PathBuf>) -> Self {
        self.executable_search_paths = Some(paths);
        self
    }

    /// Set whether progress hooks run by default.
    pub fn progress_enabled(mut self, progress_enabled: bool) -> Self {
        self.progress_enabled = Some(progress_enabled);
        self
    }
}

fn slot() -> &'static RwLock<Config> {
    static SLOT: OnceLock<RwLock<Config>> = OnceLock::new();
    SLOT.get_or_init(|| RwLock::new(Config::default()))
}

/// Atomically replace the process-wide configuration.
///
/// Subsequent calls to [`Config::current`] (and every module in this crate
/// that reads the shared config) observe the new record; in-flight
/// operations that already snapshotted the old record are unaffected.
pub fn configure(f: impl FnOnce(ConfigBuilder) -> ConfigBuilder) {
    let current = Config::current();
    let built = f(ConfigBuilder::default());
    let next = Config {
        threads: built.threads.unwrap_or(current.threads),
        use_system_default: built
            .use_system_default
            .unwrap_or(current.use_system_default),
        executable_search_paths: built
            .executable_search_paths
            .unwrap_or(current.executable_search_paths),
        progress_enabled: built.progress_enabled.unwrap_or(current.progress_enabled),
    };
    *slot().write().expect("config lock poisoned") = next;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threads_is_positive() {
        assert!(Config::current().threads() >= 1);
    }

    #[test]
    fn configure_overrides_only_given_fields() {
        configure(|c| c.threads(3));
        assert_eq!(Config::current().threads(), 3);
        configure(|c| c.progress_enabled(true));
        assert_eq!(Config::current().threads(), 3);
        assert!(Config::current().progress_enabled());
    }
}
