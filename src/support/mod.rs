//! Small collaborator modules the core consumes through narrow
//! interfaces: path validation, executable resolution, URL transport,
//! progress hooks, and shell-word splitting for the `"|<command>"`
//! source grammar.

pub mod exe_cache;
pub mod paths;
#[cfg(feature = "progress")]
pub mod progress;
pub mod shlex;
#[cfg(feature = "url")]
pub mod url;

/// Marker interface for a record sink the CSV/property layer could
/// implement downstream; out of scope for this crate (see `spec.md` §1),
/// kept only so a caller can depend on a stable trait object shape.
pub trait RecordSink {
    /// Write one record's fields.
    fn write_record(&mut self, fields: &[&str]) -> std::io::Result<()>;
}

/// Marker interface for a record source the CSV/property layer could
/// implement downstream; see [`RecordSink`].
pub trait RecordSource {
    /// Read the next record's fields, or `None` at EOF.
    fn read_record(&mut self) -> std::io::Result<Option<Vec<String>>>;
}
