//! The compression-format registry: alias/MIME/magic-byte lookup.

use std::collections::HashMap;
use std::io::BufRead;
use std::ops::Range;

use log::warn;

use crate::error::Error;

/// An immutable record describing one compression format.
///
/// Built-in formats are constructed by [`super::builtins`]; callers may
/// register their own with [`FormatRegistry::register`].
#[derive(Clone, Debug)]
pub struct CompressionFormat {
    /// The canonical, lowercase name (e.g. `"gzip"`).
    pub name: &'static str,
    /// Every alias this format is known by, including filename extensions
    /// and executable names. Does not need to repeat `name`.
    pub aliases: &'static [&'static str],
    /// The extension appended by `compress_file` when no destination is given.
    pub default_ext: &'static str,
    /// Resolvable external executable names, most preferred first.
    pub executables: &'static [&'static str],
    /// MIME types this format is known by.
    pub mime_types: &'static [&'static str],
    /// One or more magic byte prefixes identifying this format.
    pub magic_bytes: &'static [&'static [u8]],
    /// The valid compression-level range, inclusive.
    pub level_range: Range<u8>,
    /// The level used when the caller does not specify one.
    pub default_level: u8,
    /// The flag emitted to request `n` threads from the external tool, if
    /// the format supports parallel (de)compression.
    pub parallel_flag: Option<&'static str>,
}

impl CompressionFormat {
    /// Clamp `level` into this format's valid range, or return the default.
    pub fn clamp_level(&self, level: Option<u8>) -> u8 {
        match level {
            None => self.default_level,
            Some(l) => l.clamp(self.level_range.start, self.level_range.end - 1),
        }
    }
}

/// The process-wide table of known compression formats.
///
/// Registration is additive: later registrations may add new aliases to
/// the alias map, and on alias collision the last writer wins (a `warn!`
/// is logged so the collision isn't silent).
#[derive(Clone, Debug, Default)]
pub struct FormatRegistry {
    formats: HashMap<&'static str, CompressionFormat>,
    alias_to_name: HashMap<String, &'static str>,
    mime_to_name: HashMap<&'static str, &'static str>,
    /// First magic byte -> candidates sharing it, with their full magic
    /// sequence for remainder matching.
    magic_index: HashMap<u8, Vec<(&'static str, &'static [u8])>>,
    max_magic_length: usize,
}

impl FormatRegistry {
    /// An empty registry with none of the built-in formats.
    pub fn empty() -> Self {
        FormatRegistry::default()
    }

    /// A registry pre-populated with every built-in format this crate
    /// ships (gated by feature flags), plus the supplemental `zstd` format.
    pub fn with_builtins() -> Self {
        let mut reg = FormatRegistry::empty();
        for format in super::builtins::all() {
            reg.register(format);
        }
        reg
    }

    /// Install `format`, indexing it by name, every alias, its MIME types,
    /// and its magic prefixes.
    pub fn register(&mut self, format: CompressionFormat) {
        let name = format.name;

        if self.alias_to_name.contains_key(name) && self.alias_to_name[name] != name {
            warn!(
                "format {:?} is also registered as an alias of {:?}; {:?} now wins",
                name, self.alias_to_name[name], name
            );
        }
        self.alias_to_name.insert(name.to_string(), name);

        for alias in format.aliases {
            if let Some(prev) = self.alias_to_name.insert((*alias).to_string(), name) {
                if prev != name {
                    warn!(
                        "alias {:?} was registered to format {:?}, now reassigned to {:?}",
                        alias, prev, name
                    );
                }
            }
        }

        for mime in format.mime_types {
            if let Some(prev) = self.mime_to_name.insert(mime, name) {
                if prev != name {
                    warn!(
                        "MIME type {:?} was registered to format {:?}, now reassigned to {:?}",
                        mime, prev, name
                    );
                }
            }
        }

        for magic in format.magic_bytes {
            if let Some(&first) = magic.first() {
                self.magic_index.entry(first).or_default().push((name, magic));
                self.max_magic_length = self.max_magic_length.max(magic.len());
            }
        }

        self.formats.insert(name, format);
    }

    /// The longest magic-byte sequence registered, i.e. how many bytes
    /// [`Self::guess_by_peekable`]/[`Self::guess_by_header`] must read.
    pub fn max_magic_length(&self) -> usize {
        self.max_magic_length
    }

    /// Look up a format by canonical name or alias.
    pub fn get(&self, name: &str) -> Result<&CompressionFormat, Error> {
        let canonical = self
            .alias_to_name
            .get(name)
            .ok_or_else(|| Error::UnknownFormat {
                name: name.to_string(),
            })?;
        Ok(&self.formats[canonical])
    }

    /// The canonical name for an alias, or `None` if unregistered.
    pub fn canonical(&self, name: &str) -> Option<&'static str> {
        self.alias_to_name.get(name).copied()
    }

    /// Guess a format from a path or bare extension.
    ///
    /// Aliases are matched in full first (so `"foo.tar.gz"` resolves via a
    /// `"tar.gz"` alias before falling back to the rightmost extension),
    /// then the rightmost extension component is tried.
    pub fn guess_by_name(&self, path_or_ext: &str) -> Option<&'static str> {
        if let Some(name) = self.alias_to_name.get(path_or_ext) {
            return Some(*name);
        }
        // Try progressively longer dotted suffixes (`tar.gz` before `gz`)
        // so a multi-component alias wins over a single-extension one.
        let mut rest = path_or_ext;
        while let Some((_, suffix)) = rest.split_once('.') {
            if let Some(name) = self.alias_to_name.get(suffix) {
                return Some(*name);
            }
            rest = suffix;
        }
        None
    }

    /// Guess a format from a byte prefix.
    ///
    /// Matching is exact on the first byte, then checks that `prefix`
    /// starts with the candidate's full magic sequence.
    pub fn guess_by_bytes(&self, prefix: &[u8]) -> Option<&'static str> {
        let first = *prefix.first()?;
        let candidates = self.magic_index.get(&first)?;
        candidates
            .iter()
            .find(|(_, magic)| prefix.starts_with(magic))
            .map(|(name, _)| *name)
    }

    /// Peek up to [`Self::max_magic_length`] bytes from `stream` without
    /// consuming them, then guess via [`Self::guess_by_bytes`].
    pub fn guess_by_peekable<R: BufRead>(&self, stream: &mut R) -> std::io::Result<Option<&'static str>> {
        let want = self.max_magic_length;
        let buf = stream.fill_buf()?;
        let take = want.min(buf.len());
        Ok(self.guess_by_bytes(&buf[..take]))
    }

    /// Read up to [`Self::max_magic_length`] bytes from the start of `path`
    /// and guess via [`Self::guess_by_bytes`].
    ///
    /// Destructive on pipes/FIFOs since it reads from whatever is at the
    /// start of the stream right now; only meaningful for seekable sources
    /// where the caller has already rewound, or genuinely one-shot reads.
    pub fn guess_by_header(&self, path: &std::path::Path) -> std::io::Result<Option<&'static str>> {
        use std::io::Read;
        let mut f = std::fs::File::open(path)?;
        let mut buf = vec![0u8; self.max_magic_length];
        let n = f.read(&mut buf)?;
        buf.truncate(n);
        Ok(self.guess_by_bytes(&buf))
    }

    /// The canonical name registered for `mime`, or `None`.
    pub fn by_mime(&self, mime: &str) -> Option<&'static str> {
        self.mime_to_name.get(mime).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_closure() {
        let reg = FormatRegistry::with_builtins();
        for format in reg.formats.values() {
            for alias in format.aliases.iter().chain(std::iter::once(&format.name)) {
                let got = reg.get(alias).unwrap();
                assert_eq!(got.name, format.name);
                let guessed = reg.guess_by_name(&format!("any.{alias}"));
                assert_eq!(guessed, Some(format.name));
            }
        }
    }

    #[test]
    fn guess_by_name_prefers_full_alias_match() {
        let mut reg = FormatRegistry::empty();
        reg.register(CompressionFormat {
            name: "targz",
            aliases: &["tar.gz"],
            default_ext: "tar.gz",
            executables: &[],
            mime_types: &[],
            magic_bytes: &[],
            level_range: 1..10,
            default_level: 6,
            parallel_flag: None,
        });
        reg.register(CompressionFormat {
            name: "gzip",
            aliases: &["gz"],
            default_ext: "gz",
            executables: &[],
            mime_types: &[],
            magic_bytes: &[&[0x1f, 0x8b]],
            level_range: 1..10,
            default_level: 6,
            parallel_flag: None,
        });
        assert_eq!(reg.guess_by_name("archive.tar.gz"), Some("targz"));
        assert_eq!(reg.guess_by_name("plain.gz"), Some("gzip"));
    }

    #[test]
    fn guess_by_bytes_matches_magic() {
        let reg = FormatRegistry::with_builtins();
        assert_eq!(
            reg.guess_by_bytes(&[0x1f, 0x8b, 0x08, 0x00]),
            Some("gzip")
        );
        assert_eq!(reg.guess_by_bytes(&[b'B', b'Z', b'h', b'9']), Some("bz2"));
        assert_eq!(reg.guess_by_bytes(&[0x00, 0x01]), None);
    }

    #[test]
    fn last_writer_wins_on_alias_collision() {
        let mut reg = FormatRegistry::empty();
        let a = CompressionFormat {
            name: "a",
            aliases: &["shared"],
            default_ext: "a",
            executables: &[],
            mime_types: &[],
            magic_bytes: &[],
            level_range: 0..1,
            default_level: 0,
            parallel_flag: None,
        };
        let b = CompressionFormat {
            name: "b",
            aliases: &["shared"],
            default_ext: "b",
            executables: &[],
            mime_types: &[],
            magic_bytes: &[],
            level_range: 0..1,
            default_level: 0,
            parallel_flag: None,
        };
        reg.register(a);
        reg.register(b);
        assert_eq!(reg.canonical("shared"), Some("b"));
    }
}
