//! File-mode parsing shared by every transport the opener supports.
//!
//! A [`FileMode`] is a pair of an access mode and a coding (text or binary),
//! parsed from and rendered to the canonical two-character form used
//! throughout this crate's public API (`"rt"`, `"wb"`, `"r+b"`, ...).

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// How a stream may be used: read, write, both, or append.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum ModeAccess {
    /// Open for reading only. Fails if the source does not exist.
    Read,
    /// Open for writing only, truncating any existing content.
    Write,
    /// Open for both reading and writing, truncating any existing content.
    TruncateReadWrite,
    /// Open for both reading and writing without truncating.
    ReadWrite,
    /// Open for writing only, appending to any existing content.
    Append,
    /// Open for writing only, failing if the destination already exists.
    Exclusive,
}

impl ModeAccess {
    /// Whether this access mode permits reads.
    pub fn readable(self) -> bool {
        matches!(
            self,
            ModeAccess::Read | ModeAccess::ReadWrite | ModeAccess::TruncateReadWrite
        )
    }

    /// Whether this access mode permits writes.
    pub fn writable(self) -> bool {
        !matches!(self, ModeAccess::Read)
    }

    fn char(self) -> char {
        match self {
            ModeAccess::Read => 'r',
            ModeAccess::Write | ModeAccess::TruncateReadWrite => 'w',
            ModeAccess::ReadWrite => 'r',
            ModeAccess::Append => 'a',
            ModeAccess::Exclusive => 'x',
        }
    }

    fn plus(self) -> bool {
        matches!(self, ModeAccess::ReadWrite | ModeAccess::TruncateReadWrite)
    }
}

/// Whether a stream yields/accepts `str` text or raw bytes.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum ModeCoding {
    /// Decode/encode as UTF-8 text.
    Text,
    /// Pass bytes through unchanged.
    Binary,
}

impl ModeCoding {
    fn char(self) -> Option<char> {
        match self {
            ModeCoding::Text => None,
            ModeCoding::Binary => Some('b'),
        }
    }
}

/// A parsed `[rwax][+]?[bt]?U?` mode string.
///
/// `"U"` (universal newlines) is accepted while parsing and then discarded;
/// it is incompatible with an explicit binary coding.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct FileMode {
    access: ModeAccess,
    coding: ModeCoding,
}

impl FileMode {
    /// The canonical read-text mode, the opener's default.
    pub const READ_TEXT: FileMode = FileMode {
        access: ModeAccess::Read,
        coding: ModeCoding::Text,
    };

    /// Build a mode directly from its parts.
    pub fn new(access: ModeAccess, coding: ModeCoding) -> Self {
        FileMode { access, coding }
    }

    /// The access component.
    pub fn access(self) -> ModeAccess {
        self.access
    }

    /// The coding component.
    pub fn coding(self) -> ModeCoding {
        self.coding
    }

    /// Whether this mode permits reads.
    pub fn readable(self) -> bool {
        self.access.readable()
    }

    /// Whether this mode permits writes.
    pub fn writable(self) -> bool {
        self.access.writable()
    }

    /// Whether this mode decodes/encodes text.
    pub fn text(self) -> bool {
        self.coding == ModeCoding::Text
    }

    /// Whether this mode passes raw bytes.
    pub fn binary(self) -> bool {
        self.coding == ModeCoding::Binary
    }

    /// Return the same access with binary coding.
    pub fn as_binary(self) -> Self {
        FileMode {
            access: self.access,
            coding: ModeCoding::Binary,
        }
    }

    /// Return the same access with text coding.
    pub fn as_text(self) -> Self {
        FileMode {
            access: self.access,
            coding: ModeCoding::Text,
        }
    }
}

impl Default for FileMode {
    fn default() -> Self {
        FileMode::READ_TEXT
    }
}

impl FromStr for FileMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut access = None;
        let mut plus = false;
        let mut coding = None;

        for c in s.chars() {
            match c {
                'r' if access.is_none() => access = Some(ModeAccess::Read),
                'w' if access.is_none() => access = Some(ModeAccess::Write),
                'a' if access.is_none() => access = Some(ModeAccess::Append),
                'x' if access.is_none() => access = Some(ModeAccess::Exclusive),
                '+' if access.is_some() && !plus => plus = true,
                't' if coding.is_none() => coding = Some(ModeCoding::Text),
                'b' if coding.is_none() => coding = Some(ModeCoding::Binary),
                'U' => {
                    // universal newlines: accepted, carries no information
                }
                _ => {
                    return Err(Error::InvalidMode {
                        mode: s.to_string(),
                    })
                }
            }
        }

        let access = access.ok_or_else(|| Error::InvalidMode {
            mode: s.to_string(),
        })?;
        let coding = coding.unwrap_or(ModeCoding::Text);

        if plus && coding == ModeCoding::Binary && s.contains('U') {
            return Err(Error::InvalidMode {
                mode: s.to_string(),
            });
        }

        let access = match (access, plus) {
            (ModeAccess::Read, true) => ModeAccess::ReadWrite,
            (ModeAccess::Write, true) => ModeAccess::TruncateReadWrite,
            (other, _) => other,
        };

        Ok(FileMode { access, coding })
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.access.char())?;
        if self.access.plus() {
            write!(f, "+")?;
        }
        if let Some(c) = self.coding.char() {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Which transport a [`crate::open::SourceDescriptor`] was classified as.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum FileType {
    /// Standard input or output.
    Stdio,
    /// A path on the local filesystem.
    Local,
    /// A remote resource addressed by URL.
    Url,
    /// A spawned subprocess's stdin/stdout.
    Process,
    /// A caller-provided, already-open stream.
    FileLike,
    /// A fresh or seeded in-memory buffer.
    Buffer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_canonicalisation() {
        let a: FileMode = "rt".parse().unwrap();
        let b: FileMode = "tr".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a.to_string(), "r");
    }

    #[test]
    fn default_is_read_text() {
        let m = FileMode::default();
        assert!(m.readable());
        assert!(!m.writable());
        assert!(m.text());
    }

    #[test]
    fn plus_forms_are_readwrite() {
        let m: FileMode = "r+b".parse().unwrap();
        assert!(m.readable());
        assert!(m.writable());
        assert!(m.binary());
        assert_eq!(m.access(), ModeAccess::ReadWrite);

        let m: FileMode = "w+".parse().unwrap();
        assert_eq!(m.access(), ModeAccess::TruncateReadWrite);
    }

    #[test]
    fn universal_newlines_is_stripped() {
        let m: FileMode = "rU".parse().unwrap();
        assert_eq!(m.to_string(), "r");
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<FileMode>().is_err());
        assert!("q".parse::<FileMode>().is_err());
        assert!("rw".parse::<FileMode>().is_err());
    }

    #[test]
    fn append_and_exclusive_are_write_only() {
        let m: FileMode = "a".parse().unwrap();
        assert!(!m.readable());
        assert!(m.writable());
        let m: FileMode = "x".parse().unwrap();
        assert!(!m.readable());
        assert!(m.writable());
    }
}
