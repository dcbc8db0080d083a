//! The codec dispatcher: given a descriptor, mode, and compression hint,
//! decide which (if any) compression format applies.
//!
//! Grounded in xphyle's guess-then-validate branch inside `xopen()`.

use std::io::BufRead;

use crate::error::Error;
use crate::format::FormatRegistry;

/// The caller's compression request, as accepted by the opener.
#[derive(Clone, Debug)]
pub enum CompressionHint {
    /// No codec layer, regardless of content (`False`).
    Off,
    /// Guess from content or name; fail if nothing guesses (`True`).
    Guess,
    /// Guess from content or name; fall through to no codec if nothing
    /// guesses (`None`).
    GuessOrNone,
    /// An explicit format name.
    Named(String),
}

/// A byte source the dispatcher can peek for magic bytes, or a bare name
/// (e.g. a path) to guess from when peeking isn't possible.
pub enum Peekable<'a> {
    /// A buffered stream that can be peeked without consuming bytes.
    Stream(&'a mut dyn BufRead),
    /// No stream available; only name-based guessing applies.
    NameOnly,
}

/// Resolve `hint` against `registry`, consulting `peek` for content-based
/// guesses and `name` for name-based guesses, and validating against
/// `validate` when an explicit name is given.
///
/// Returns `Ok(None)` when no codec layer should be applied.
pub fn resolve(
    registry: &FormatRegistry,
    hint: &CompressionHint,
    name: Option<&str>,
    peek: Peekable<'_>,
    validate: bool,
) -> Result<Option<&'static str>, Error> {
    match hint {
        CompressionHint::Off => Ok(None),
        CompressionHint::Named(declared) => {
            let canonical = registry.canonical(declared).ok_or_else(|| Error::UnknownFormat {
                name: declared.clone(),
            })?;
            if validate {
                let guessed = guess(registry, name, peek)?;
                if guessed != Some(canonical) {
                    return Err(Error::FormatMismatch {
                        declared: canonical.to_string(),
                        detected: guessed.unwrap_or("none").to_string(),
                    });
                }
            }
            Ok(Some(canonical))
        }
        CompressionHint::Guess => {
            let guessed = guess(registry, name, peek)?;
            match guessed {
                Some(f) => Ok(Some(f)),
                None => Err(Error::FormatUnknown(
                    name.unwrap_or("<stream>").to_string(),
                )),
            }
        }
        CompressionHint::GuessOrNone => Ok(guess(registry, name, peek)?),
    }
}

fn guess(
    registry: &FormatRegistry,
    name: Option<&str>,
    peek: Peekable<'_>,
) -> Result<Option<&'static str>, Error> {
    match peek {
        Peekable::Stream(stream) => registry
            .guess_by_peekable(stream)
            .map_err(Error::from)
            .map(|guessed| guessed.or_else(|| name.and_then(|n| registry.guess_by_name(n)))),
        Peekable::NameOnly => match name {
            Some(n) => Ok(registry.guess_by_name(n)),
            None => Err(Error::CompressionNotGuessable),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn off_is_always_none() {
        let reg = FormatRegistry::with_builtins();
        let got = resolve(&reg, &CompressionHint::Off, Some("a.gz"), Peekable::NameOnly, false).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn guess_by_content_over_name() {
        let reg = FormatRegistry::with_builtins();
        let bytes = vec![0x1f, 0x8b, 0x08];
        let mut cursor = Cursor::new(bytes);
        let got = resolve(
            &reg,
            &CompressionHint::Guess,
            Some("a.xz"),
            Peekable::Stream(&mut cursor),
            false,
        )
        .unwrap();
        assert_eq!(got, Some("gzip"));
    }

    #[test]
    fn named_with_validate_mismatch() {
        let reg = FormatRegistry::with_builtins();
        let bytes = vec![0x1f, 0x8b, 0x08];
        let mut cursor = Cursor::new(bytes);
        let err = resolve(
            &reg,
            &CompressionHint::Named("bz2".to_string()),
            None,
            Peekable::Stream(&mut cursor),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, Error::FormatMismatch { .. }));
    }

    #[test]
    fn guess_or_none_falls_through() {
        let reg = FormatRegistry::with_builtins();
        let got = resolve(
            &reg,
            &CompressionHint::GuessOrNone,
            Some("plain.txt"),
            Peekable::NameOnly,
            false,
        )
        .unwrap();
        assert!(got.is_none());
    }
}
