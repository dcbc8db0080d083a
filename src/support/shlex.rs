//! Minimal POSIX-ish shell-word splitting for the `"|<command>"` source
//! grammar (`spec.md` §6).
//!
//! No crate in this workspace's reference pack provides a shell-word
//! splitter, so this is hand-rolled rather than pulling in an unrelated
//! dependency (see `DESIGN.md`). Supports single/double quoting and
//! backslash escapes; it is not a full shell grammar (no globbing,
//! variable expansion, or command substitution — the process adapter
//! spawns the resulting argv directly, it never invokes a shell).

/// Split `command` into argv the way a POSIX shell would word-split it.
pub fn split(command: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut have_current = false;
    let mut chars = command.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' | '\n' => {
                if have_current {
                    words.push(std::mem::take(&mut current));
                    have_current = false;
                }
            }
            '\'' => {
                have_current = true;
                for c in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                    current.push(c);
                }
            }
            '"' => {
                have_current = true;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => {
                            if let Some(&next) = chars.peek() {
                                if next == '"' || next == '\\' {
                                    current.push(next);
                                    chars.next();
                                    continue;
                                }
                            }
                            current.push('\\');
                        }
                        other => current.push(other),
                    }
                }
            }
            '\\' => {
                have_current = true;
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            other => {
                have_current = true;
                current.push(other);
            }
        }
    }
    if have_current {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_words() {
        assert_eq!(split("cat -n"), vec!["cat", "-n"]);
    }

    #[test]
    fn handles_double_quotes() {
        assert_eq!(
            split(r#"echo "hello world""#),
            vec!["echo", "hello world"]
        );
    }

    #[test]
    fn handles_single_quotes_without_escapes() {
        assert_eq!(split(r"grep 'a\b'"), vec!["grep", r"a\b"]);
    }

    #[test]
    fn handles_backslash_escape_outside_quotes() {
        assert_eq!(split(r"echo foo\ bar"), vec!["echo", "foo bar"]);
    }

    #[test]
    fn collapses_repeated_whitespace() {
        assert_eq!(split("a   b\tc"), vec!["a", "b", "c"]);
    }
}
