use pretty_assertions::assert_eq;
use std::io::{Read, Write};
use xopen::fs::{append, file_open_read, read, read_to_string, write};
use xopen::format::dispatch::CompressionHint;
use xopen::mode::{FileMode, ModeAccess, ModeCoding};
use xopen::open::{open, SourceDescriptor};

const LOREM_IPSUM: &str = r#"Lorem ipsum dolor sit amet, consetetur sadipscing elitr, sed diam nonumy eirmod
tempor invidunt ut labore et dolore magna aliquyam erat, sed diam voluptua. At
vero eos et accusam et justo duo dolores et ea rebum. Stet clita kasd gubergren,
no sea takimata sanctus est Lorem ipsum dolor sit amet. Lorem ipsum dolor sit
amet, consetetur sadipscing elitr, sed diam nonumy eirmod tempor invidunt ut
labore et dolore magna aliquyam erat, sed diam voluptua. At vero eos et accusam
et justo duo dolores et ea rebum. Stet clita kasd gubergren, no sea takimata
sanctus est Lorem ipsum dolor sit amet."#;

#[test]
fn round_trip_plaintext() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lorem.txt");
    write(&path, LOREM_IPSUM).unwrap();
    assert_eq!(read_to_string(&path).unwrap(), LOREM_IPSUM);
}

#[test]
fn round_trip_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.txt");
    write(&path, b"").unwrap();
    assert_eq!(read_to_string(&path).unwrap(), "");
}

#[cfg(feature = "file-gz")]
#[test]
fn round_trip_gz() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lorem.txt.gz");
    write(&path, LOREM_IPSUM).unwrap();
    assert_eq!(read(&path).unwrap(), LOREM_IPSUM.as_bytes());
    // a gzip member really was written, not plain text
    assert_ne!(std::fs::read(&path).unwrap(), LOREM_IPSUM.as_bytes());
}

#[cfg(feature = "file-bz2")]
#[test]
fn round_trip_bz2() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lorem.txt.bz2");
    write(&path, LOREM_IPSUM).unwrap();
    assert_eq!(read(&path).unwrap(), LOREM_IPSUM.as_bytes());
}

#[cfg(feature = "file-xz")]
#[test]
fn round_trip_xz() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lorem.txt.xz");
    write(&path, LOREM_IPSUM).unwrap();
    assert_eq!(read(&path).unwrap(), LOREM_IPSUM.as_bytes());
}

#[cfg(feature = "file-zstd")]
#[test]
fn round_trip_zstd() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lorem.txt.zst");
    write(&path, LOREM_IPSUM).unwrap();
    assert_eq!(read(&path).unwrap(), LOREM_IPSUM.as_bytes());
}

#[test]
fn append_adds_without_truncating() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.txt");
    write(&path, "first\n").unwrap();
    append(&path, "second\n").unwrap();
    assert_eq!(read_to_string(&path).unwrap(), "first\nsecond\n");
}

#[test]
fn file_open_read_detects_compression_from_content_when_extension_lies() {
    let dir = tempfile::tempdir().unwrap();
    // write a real gzip stream under a `.bin` name, then confirm the
    // opener's content-based guess still decompresses it transparently
    let path = dir.path().join("payload.bin");
    let registry = xopen::format::FormatRegistry::with_builtins();
    {
        let mut w = xopen::format::open_compress(
            registry.get("gzip").unwrap(),
            xopen::format::PathOrSink::Path(path.clone()),
            xopen::format::UseSystem::Never,
            None,
            None,
        )
        .unwrap();
        w.write_all(LOREM_IPSUM.as_bytes()).unwrap();
    }
    let mut reader = file_open_read(&path).unwrap();
    let mut content = String::new();
    reader.read_to_string(&mut content).unwrap();
    assert_eq!(content, LOREM_IPSUM);
}

#[test]
fn opener_explicit_mode_and_compression_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("explicit.gz");
    {
        let handle = open(SourceDescriptor::Path(path.clone()))
            .mode(FileMode::new(ModeAccess::Write, ModeCoding::Binary))
            .compression(CompressionHint::Named("gzip".to_string()))
            .level(9)
            .open()
            .unwrap();
        let mut writer = handle.into_writer().unwrap();
        writer.write_all(LOREM_IPSUM.as_bytes()).unwrap();
        writer.close().unwrap();
    }
    let handle = open(SourceDescriptor::Path(path))
        .mode(FileMode::new(ModeAccess::Read, ModeCoding::Binary))
        .compression(CompressionHint::Guess)
        .open()
        .unwrap();
    assert_eq!(handle.compression(), Some("gzip"));
    let mut reader = handle.into_reader().unwrap();
    let mut content = Vec::new();
    reader.read_to_end(&mut content).unwrap();
    assert_eq!(content, LOREM_IPSUM.as_bytes());
}

#[cfg(feature = "process")]
#[test]
fn process_read_side_captures_stdout() {
    let handle = open(SourceDescriptor::ShellCommand(
        "echo hello-from-process".to_string(),
    ))
    .mode(FileMode::new(ModeAccess::Read, ModeCoding::Binary))
    .compression(CompressionHint::Off)
    .open()
    .unwrap();
    let mut reader = handle.into_reader().unwrap();
    let mut content = String::new();
    reader.read_to_string(&mut content).unwrap();
    assert_eq!(content, "hello-from-process\n");
}
