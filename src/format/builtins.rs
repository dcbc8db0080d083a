//! The built-in compression formats registered by [`super::FormatRegistry::with_builtins`].
//!
//! The `gzip`/`bz2`/`lzma` table matches this crate's required built-ins
//! exactly; `zstd` is a supplemental addition (see `DESIGN.md`).

use super::registry::CompressionFormat;

const GZIP: CompressionFormat = CompressionFormat {
    name: "gzip",
    aliases: &["gz", "pigz"],
    default_ext: "gz",
    executables: &["pigz", "gzip"],
    mime_types: &[
        "application/gzip",
        "application/x-gzip",
        "application/x-gunzip",
    ],
    magic_bytes: &[&[0x1f, 0x8b]],
    level_range: 1..10,
    default_level: 6,
    parallel_flag: Some("-p"),
};

const BZ2: CompressionFormat = CompressionFormat {
    name: "bz2",
    aliases: &["bzip", "bzip2", "pbzip2"],
    default_ext: "bz2",
    executables: &["pbzip2", "bzip2"],
    mime_types: &["application/x-bzip2", "application/x-bzip"],
    magic_bytes: &[&[b'B', b'Z', b'h']],
    level_range: 1..10,
    default_level: 6,
    parallel_flag: Some("-p"),
};

const LZMA: CompressionFormat = CompressionFormat {
    name: "lzma",
    aliases: &["xz", "7z", "7zip"],
    default_ext: "xz",
    executables: &["xz", "lzma"],
    mime_types: &[
        "application/x-xz",
        "application/x-lzma",
        "application/x-7z-compressed",
    ],
    magic_bytes: &[
        &[0xfd, b'7', b'z', b'X', b'Z', 0x00],
        // legacy `.lzma` (lzma_alone) stream: first byte is a properties
        // byte that in practice is almost always 0x5D.
        &[0x5d, 0x00, 0x00],
        // 7z container magic.
        &[b'7', b'z', 0xbc, 0xaf, 0x27, 0x1c],
    ],
    level_range: 0..10,
    default_level: 6,
    parallel_flag: Some("-T"),
};

const ZSTD: CompressionFormat = CompressionFormat {
    name: "zstd",
    aliases: &["zst"],
    default_ext: "zst",
    executables: &["zstd"],
    mime_types: &["application/zstd", "application/x-zstd"],
    magic_bytes: &[&[0x28, 0xb5, 0x2f, 0xfd]],
    level_range: 1..23,
    default_level: 3,
    parallel_flag: Some("-T"),
};

/// Every built-in format, in registration order.
pub(super) fn all() -> Vec<CompressionFormat> {
    vec![GZIP, BZ2, LZMA, ZSTD]
}
