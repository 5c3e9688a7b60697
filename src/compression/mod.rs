// src/compression/mod.rs
//! Compression detection for package archives
//!
//! Packages arrive as plain tar or as gzip/xz/zstd compressed tar (`.tgz`,
//! `.txz`, `.tzst`). The format is sniffed from the first bytes of the
//! stream, so the caller never has to know which one it holds.

use std::io::{self, BufRead, BufReader, Read};
use strum_macros::{Display, EnumIter};
use thiserror::Error;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("cannot start {format} decompression: {source}")]
    Decoder {
        format: CompressionFormat,
        source: io::Error,
    },

    #[error("cannot read package header: {0}")]
    Peek(#[source] io::Error),
}

impl From<CompressionError> for crate::Error {
    fn from(err: CompressionError) -> Self {
        crate::Error::Archive(err.to_string())
    }
}

/// Outer encoding of a package file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum CompressionFormat {
    /// Bare tar
    None,
    Gzip,
    Xz,
    Zstd,
}

impl CompressionFormat {
    /// Sniff the format from the leading bytes of a package
    ///
    /// Anything without a known magic number is taken to be bare tar; the
    /// archive reader reports it if it is not.
    pub fn sniff(head: &[u8]) -> Self {
        [(GZIP_MAGIC, Self::Gzip), (XZ_MAGIC, Self::Xz), (ZSTD_MAGIC, Self::Zstd)]
            .into_iter()
            .find(|(magic, _)| head.starts_with(magic))
            .map_or(Self::None, |(_, format)| format)
    }

    /// Conventional package file suffix for this format
    pub fn package_suffix(&self) -> &'static str {
        match self {
            Self::None => ".tar",
            Self::Gzip => ".tgz",
            Self::Xz => ".txz",
            Self::Zstd => ".tzst",
        }
    }
}

/// Wrap a reader in the decoder matching its leading magic bytes
///
/// The stream is peeked through a `BufReader`, so no bytes are lost for the
/// uncompressed case.
pub fn open_decoder<'a, R: Read + 'a>(
    reader: R,
) -> Result<(CompressionFormat, Box<dyn Read + 'a>), CompressionError> {
    let mut buffered = BufReader::new(reader);
    let format = CompressionFormat::sniff(
        buffered.fill_buf().map_err(CompressionError::Peek)?,
    );

    let decoder: Box<dyn Read + 'a> = match format {
        CompressionFormat::None => Box::new(buffered),
        CompressionFormat::Gzip => Box::new(flate2::read::GzDecoder::new(buffered)),
        CompressionFormat::Xz => Box::new(xz2::read::XzDecoder::new(buffered)),
        CompressionFormat::Zstd => {
            let decoder = zstd::Decoder::with_buffer(buffered).map_err(|e| {
                CompressionError::Decoder {
                    format: CompressionFormat::Zstd,
                    source: e,
                }
            })?;
            Box::new(decoder)
        }
    };

    Ok((format, decoder))
}
