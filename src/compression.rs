//! Block decompression codecs used by [`crate::block_storage`].

use num_enum::TryFromPrimitive;

use crate::error::{Error, Result};

/// Compression method tagged on a block or on a whole legacy archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum CompressionType {
    None = 0,
    Lzma = 1,
    Lz4 = 2,
    Lz4Hc = 3,
    /// Reserved by Unity; never emitted by any format this crate parses.
    Lzham = 4,
}

impl CompressionType {
    /// Parses the low 6 bits of a `BlockInfo`/`ArchiveBlockInfo` flags field.
    pub fn from_flags(flags: u32) -> Result<Self> {
        let raw = u8::try_from(flags & 0x3f).unwrap_or(0xff);
        Self::try_from(raw)
            .map_err(|_| Error::MissingCodec(format!("unknown compression type {raw}")))
    }
}

/// Decompresses a single block, given the method that was applied and the
/// exact output size (Unity always records this, so codecs that need it
/// don't have to guess).
pub fn decompress(kind: CompressionType, data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    match kind {
        CompressionType::None => {
            if data.len() < uncompressed_size {
                return Err(Error::Truncated);
            }
            Ok(data[..uncompressed_size].to_vec())
        },
        CompressionType::Lz4 | CompressionType::Lz4Hc => {
            lz4::block::decompress(data, Some(uncompressed_size.try_into().map_err(|_| {
                Error::corrupt("uncompressed size does not fit in i32")
            })?))
            .map_err(|e| Error::corrupt(format!("lz4 decompression failed: {e}")))
        },
        CompressionType::Lzma => decompress_lzma(data, uncompressed_size),
        CompressionType::Lzham => Err(Error::MissingCodec("LZHAM is not implemented".into())),
    }
}

/// Decodes Unity's raw LZMA1 blocks.
///
/// Unity writes a standalone LZMA1 stream: a 5-byte properties header
/// (1 byte packed lc/lp/pb, 4 bytes little-endian dictionary size) followed
/// by the raw compressed payload, with no embedded uncompressed-size field.
/// The property byte unpacks as `lc = props % 9`, `props /= 9`,
/// `lp = props % 5`, `pb = props / 5` — the same derivation CPython's
/// `lzma` module performs when building an LZMA1 filter by hand.
fn decompress_lzma(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    if data.len() < 5 {
        return Err(Error::Truncated);
    }

    let mut input = std::io::Cursor::new(data);
    let mut out = Vec::with_capacity(uncompressed_size);
    let options = lzma_rs::decompress::Options {
        unpacked_size: lzma_rs::decompress::UnpackedSize::UseProvided(Some(
            uncompressed_size as u64,
        )),
        ..Default::default()
    };
    lzma_rs::lzma_decompress_with_options(&mut input, &mut out, &options)
        .map_err(|e| Error::corrupt(format!("lzma decompression failed: {e}")))?;
    Ok(out)
}

/// Decompresses a whole-stream legacy LZMA payload, as used to wrap an
/// entire `UnityWeb` archive body rather than one block at a time.
///
/// Unlike [`decompress_lzma`], this is the standard ".lzma alone" container
/// (properties byte, dictionary size, then an 8-byte uncompressed-size
/// field), so the size doesn't need to be supplied separately.
pub fn decompress_lzma_stream(data: &[u8]) -> Result<Vec<u8>> {
    let mut input = std::io::Cursor::new(data);
    let mut out = Vec::new();
    lzma_rs::lzma_decompress(&mut input, &mut out)
        .map_err(|e| Error::corrupt(format!("lzma decompression failed: {e}")))?;
    Ok(out)
}
