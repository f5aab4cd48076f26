//! Virtualized uncompressed stream over a sequence of compressed blocks, as
//! used by the `UnityFS` container format.

use std::io::{Read, Seek, SeekFrom};

use crate::compression::{self, CompressionType};
use crate::error::{Error, Result};

/// Descriptor for one compressed chunk. Immutable once parsed.
#[derive(Debug, Clone, Copy)]
pub struct Block {
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    pub compression: CompressionType,
}

/// Presents a seekable, uncompressed view over `blocks`, which are laid out
/// back-to-back (in their compressed form) starting at the current position
/// of `source`.
///
/// Only one decompressed block is cached at a time: a read that spans
/// several blocks decompresses each in turn and copies out the bytes it
/// needs, discarding the rest. This matches Unity's own reference behavior,
/// where blocks are capped around 128 KiB and re-reading the same block
/// repeatedly is rare.
///
/// Owns `source` outright (an owned file handle, in-memory cursor, or boxed
/// trait object all work) so a [`crate::archive::Archive`] can keep this
/// around for its whole lifetime without juggling borrows.
pub struct BlockStorage<R> {
    source: R,
    base: u64,
    blocks: Vec<Block>,
    /// Cumulative uncompressed offset at the start of each block.
    uncompressed_starts: Vec<u64>,
    /// Cumulative compressed offset at the start of each block.
    compressed_starts: Vec<u64>,
    total_len: u64,
    cursor: u64,
    cache: Option<(usize, Vec<u8>)>,
}

impl<R: Read + Seek> BlockStorage<R> {
    /// Builds a block storage over `blocks`, whose compressed bytes begin at
    /// the current position of `source`.
    pub fn new(mut source: R, blocks: Vec<Block>) -> Result<Self> {
        let base = source.stream_position().map_err(Error::from)?;

        let mut uncompressed_starts = Vec::with_capacity(blocks.len());
        let mut compressed_starts = Vec::with_capacity(blocks.len());
        let mut u = 0u64;
        let mut c = 0u64;
        for block in &blocks {
            uncompressed_starts.push(u);
            compressed_starts.push(c);
            u += block.uncompressed_size;
            c += block.compressed_size;
        }

        Ok(Self {
            source,
            base,
            blocks,
            uncompressed_starts,
            compressed_starts,
            total_len: u,
            cursor: 0,
            cache: None,
        })
    }

    /// Consumes the storage, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.source
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.total_len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_len == 0
    }

    /// Finds the index of the block containing virtual offset `pos`.
    fn block_for(&self, pos: u64) -> Result<usize> {
        if pos >= self.total_len {
            return Err(Error::Truncated);
        }
        // blocks are few (typically single digits to low hundreds); linear
        // scan is simpler than a binary search and never shows up in profiles.
        match self.uncompressed_starts.partition_point(|&start| start <= pos) {
            0 => Err(Error::corrupt("block storage offset before first block")),
            n => Ok(n - 1),
        }
    }

    fn decompressed_block(&mut self, index: usize) -> Result<&[u8]> {
        if !matches!(&self.cache, Some((i, _)) if *i == index) {
            let block = self.blocks[index];
            let compressed_start = self.compressed_starts[index];
            self.source
                .seek(SeekFrom::Start(self.base + compressed_start))
                .map_err(Error::from)?;

            let mut compressed = vec![0u8; block.compressed_size as usize];
            self.source.read_exact(&mut compressed).map_err(crate::error::io_to_truncated)?;

            let data = compression::decompress(
                block.compression,
                &compressed,
                block.uncompressed_size as usize,
            )?;
            self.cache = Some((index, data));
        }
        Ok(&self.cache.as_ref().expect("just populated").1)
    }
}

impl<R: Read + Seek> Read for BlockStorage<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.cursor >= self.total_len || buf.is_empty() {
            return Ok(0);
        }

        let index = self
            .block_for(self.cursor)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let block_start = self.uncompressed_starts[index];
        let data = self
            .decompressed_block(index)
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        let offset_in_block = (self.cursor - block_start) as usize;
        let available = data.len().saturating_sub(offset_in_block);
        let n = buf.len().min(available);
        buf[..n].copy_from_slice(&data[offset_in_block..offset_in_block + n]);
        self.cursor += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for BlockStorage<R> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(p) => p as i64,
            SeekFrom::End(delta) => self.total_len as i64 + delta,
            SeekFrom::Current(delta) => self.cursor as i64 + delta,
        };
        if new_pos < 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek to negative offset",
            ));
        }
        self.cursor = new_pos as u64;
        Ok(self.cursor)
    }
}
