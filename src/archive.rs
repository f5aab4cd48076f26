//! Parses the outer container: `UnityRaw`/`UnityWeb`/`UnityFS` signature
//! dispatch, header parsing, and random-access presentation of the
//! serialized files (or raw resource blobs) a bundle carries.

use std::cell::RefCell;
use std::io::{Read, Seek, SeekFrom};

use binrw::{BinRead, NullString};
use modular_bitfield::prelude::*;
use once_cell::unsync::OnceCell;

use crate::block_storage::{Block, BlockStorage};
use crate::compression::{self, CompressionType};
use crate::error::{Error, Result, io_to_truncated};
use crate::reader::BinaryReader;
use crate::serialized_file::SerializedFile;
use crate::{FromInt, SeekRead};

/// Which of the three outer container signatures an archive declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// `UnityRaw`: uncompressed legacy bundle.
    Raw,
    /// `UnityWeb`: legacy bundle, whole-stream LZMA compressed.
    Web,
    /// `UnityFS`: modern bundle, per-block compression.
    Fs,
}

impl Signature {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "UnityRaw" => Ok(Self::Raw),
            "UnityWeb" => Ok(Self::Web),
            "UnityFS" => Ok(Self::Fs),
            other => Err(Error::unsupported(format!("unknown archive signature {other:?}"))),
        }
    }
}

/// The `flags` field of a `UnityFS` header. Bit layout matches Unity's own
/// `ArchiveFlags`: the low 6 bits select the metadata block's compression
/// (read separately via [`CompressionType::from_flags`]), and bit 7
/// (`blocks_info_at_end`) is the spec's "metadata at end" flag.
#[bitfield]
#[derive(Debug, Clone, Copy)]
struct ArchiveFlags {
    #[allow(dead_code)]
    compression: B6,
    #[allow(dead_code)]
    block_directory_merged: bool,
    blocks_info_at_end: bool,
    #[allow(dead_code)]
    old_web_plugin_compatible: bool,
    blocks_info_need_start_pad: bool,
    #[allow(dead_code)]
    #[skip]
    __: B22,
}

/// One file entry inside an archive: either a serialized file or a raw
/// resource blob (a `.resource` sibling, streamed in by a `StreamingInfo`).
struct Node {
    offset: u64,
    size: u64,
    name: String,
    /// Populated on first access when the archive's body is block-backed;
    /// unused (the bytes are already resident) for a flat body.
    cache: OnceCell<Vec<u8>>,
}

/// Wraps a boxed trait object so it can satisfy `BlockStorage`'s `Read +
/// Seek` bound without requiring `Archive` itself to stay generic over the
/// caller's reader type.
struct BoxedSource(Box<dyn SeekRead>);

impl Read for BoxedSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl Seek for BoxedSource {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.0.seek(pos)
    }
}

enum ArchiveBody {
    /// `UnityFS`: block-compressed, decompressed lazily per node.
    Blocks(RefCell<BlockStorage<BoxedSource>>),
    /// `UnityRaw`/`UnityWeb`: fully resident once the (possibly
    /// whole-stream-LZMA) body is read in.
    Flat(Vec<u8>),
}

/// A loaded `UnityRaw`/`UnityWeb`/`UnityFS` archive (a.k.a. AssetBundle).
///
/// Owns its byte source for its whole lifetime: node bytes borrowed from
/// [`Archive::serialized_file`] and [`Archive::resource_data`] are tied to
/// `&self`, not to any caller-held reader.
pub struct Archive {
    pub signature: Signature,
    pub format_version: i32,
    pub unity_version: String,
    pub generator_version: String,
    /// For `UnityRaw`/`UnityWeb`, the bundle's own declared name. For
    /// `UnityFS`, Unity itself reuses the first node's name here.
    pub name: String,
    body: ArchiveBody,
    nodes: Vec<Node>,
}

fn is_resource_name(name: &str) -> bool {
    name.ends_with(".resource")
}

impl Archive {
    /// Parses `source` as an archive. Accepts any of the three outer
    /// signatures; anything else is [`Error::Unsupported`].
    pub fn open<R: SeekRead + 'static>(mut source: R) -> Result<Self> {
        let signature_raw = NullString::read_be(&mut source)?;
        let signature = Signature::parse(&String::from_utf8_lossy(&signature_raw.0))?;
        let format_version = i32::read_be(&mut source)?;
        let unity_version = String::from_utf8_lossy(&NullString::read_be(&mut source)?.0).into_owned();
        let generator_version =
            String::from_utf8_lossy(&NullString::read_be(&mut source)?.0).into_owned();

        log::debug!("opening {signature:?} archive, format {format_version}, unity {unity_version}");
        match signature {
            Signature::Fs => Self::open_fs(source, format_version, unity_version, generator_version),
            Signature::Raw | Signature::Web => Self::open_legacy(
                source,
                signature,
                format_version,
                unity_version,
                generator_version,
            ),
        }
    }

    fn open_fs<R: SeekRead + 'static>(
        mut source: R,
        format_version: i32,
        unity_version: String,
        generator_version: String,
    ) -> Result<Self> {
        let file_size = i64::read_be(&mut source)?;
        let _ = file_size;
        let ciblock_size = u32::read_be(&mut source)?;
        let uiblock_size = u32::read_be(&mut source)?;
        let flags = u32::read_be(&mut source)?;

        let compression = CompressionType::from_flags(flags)?;
        let archive_flags = ArchiveFlags::from_bytes(flags.to_le_bytes());

        let meta_pos = source.stream_position().map_err(Error::from)?;
        let mut compressed_meta = vec![0u8; usize::from_int(ciblock_size)?];
        if archive_flags.blocks_info_at_end() {
            source
                .seek(SeekFrom::End(-i64::from(ciblock_size)))
                .map_err(Error::from)?;
            source.read_exact(&mut compressed_meta).map_err(io_to_truncated)?;
        } else {
            source.read_exact(&mut compressed_meta).map_err(io_to_truncated)?;
        }
        let block_data_start = if archive_flags.blocks_info_at_end() {
            meta_pos
        } else {
            source.stream_position().map_err(Error::from)?
        };

        let metadata = compression::decompress(compression, &compressed_meta, usize::from_int(uiblock_size)?)?;

        let mut mr = BinaryReader::new(&metadata, true);
        let _guid = mr.read_bytes(16)?;

        let block_count = mr.read_i32()?;
        let mut blocks = Vec::with_capacity(usize::from_int(block_count.max(0))?);
        for _ in 0..block_count {
            let block_uncompressed = u64::from(mr.read_u32()?);
            let block_compressed = u64::from(mr.read_u32()?);
            let block_flags = mr.read_i16()?;
            let block_compression = CompressionType::from_flags(u32::from(block_flags as u16) & 0x3f)?;
            blocks.push(Block {
                uncompressed_size: block_uncompressed,
                compressed_size: block_compressed,
                compression: block_compression,
            });
        }

        let node_count = mr.read_i32()?;
        let mut nodes = Vec::with_capacity(usize::from_int(node_count.max(0))?);
        for _ in 0..node_count {
            let offset = mr.read_i64()? as u64;
            let size = mr.read_i64()? as u64;
            let _status = mr.read_i32()?;
            let name = mr.read_cstring()?;
            nodes.push(Node {
                offset,
                size,
                name,
                cache: OnceCell::new(),
            });
        }

        source
            .seek(SeekFrom::Start(block_data_start))
            .map_err(Error::from)?;
        let boxed = BoxedSource(Box::new(source));
        let storage = BlockStorage::new(boxed, blocks)?;

        let name = nodes.first().map(|n| n.name.clone()).unwrap_or_default();
        Ok(Self {
            signature: Signature::Fs,
            format_version,
            unity_version,
            generator_version,
            name,
            body: ArchiveBody::Blocks(RefCell::new(storage)),
            nodes,
        })
    }

    fn open_legacy<R: SeekRead + 'static>(
        mut source: R,
        signature: Signature,
        format_version: i32,
        unity_version: String,
        generator_version: String,
    ) -> Result<Self> {
        let _file_size = u32::read_be(&mut source)?;
        let header_size = i32::read_be(&mut source)?;
        let _file_count = i32::read_be(&mut source)?;
        let _bundle_count = i32::read_be(&mut source)?;

        if format_version >= 2 {
            let _bundle_size = u32::read_be(&mut source)?;
            if format_version >= 3 {
                let _uncompressed_bundle_size = u32::read_be(&mut source)?;
            }
        }
        if header_size >= 60 {
            let _compressed_file_size = u32::read_be(&mut source)?;
            let _asset_header_size = u32::read_be(&mut source)?;
        }
        let _ = i32::read_be(&mut source)?;
        let _ = u8::read_be(&mut source)?;
        let bundle_name = String::from_utf8_lossy(&NullString::read_be(&mut source)?.0).into_owned();

        source
            .seek(SeekFrom::Start(u64::from_int(header_size.max(0))?))
            .map_err(Error::from)?;

        let compressed = signature == Signature::Web;
        let mut raw = Vec::new();
        source.read_to_end(&mut raw).map_err(Error::from)?;
        let body = if compressed {
            compression::decompress_lzma_stream(&raw)?
        } else {
            raw
        };

        let mut br = BinaryReader::new(&body, true);
        let num_assets = if compressed { 1 } else { br.read_i32()? };

        let mut nodes = Vec::with_capacity(usize::from_int(num_assets.max(0))?);
        for _ in 0..num_assets {
            let offset = br.position();
            let name = br.read_cstring()?;
            let asset_header_size = u64::from(br.read_u32()?);
            let size = u64::from(br.read_u32()?);
            let name_len = if is_resource_name(&name) { name.len() as u64 } else { 0 };
            let data_start = (offset + asset_header_size)
                .checked_sub(4 + name_len)
                .ok_or_else(|| Error::corrupt("asset header_size too small for data window"))?;
            nodes.push(Node {
                offset: data_start,
                size,
                name,
                cache: OnceCell::new(),
            });
        }

        Ok(Self {
            signature,
            format_version,
            unity_version,
            generator_version,
            name: bundle_name,
            body: ArchiveBody::Flat(body),
            nodes,
        })
    }

    /// Whether this archive's body is whole-stream compressed (legacy
    /// `UnityWeb` only; `UnityFS`'s per-block compression is tracked on
    /// each [`Block`] instead).
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.signature == Signature::Web
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn node_name(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(|n| n.name.as_str())
    }

    #[must_use]
    pub fn is_resource(&self, index: usize) -> bool {
        self.nodes.get(index).is_some_and(|n| is_resource_name(&n.name))
    }

    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Materializes (and caches) the raw bytes of node `index`.
    pub fn node_bytes(&self, index: usize) -> Result<&[u8]> {
        let node = self.nodes.get(index).ok_or_else(|| Error::not_found(format!("no node at index {index}")))?;
        match &self.body {
            ArchiveBody::Flat(buf) => {
                let start = usize::from_int(node.offset)?;
                let end = start
                    .checked_add(usize::from_int(node.size)?)
                    .ok_or_else(|| Error::corrupt("node range overflows"))?;
                buf.get(start..end).ok_or(Error::Truncated)
            },
            ArchiveBody::Blocks(storage) => node.cache.get_or_try_init(|| {
                let mut storage = storage.borrow_mut();
                storage.seek(SeekFrom::Start(node.offset)).map_err(Error::from)?;
                let mut buf = vec![0u8; usize::from_int(node.size)?];
                storage.read_exact(&mut buf).map_err(io_to_truncated)?;
                Ok(buf)
            }),
        }
        .map(Vec::as_slice)
    }

    /// Parses node `index` as a serialized file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] if the node is a `.resource` blob
    /// rather than a serialized file.
    pub fn serialized_file(&self, index: usize) -> Result<SerializedFile<'_>> {
        if self.is_resource(index) {
            return Err(Error::unsupported("node is a raw .resource blob, not a serialized file"));
        }
        SerializedFile::read(self.node_bytes(index)?)
    }

    /// The raw bytes of a `.resource` node, as referenced by a
    /// `StreamingInfo.path`.
    pub fn resource_data(&self, index: usize) -> Result<&[u8]> {
        self.node_bytes(index)
    }

    /// Parses every non-resource node as a serialized file, in node order.
    pub fn assets(&self) -> Result<Vec<SerializedFile<'_>>> {
        (0..self.node_count())
            .filter(|&i| !self.is_resource(i))
            .map(|i| self.serialized_file(i))
            .collect()
    }
}
