//! Parses a serialized file (an "asset"): the per-file header, its
//! [`TypeMetadata`] schema catalogue, object directory, add table, and
//! external-asset reference table.
//!
//! A [`SerializedFile`] is a standalone document: it never names the
//! [`crate::archive::Archive`] it came from and never holds an owning
//! reference to another asset (see `DESIGN.md`'s note on the
//! `ObjectInfo`/`SerializedFile` cycle). Cross-asset resolution is the
//! job of [`crate::environment::Environment`].

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::object_reader;
use crate::reader::BinaryReader;
use crate::resources;
use crate::type_tree::{TypeMetadata, TypeTreeNode};
use crate::value::Value;

/// Directory record for one object inside a [`SerializedFile`].
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub path_id: i64,
    /// Byte offset relative to the asset's data segment start
    /// (`SerializedFile.data_offset`), not the start of the file.
    pub data_offset: u32,
    pub size: u32,
    pub type_id: i32,
    pub class_id: i32,
    /// `format ≤ 10` only.
    pub is_destroyed: Option<i16>,
    /// `11 ≤ format ≤ 16`; undocumented upstream, kept for fidelity only.
    pub unk0: Option<i16>,
    /// `15 ≤ format ≤ 16`; undocumented upstream, kept for fidelity only.
    pub unk1: Option<u8>,
}

/// A reference to another asset, recorded in one [`SerializedFile`]'s
/// external-reference table. Resolution (turning `file_path` into a loaded
/// asset) is [`crate::environment::Environment`]'s job, not this type's.
#[derive(Debug, Clone)]
pub struct AssetRef {
    pub asset_path: String,
    pub guid: [u8; 16],
    pub kind: i32,
    pub file_path: String,
}

/// One addressable unit inside an archive (or a standalone `.assets` file).
pub struct SerializedFile<'a> {
    /// The node name this file was read from, if known. Populated by
    /// [`crate::archive::Archive::serialized_file`]; empty for a file read
    /// directly via [`SerializedFile::read`].
    pub name: String,
    pub metadata_size: u32,
    pub file_size: u32,
    pub format: u32,
    pub data_offset: u32,
    pub big_endian: bool,
    pub long_object_ids: bool,
    pub type_metadata: TypeMetadata,
    objects: HashMap<i64, ObjectInfo>,
    /// On-disk order of the object directory (`objects` itself makes no
    /// ordering guarantee, matching the spec's resource-model note).
    object_order: Vec<i64>,
    pub adds: Vec<(i64, i32)>,
    pub asset_refs: Vec<AssetRef>,
    data: &'a [u8],
}

impl<'a> SerializedFile<'a> {
    /// Parses a serialized file from its full byte range (what an
    /// [`crate::archive::Archive`] node materializes, or a whole
    /// standalone `.assets` file).
    pub fn read(data: &'a [u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data, true);

        let metadata_size = reader.read_u32()?;
        let file_size = reader.read_u32()?;
        let format = reader.read_u32()?;
        if !(6..=17).contains(&format) {
            return Err(Error::unsupported(format!("serialized file format {format} is outside the supported 6..=17 range")));
        }
        let data_offset = reader.read_u32()?;

        if format >= 9 {
            let endianness = reader.read_u32()?;
            reader.set_big_endian(endianness != 0);
        }

        let type_metadata = TypeMetadata::load(&mut reader, format)?;

        let long_object_ids = if (7..=13).contains(&format) {
            reader.read_u32()? != 0
        } else {
            false
        };

        let num_objects = reader.read_u32()?;
        let mut objects = HashMap::with_capacity(num_objects as usize);
        let mut object_order = Vec::with_capacity(num_objects as usize);
        for _ in 0..num_objects {
            if format >= 14 {
                reader.align4()?;
            }
            let path_id = if format >= 14 || long_object_ids {
                reader.read_i64()?
            } else {
                i64::from(reader.read_i32()?)
            };

            let obj_data_offset = reader.read_u32()?;
            let size = reader.read_u32()?;

            let (type_id, class_id) = if format < 17 {
                let type_id = reader.read_i32()?;
                let class_id = i32::from(reader.read_i16()?);
                (type_id, class_id)
            } else {
                let type_id = reader.read_i32()?;
                let class_id = type_metadata.class_id_for_type_id(type_id)?;
                (type_id, class_id)
            };

            let is_destroyed = if format <= 10 { Some(reader.read_i16()?) } else { None };
            let unk0 = if (11..=16).contains(&format) { Some(reader.read_i16()?) } else { None };
            let unk1 = if (15..=16).contains(&format) { Some(reader.read_u8()?) } else { None };

            if objects
                .insert(
                    path_id,
                    ObjectInfo {
                        path_id,
                        data_offset: obj_data_offset,
                        size,
                        type_id,
                        class_id,
                        is_destroyed,
                        unk0,
                        unk1,
                    },
                )
                .is_some()
            {
                return Err(Error::corrupt(format!("duplicate path_id {path_id}")));
            }
            object_order.push(path_id);
        }

        let mut adds = Vec::new();
        if format >= 11 {
            let num_adds = reader.read_u32()?;
            adds.reserve(num_adds as usize);
            for _ in 0..num_adds {
                if format >= 14 {
                    reader.align4()?;
                }
                let id = if format >= 14 { reader.read_i64()? } else { i64::from(reader.read_i32()?) };
                let value = reader.read_i32()?;
                adds.push((id, value));
            }
        }

        let mut asset_refs = Vec::new();
        if format >= 6 {
            let num_refs = reader.read_u32()?;
            asset_refs.reserve(num_refs as usize);
            for _ in 0..num_refs {
                let asset_path = reader.read_cstring()?;
                let guid_bytes = reader.read_bytes(16)?;
                let mut guid = [0u8; 16];
                guid.copy_from_slice(guid_bytes);
                let kind = reader.read_i32()?;
                let file_path = reader.read_cstring()?;
                asset_refs.push(AssetRef { asset_path, guid, kind, file_path });
            }
        }

        let terminal = reader.read_cstring()?;
        if !terminal.is_empty() {
            return Err(Error::corrupt("non-empty terminal string after serialized file footer"));
        }

        Ok(Self {
            name: String::new(),
            metadata_size,
            file_size,
            format,
            data_offset,
            big_endian: reader.is_big_endian(),
            long_object_ids,
            type_metadata,
            objects,
            object_order,
            adds,
            asset_refs,
            data,
        })
    }

    #[must_use]
    pub fn objects(&self) -> &HashMap<i64, ObjectInfo> {
        &self.objects
    }

    /// The object directory in on-disk order (the `objects` map itself
    /// makes no ordering guarantee).
    #[must_use]
    pub fn object_order(&self) -> &[i64] {
        &self.object_order
    }

    #[must_use]
    pub fn object_info(&self, path_id: i64) -> Option<&ObjectInfo> {
        self.objects.get(&path_id)
    }

    /// The engine class name for an object's `class_id`, via the shared
    /// class table.
    #[must_use]
    pub fn type_name(&self, info: &ObjectInfo) -> String {
        resources::class_name_for(info.class_id)
    }

    fn type_tree_for(&self, info: &ObjectInfo) -> Option<&TypeTreeNode> {
        self.type_metadata
            .type_trees
            .get(&info.class_id)
            .or_else(|| resources::default_type_tree(info.class_id))
            .or_else(|| {
                log::warn!(
                    "no type tree for class_id {} (path_id {}); object is unreadable",
                    info.class_id,
                    info.path_id,
                );
                None
            })
    }

    /// Decodes the object with the given `path_id`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no such object exists; [`Error::Corrupt`] if
    /// the object has no type tree (neither embedded nor a known default) or
    /// its payload fails to parse.
    pub fn read_object(&self, path_id: i64) -> Result<Value> {
        let info = self
            .objects
            .get(&path_id)
            .ok_or_else(|| Error::not_found(format!("no object with path_id {path_id}")))?;
        let tree = self
            .type_tree_for(info)
            .ok_or_else(|| Error::corrupt(format!("no type tree for class_id {}", info.class_id)))?;

        let window_start = self.data_offset as u64 + u64::from(info.data_offset);
        let window_end = window_start + u64::from(info.size);
        let window_start = usize::try_from(window_start).map_err(|_| Error::Truncated)?;
        let window_end = usize::try_from(window_end).map_err(|_| Error::Truncated)?;
        let bytes = self.data.get(window_start..window_end).ok_or(Error::Truncated)?;

        let mut reader = BinaryReader::new(bytes, self.big_endian);
        object_reader::read_object(&mut reader, tree, self.format)
    }
}
