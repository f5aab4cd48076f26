//! Parses and represents the self-describing schema embedded in a
//! serialized file: a tree of typed, named, sized nodes that
//! [`crate::object_reader`] walks to decode object payloads.

use crate::error::{Error, Result};
use crate::reader::BinaryReader;
use crate::resources;

/// One node of a [`TypeTree`]: a field declaration carrying its own type
/// name, storage size, and layout flags.
#[derive(Debug, Clone, Default)]
pub struct TypeTreeNode {
    pub type_name: String,
    pub name: String,
    pub size: i32,
    pub index: u32,
    pub is_array: bool,
    pub version: i16,
    pub flags: i32,
    pub children: Vec<TypeTreeNode>,
}

impl TypeTreeNode {
    const NULL: &'static str = "(null)";

    fn placeholder() -> Self {
        Self {
            type_name: Self::NULL.to_string(),
            name: Self::NULL.to_string(),
            ..Default::default()
        }
    }

    /// Whether the reader must 4-byte align after this node (the `0x4000`
    /// bit of `flags`).
    #[must_use]
    pub fn post_align(&self) -> bool {
        self.flags & 0x4000 != 0
    }

    /// Parses a schema tree, auto-selecting the old recursive encoding or
    /// the flat blob encoding based on the serialized-file format version.
    pub fn load(reader: &mut BinaryReader<'_>, format: u32) -> Result<Self> {
        if format == 10 || format >= 12 {
            Self::load_blob(reader)
        } else {
            Self::load_old(reader)
        }
    }

    fn load_old(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let type_name = reader.read_cstring()?;
        let name = reader.read_cstring()?;
        let size = reader.read_i32()?;
        let index = reader.read_i32()? as u32;
        let is_array = reader.read_i32()? != 0;
        let version = reader.read_i32()? as i16;
        let flags = reader.read_i32()?;

        let num_fields = reader.read_u32()?;
        let mut children = Vec::with_capacity(num_fields as usize);
        for _ in 0..num_fields {
            children.push(Self::load_old(reader)?);
        }

        Ok(Self {
            type_name,
            name,
            size,
            index,
            is_array,
            version,
            flags,
            children,
        })
    }

    /// Parses the flat, depth-tagged blob encoding: a run of fixed 24-byte
    /// node records followed by a local string pool, reconstructed into a
    /// tree via a parent stack keyed by the record's `depth` byte.
    fn load_blob(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let num_nodes = reader.read_u32()?;
        let buffer_bytes = reader.read_u32()?;

        #[derive(Clone, Copy)]
        struct RawNode {
            version: i16,
            depth: u8,
            is_array: bool,
            type_offset: i32,
            name_offset: i32,
            size: i32,
            index: u32,
            flags: i32,
        }

        let mut raw_nodes = Vec::with_capacity(num_nodes as usize);
        for _ in 0..num_nodes {
            let version = reader.read_i16()?;
            let depth = reader.read_u8()?;
            let is_array = reader.read_u8()? != 0;
            let type_offset = reader.read_i32()?;
            let name_offset = reader.read_i32()?;
            let size = reader.read_i32()?;
            let index = reader.read_u32()?;
            let flags = reader.read_i32()?;
            raw_nodes.push(RawNode {
                version,
                depth,
                is_array,
                type_offset,
                name_offset,
                size,
                index,
                flags,
            });
        }

        let string_pool = reader.read_bytes(buffer_bytes as usize)?;
        let get_string = |offset: i32| -> Result<String> {
            if offset < 0 {
                let offset = (offset & 0x7fff_ffff) as usize;
                Ok(resources::common_string_at(offset).unwrap_or(Self::NULL).to_string())
            } else if (offset as u32) < buffer_bytes {
                Ok(read_pool_cstring(string_pool, offset as usize))
            } else {
                Ok(Self::NULL.to_string())
            }
        };

        let mut root = Self::placeholder();
        // stack[i] is the node whose children are currently being appended to
        // at depth i; it always has at least the (virtual) root at index 0.
        let mut stack: Vec<*mut Self> = vec![&mut root as *mut Self];

        for raw in raw_nodes {
            let depth = raw.depth as usize;
            let node = TypeTreeNode {
                type_name: get_string(raw.type_offset)?,
                name: get_string(raw.name_offset)?,
                size: raw.size,
                index: raw.index,
                is_array: raw.is_array,
                version: raw.version,
                flags: raw.flags,
                children: Vec::new(),
            };

            if depth == 0 {
                // SAFETY: `root` is still alive and uniquely referenced
                // through this function's stack; no other alias exists.
                unsafe {
                    *stack[0] = node;
                }
                continue;
            }

            if depth > stack.len() {
                return Err(Error::corrupt("type tree node depth exceeds parent stack"));
            }
            stack.truncate(depth);

            // SAFETY: see above; `parent` outlives the pointer we take to
            // its freshly pushed child below.
            let parent = unsafe { &mut *stack[depth - 1] };
            parent.children.push(node);
            let child_ptr = parent.children.last_mut().expect("just pushed") as *mut Self;
            stack.push(child_ptr);
        }

        Ok(root)
    }
}

fn read_pool_cstring(pool: &[u8], offset: usize) -> String {
    let tail = &pool[offset.min(pool.len())..];
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    String::from_utf8_lossy(&tail[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RawNode {
        version: i16,
        depth: u8,
        is_array: bool,
        type_offset: i32,
        name_offset: i32,
        size: i32,
        index: u32,
        flags: i32,
    }

    /// Builds a blob-encoded `TextAsset` schema (`Base { string m_Name;
    /// string m_Script; }`) the way a format ≥ 12 serialized file embeds one,
    /// to exercise [`TypeTreeNode::load_blob`]'s parent-stack reconstruction
    /// directly: a root plus two sibling `string` fields, each carrying its
    /// own `Array<char>` backing node one level deeper.
    fn text_asset_blob() -> Vec<u8> {
        let strings = [
            "TextAsset", "Base", "string", "m_Name", "Array", "data", "int", "size", "char",
            "m_Script",
        ];
        let mut offsets = Vec::new();
        let mut pool = Vec::new();
        for s in strings {
            offsets.push(pool.len() as i32);
            pool.extend_from_slice(s.as_bytes());
            pool.push(0);
        }
        let text_asset = offsets[0];
        let base = offsets[1];
        let string = offsets[2];
        let m_name = offsets[3];
        let array = offsets[4];
        let data = offsets[5];
        let int = offsets[6];
        let size = offsets[7];
        let char_ = offsets[8];
        let m_script = offsets[9];

        let nodes = [
            RawNode { version: 1, depth: 0, is_array: false, type_offset: text_asset, name_offset: base, size: -1, index: 0, flags: 0 },
            RawNode { version: 1, depth: 1, is_array: false, type_offset: string, name_offset: m_name, size: -1, index: 0, flags: 0 },
            RawNode { version: 1, depth: 2, is_array: true, type_offset: array, name_offset: data, size: -1, index: 1, flags: 0x4000 },
            RawNode { version: 1, depth: 3, is_array: false, type_offset: int, name_offset: size, size: 4, index: 0, flags: 0 },
            RawNode { version: 1, depth: 3, is_array: true, type_offset: char_, name_offset: data, size: 1, index: 1, flags: 0 },
            RawNode { version: 1, depth: 1, is_array: false, type_offset: string, name_offset: m_script, size: -1, index: 1, flags: 0 },
            RawNode { version: 1, depth: 2, is_array: true, type_offset: array, name_offset: data, size: -1, index: 1, flags: 0x4000 },
            RawNode { version: 1, depth: 3, is_array: false, type_offset: int, name_offset: size, size: 4, index: 0, flags: 0 },
            RawNode { version: 1, depth: 3, is_array: true, type_offset: char_, name_offset: data, size: 1, index: 1, flags: 0 },
        ];

        let mut buf = Vec::new();
        buf.extend_from_slice(&(nodes.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(pool.len() as u32).to_le_bytes());
        for n in &nodes {
            buf.extend_from_slice(&n.version.to_le_bytes());
            buf.push(n.depth);
            buf.push(u8::from(n.is_array));
            buf.extend_from_slice(&n.type_offset.to_le_bytes());
            buf.extend_from_slice(&n.name_offset.to_le_bytes());
            buf.extend_from_slice(&n.size.to_le_bytes());
            buf.extend_from_slice(&n.index.to_le_bytes());
            buf.extend_from_slice(&n.flags.to_le_bytes());
        }
        buf.extend_from_slice(&pool);
        buf
    }

    #[test]
    fn load_blob_reconstructs_nested_siblings() {
        let bytes = text_asset_blob();
        let mut reader = BinaryReader::new(&bytes, false);
        let root = TypeTreeNode::load_blob(&mut reader).expect("well-formed blob tree");

        assert_eq!(root.type_name, "TextAsset");
        assert_eq!(root.name, "Base");
        assert_eq!(root.children.len(), 2, "root must have both string fields as direct children");

        let m_name = &root.children[0];
        assert_eq!(m_name.type_name, "string");
        assert_eq!(m_name.name, "m_Name");
        assert_eq!(m_name.children.len(), 1);
        let array = &m_name.children[0];
        assert_eq!(array.type_name, "Array");
        assert!(array.post_align());
        assert_eq!(array.children.len(), 2);
        assert_eq!(array.children[0].type_name, "int");
        assert_eq!(array.children[1].type_name, "char");

        let m_script = &root.children[1];
        assert_eq!(m_script.type_name, "string");
        assert_eq!(m_script.name, "m_Script");
        assert_eq!(m_script.children.len(), 1);
        assert_eq!(m_script.children[0].children.len(), 2);
    }

    #[test]
    fn load_blob_rejects_depth_skip() {
        // A node at depth 2 with no depth-1 ancestor yet pushed is malformed.
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_le_bytes()); // num_nodes
        buf.extend_from_slice(&1u32.to_le_bytes()); // buffer_bytes
        let root = RawNode { version: 1, depth: 0, is_array: false, type_offset: -1, name_offset: -1, size: -1, index: 0, flags: 0 };
        let bad = RawNode { version: 1, depth: 2, is_array: false, type_offset: -1, name_offset: -1, size: -1, index: 0, flags: 0 };
        for n in [&root, &bad] {
            buf.extend_from_slice(&n.version.to_le_bytes());
            buf.push(n.depth);
            buf.push(u8::from(n.is_array));
            buf.extend_from_slice(&n.type_offset.to_le_bytes());
            buf.extend_from_slice(&n.name_offset.to_le_bytes());
            buf.extend_from_slice(&n.size.to_le_bytes());
            buf.extend_from_slice(&n.index.to_le_bytes());
            buf.extend_from_slice(&n.flags.to_le_bytes());
        }
        buf.push(0); // 1-byte string pool

        let mut reader = BinaryReader::new(&buf, false);
        assert!(TypeTreeNode::load_blob(&mut reader).is_err());
    }
}

/// Schema + hash catalogue for all classes referenced by one serialized
/// file, plus the file's own generator metadata.
#[derive(Debug, Clone, Default)]
pub struct TypeMetadata {
    pub generator_version: String,
    pub target_platform: u32,
    pub has_type_trees: bool,
    /// class_id → 16 or 32 byte hash, in declaration order. Also doubles as
    /// the ordered `class_ids` list the spec's format-17 `type_id` lookup
    /// indexes into.
    pub class_ids: Vec<i32>,
    pub hashes: std::collections::HashMap<i32, Vec<u8>>,
    pub type_trees: std::collections::HashMap<i32, TypeTreeNode>,
}

impl TypeMetadata {
    pub fn load(reader: &mut BinaryReader<'_>, format: u32) -> Result<Self> {
        let generator_version = reader.read_cstring()?;
        let target_platform = reader.read_u32()?;

        let mut meta = Self {
            generator_version,
            target_platform,
            ..Default::default()
        };

        if format >= 13 {
            meta.has_type_trees = reader.read_bool()?;
            let num_types = reader.read_i32()?;
            for _ in 0..num_types {
                let class_id = reader.read_i32()?;
                let hash_len = if class_id < 0 { 0x20 } else { 0x10 };
                let hash = reader.read_bytes(hash_len)?.to_vec();
                meta.class_ids.push(class_id);
                meta.hashes.insert(class_id, hash);

                if meta.has_type_trees {
                    let tree = TypeTreeNode::load(reader, format)?;
                    meta.type_trees.insert(class_id, tree);
                }
            }
        } else {
            meta.has_type_trees = true;
            let num_fields = reader.read_i32()?;
            for _ in 0..num_fields {
                let class_id = reader.read_i32()?;
                let tree = TypeTreeNode::load(reader, format)?;
                meta.class_ids.push(class_id);
                meta.type_trees.insert(class_id, tree);
            }
        }

        Ok(meta)
    }

    /// Looks up the class_id for a format-≥17 object directory entry, which
    /// stores only a `type_id` index into this file's ordered class list.
    pub fn class_id_for_type_id(&self, type_id: i32) -> Result<i32> {
        self.class_ids
            .get(usize::try_from(type_id).map_err(|_| Error::corrupt("negative type_id"))?)
            .copied()
            .ok_or_else(|| Error::corrupt(format!("type_id {type_id} out of range")))
    }
}
