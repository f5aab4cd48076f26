//! Decodes an object's byte payload into a language-neutral [`Value`] tree by
//! walking the [`TypeTreeNode`] schema that describes it.
//!
//! This module never touches an [`crate::environment::Environment`] or any
//! other asset: a `PPtr<...>` field decodes to an opaque [`ObjectPointer`]
//! (or [`Value::Null`]), and resolving it across assets is the caller's
//! concern, handled by [`crate::serialized_file::SerializedFile`] and
//! [`crate::environment::Environment`].

use indexmap::IndexMap;

use crate::FromInt;
use crate::error::{Error, Result};
use crate::reader::BinaryReader;
use crate::type_tree::TypeTreeNode;
use crate::value::{ObjectPointer, Value};

/// Decodes one [`TypeTreeNode`] (and, recursively, its children) from
/// `reader`'s current position.
///
/// Enforces the spec's post-decode invariants: a node declaring a fixed
/// `size` must have consumed at least that many bytes, and a node flagged
/// `post_align` leaves the reader 4-byte aligned.
pub fn read_object(reader: &mut BinaryReader<'_>, node: &TypeTreeNode, format: u32) -> Result<Value> {
    let start = reader.position();
    let value = read_node(reader, node, format)?;

    if node.size > 0 {
        let consumed = reader.position().saturating_sub(start);
        if consumed < u64::from(node.size.unsigned_abs()) {
            return Err(Error::corrupt(format!(
                "under-read decoding '{}' ({}): expected at least {} bytes, read {consumed}",
                node.name, node.type_name, node.size
            )));
        }
    }
    if node.post_align() {
        reader.align4()?;
    }
    Ok(value)
}

fn read_node(reader: &mut BinaryReader<'_>, node: &TypeTreeNode, format: u32) -> Result<Value> {
    let type_name = node.type_name.as_str();

    if let Some(ptr) = read_pointer(reader, type_name, format)? {
        return Ok(ptr);
    }

    match type_name {
        "bool" => return Ok(Value::Bool(reader.read_bool()?)),
        "SInt8" => return Ok(Value::SInt8(reader.read_i8()?)),
        "UInt8" | "char" => return Ok(Value::UInt8(reader.read_u8()?)),
        "SInt16" | "short" => return Ok(Value::SInt16(reader.read_i16()?)),
        "UInt16" | "unsigned short" => return Ok(Value::UInt16(reader.read_u16()?)),
        "SInt32" | "int" => return Ok(Value::SInt32(reader.read_i32()?)),
        "UInt32" | "unsigned int" | "Type*" => return Ok(Value::UInt32(reader.read_u32()?)),
        "SInt64" | "long long" => return Ok(Value::SInt64(reader.read_i64()?)),
        "UInt64" | "unsigned long long" => return Ok(Value::UInt64(reader.read_u64()?)),
        "float" => {
            reader.align4()?;
            return Ok(Value::Float(reader.read_f32()?));
        },
        "double" => {
            reader.align4()?;
            return Ok(Value::Double(reader.read_f64()?));
        },
        "string" => {
            let s = reader.read_string()?;
            if node.children.first().is_some_and(TypeTreeNode::post_align) {
                reader.align4()?;
            }
            return Ok(Value::String(s));
        },
        _ => {},
    }

    if node.is_array {
        return read_array(reader, node, format);
    }
    if node.children.first().is_some_and(|c| c.is_array) {
        return read_array(reader, &node.children[0], format);
    }
    if type_name == "pair" && node.children.len() == 2 {
        let first = read_object(reader, &node.children[0], format)?;
        let second = read_object(reader, &node.children[1], format)?;
        return Ok(Value::Pair(Box::new(first), Box::new(second)));
    }

    let mut map = IndexMap::with_capacity(node.children.len());
    for child in &node.children {
        map.insert(child.name.clone(), read_object(reader, child, format)?);
    }
    Ok(Value::Map(map))
}

/// Reads a `PPtr<...>` field, or returns `None` if `type_name` isn't one.
fn read_pointer(reader: &mut BinaryReader<'_>, type_name: &str, format: u32) -> Result<Option<Value>> {
    if !type_name.starts_with("PPtr<") {
        return Ok(None);
    }
    let file_id = reader.read_i32()?;
    let path_id = if format >= 14 {
        reader.read_i64()?
    } else {
        i64::from(reader.read_i32()?)
    };
    let ptr = ObjectPointer { file_id, path_id };
    Ok(Some(if ptr.is_null() { Value::Null } else { Value::Pointer(ptr) }))
}

/// Reads an `Array` carrier node: a `size` (u32) child followed by one
/// element-type child, repeated `size` times (or, for byte elements, read as
/// a single contiguous blob).
fn read_array(reader: &mut BinaryReader<'_>, carrier: &TypeTreeNode, format: u32) -> Result<Value> {
    if carrier.children.len() < 2 {
        return Err(Error::corrupt("array node is missing its size/element children"));
    }
    let size = usize::from_int(reader.read_u32()?)?;
    let element = &carrier.children[1];

    let value = if matches!(element.type_name.as_str(), "char" | "UInt8") {
        Value::Bytes(reader.read_bytes(size)?.to_vec())
    } else {
        let mut items = Vec::with_capacity(size);
        for _ in 0..size {
            items.push(read_object(reader, element, format)?);
        }
        Value::List(items)
    };

    if carrier.post_align() {
        reader.align4()?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(type_name: &str, name: &str, size: i32, flags: i32) -> TypeTreeNode {
        TypeTreeNode {
            type_name: type_name.to_string(),
            name: name.to_string(),
            size,
            index: 0,
            is_array: false,
            version: 1,
            flags,
            children: Vec::new(),
        }
    }

    fn string_node(name: &str) -> TypeTreeNode {
        let size_child = leaf("int", "size", 4, 0);
        let data_child = {
            let mut n = leaf("char", "data", 1, 0);
            n.is_array = true;
            n
        };
        let array = TypeTreeNode {
            type_name: "Array".to_string(),
            name: "data".to_string(),
            size: -1,
            index: 1,
            is_array: true,
            version: 1,
            flags: 0x4000,
            children: vec![size_child, data_child],
        };
        TypeTreeNode {
            type_name: "string".to_string(),
            name: name.to_string(),
            size: -1,
            index: 0,
            is_array: false,
            version: 1,
            flags: 0,
            children: vec![array],
        }
    }

    #[test]
    fn reads_primitive_ints() {
        let node = leaf("int", "m_Value", 4, 0);
        let data = 42i32.to_be_bytes();
        let mut reader = BinaryReader::new(&data, true);
        let value = read_object(&mut reader, &node, 17).unwrap();
        assert_eq!(value, Value::SInt32(42));
    }

    #[test]
    fn string_field_aligns_after_read() {
        let node = string_node("m_Name");
        // length=5 "hello" then 3 bytes padding to reach a multiple of 4
        // (4-byte length + 5 payload = 9, next multiple of 4 is 12).
        let mut data = Vec::new();
        data.extend_from_slice(&5u32.to_be_bytes());
        data.extend_from_slice(b"hello");
        data.extend_from_slice(&[0, 0, 0]);
        let mut reader = BinaryReader::new(&data, true);
        let value = read_object(&mut reader, &node, 17).unwrap();
        assert_eq!(value, Value::String("hello".to_string()));
        assert_eq!(reader.position() % 4, 0);
    }

    #[test]
    fn null_pptr_decodes_to_null_value() {
        let node = leaf("PPtr<GameObject>", "m_GameObject", 12, 0);
        let mut data = Vec::new();
        data.extend_from_slice(&0i32.to_be_bytes());
        data.extend_from_slice(&0i64.to_be_bytes());
        let mut reader = BinaryReader::new(&data, true);
        let value = read_object(&mut reader, &node, 17).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn non_null_pptr_decodes_to_pointer() {
        let node = leaf("PPtr<GameObject>", "m_GameObject", 12, 0);
        let mut data = Vec::new();
        data.extend_from_slice(&0i32.to_be_bytes());
        data.extend_from_slice(&7i64.to_be_bytes());
        let mut reader = BinaryReader::new(&data, true);
        let value = read_object(&mut reader, &node, 17).unwrap();
        assert_eq!(value, Value::Pointer(ObjectPointer { file_id: 0, path_id: 7 }));
    }

    #[test]
    fn byte_array_collapses_to_bytes_value() {
        let size_child = leaf("int", "size", 4, 0);
        let data_child = {
            let mut n = leaf("UInt8", "data", 1, 0);
            n.is_array = true;
            n
        };
        let carrier = TypeTreeNode {
            type_name: "Array".to_string(),
            name: "data".to_string(),
            size: -1,
            index: 0,
            is_array: true,
            version: 1,
            flags: 0,
            children: vec![size_child, data_child],
        };
        let mut data = Vec::new();
        data.extend_from_slice(&3u32.to_be_bytes());
        data.extend_from_slice(&[1, 2, 3]);
        let mut reader = BinaryReader::new(&data, true);
        let value = read_object(&mut reader, &carrier, 17).unwrap();
        assert_eq!(value, Value::Bytes(vec![1, 2, 3]));
    }

    #[test]
    fn composite_preserves_field_declaration_order() {
        let node = TypeTreeNode {
            type_name: "Base".to_string(),
            name: "Base".to_string(),
            size: -1,
            index: 0,
            is_array: false,
            version: 1,
            flags: 0,
            children: vec![leaf("int", "first", 4, 0), leaf("int", "second", 4, 0)],
        };
        let mut data = Vec::new();
        data.extend_from_slice(&1i32.to_be_bytes());
        data.extend_from_slice(&2i32.to_be_bytes());
        let mut reader = BinaryReader::new(&data, true);
        let value = read_object(&mut reader, &node, 17).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["first", "second"]);
    }

    #[test]
    fn under_read_is_corrupt() {
        let node = leaf("int", "m_Value", 8, 0);
        let data = 1i32.to_be_bytes();
        let mut reader = BinaryReader::new(&data, true);
        assert!(matches!(read_object(&mut reader, &node, 17), Err(Error::Corrupt(_))));
    }
}
