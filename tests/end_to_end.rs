//! End-to-end coverage across module boundaries: hand-assembled `UnityRaw`
//! archives, read all the way from raw bytes through [`Archive::open`] to a
//! decoded, class-wrapped object.
//!
//! No binary Unity fixtures ship with this workspace, so the bytes are built
//! in code rather than loaded via `include_bytes!`.

use std::io::Cursor;

use unity_read::Archive;
use unity_read::classes::KnownClass;

fn align4(buf: &mut Vec<u8>) {
    let pad = (4 - buf.len() % 4) % 4;
    buf.extend(std::iter::repeat(0u8).take(pad));
}

fn push_cstring(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

/// Appends a format-16 header (fixed fields + an empty `TypeMetadata` with no
/// embedded type trees) up through, but not including, `num_objects`.
fn push_format16_prologue(buf: &mut Vec<u8>) -> usize {
    buf.extend_from_slice(&0u32.to_be_bytes()); // metadata_size (unused by this crate)
    buf.extend_from_slice(&0u32.to_be_bytes()); // file_size (unused by this crate)
    buf.extend_from_slice(&16u32.to_be_bytes()); // format
    let data_offset_patch = buf.len();
    buf.extend_from_slice(&0u32.to_be_bytes()); // data_offset, patched by the caller
    buf.extend_from_slice(&0u32.to_be_bytes()); // endianness = 0 -> switch to little-endian

    push_cstring(buf, "5.6.0f3"); // generator_version
    buf.extend_from_slice(&5u32.to_le_bytes()); // target_platform
    buf.push(0); // has_type_trees = false
    buf.extend_from_slice(&0i32.to_le_bytes()); // num_types
    data_offset_patch
}

/// Appends one format-16 object directory entry (4-byte aligned first, per
/// `format >= 14`).
fn push_object_entry(buf: &mut Vec<u8>, path_id: i64, data_offset: u32, size: u32, class_id: i16) {
    align4(buf);
    buf.extend_from_slice(&path_id.to_le_bytes());
    buf.extend_from_slice(&data_offset.to_le_bytes());
    buf.extend_from_slice(&size.to_le_bytes());
    buf.extend_from_slice(&0i32.to_le_bytes()); // type_id (format < 17, unused for class lookup)
    buf.extend_from_slice(&class_id.to_le_bytes());
    buf.extend_from_slice(&0i16.to_le_bytes()); // unk0 (11..=16)
    buf.push(0); // unk1 (15..=16)
}

/// Builds a format-16 `SerializedFile` holding one `TextAsset` object
/// (`m_Name = "example"`, `m_Script = "ligma\n"`, `path_id = 1`). The asset's
/// class has no embedded type tree, so decoding it exercises
/// `resources::default_type_tree`'s synthesized fallback schema for
/// class_id 49 rather than a schema carried in the bytes themselves.
fn build_serialized_file() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&7u32.to_le_bytes());
    payload.extend_from_slice(b"example");
    align4(&mut payload);
    payload.extend_from_slice(&6u32.to_le_bytes());
    payload.extend_from_slice(b"ligma\n");
    align4(&mut payload);

    let mut inner = Vec::new();
    let data_offset_patch = push_format16_prologue(&mut inner);

    inner.extend_from_slice(&1u32.to_le_bytes()); // num_objects
    push_object_entry(&mut inner, 1, 0, payload.len() as u32, 49);

    inner.extend_from_slice(&0u32.to_le_bytes()); // num_adds
    inner.extend_from_slice(&0u32.to_le_bytes()); // num_refs (asset_refs)
    inner.push(0); // terminal string, empty

    let data_offset = inner.len() as u32;
    inner[data_offset_patch..data_offset_patch + 4].copy_from_slice(&data_offset.to_be_bytes());
    inner.extend_from_slice(&payload);
    inner
}

/// Builds a format-16 `SerializedFile` whose object directory lists the same
/// `path_id` twice, which `SerializedFile::read` must reject outright.
fn build_serialized_file_with_duplicate_path_id() -> Vec<u8> {
    let mut inner = Vec::new();
    let data_offset_patch = push_format16_prologue(&mut inner);

    inner.extend_from_slice(&2u32.to_le_bytes()); // num_objects
    push_object_entry(&mut inner, 1, 0, 0, 49);
    push_object_entry(&mut inner, 1, 0, 0, 49);

    inner.extend_from_slice(&0u32.to_le_bytes()); // num_adds
    inner.extend_from_slice(&0u32.to_le_bytes()); // num_refs (asset_refs)
    inner.push(0); // terminal string, empty

    let data_offset = inner.len() as u32;
    inner[data_offset_patch..data_offset_patch + 4].copy_from_slice(&data_offset.to_be_bytes());
    inner
}

/// Wraps `serialized_file` bytes in a minimal, uncompressed `UnityRaw`
/// archive carrying it as the single node named `node_name`.
fn build_legacy_archive(node_name: &str, serialized_file: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    push_cstring(&mut buf, "UnityRaw");
    buf.extend_from_slice(&1i32.to_be_bytes()); // format_version = 1 (no optional bundle_size fields)
    push_cstring(&mut buf, "5.6.0f3"); // unity_version
    push_cstring(&mut buf, "5.6.0f3"); // generator_version
    buf.extend_from_slice(&0u32.to_be_bytes()); // file_size (unused)

    let header_size_patch = buf.len();
    buf.extend_from_slice(&0i32.to_be_bytes()); // header_size, patched below
    buf.extend_from_slice(&1i32.to_be_bytes()); // file_count
    buf.extend_from_slice(&1i32.to_be_bytes()); // bundle_count
    // format_version < 2: no bundle_size/uncompressed_bundle_size fields.
    // header_size will be well under 60: no compressed_file_size/asset_header_size fields.
    buf.extend_from_slice(&0i32.to_be_bytes()); // unused trailing i32
    buf.push(0); // unused trailing byte
    push_cstring(&mut buf, ""); // bundle_name

    let header_size = buf.len() as i32;
    buf[header_size_patch..header_size_patch + 4].copy_from_slice(&header_size.to_be_bytes());

    // Body: num_assets, then one directory entry, then the asset's own bytes
    // placed contiguously so the data-window arithmetic has no gap to skip.
    buf.extend_from_slice(&1i32.to_be_bytes()); // num_assets
    let offset = buf.len() as u64 - header_size as u64;
    push_cstring(&mut buf, node_name);
    let asset_header_size = node_name.len() as u64 + 1 + 8 + 4; // name+NUL, asset_header_size field, size field
    buf.extend_from_slice(&(asset_header_size as u32).to_be_bytes());
    buf.extend_from_slice(&(serialized_file.len() as u32).to_be_bytes());
    debug_assert_eq!(offset + asset_header_size - 4, (buf.len() - header_size as usize) as u64);

    buf.extend_from_slice(serialized_file);
    buf
}

#[test]
fn reads_text_asset_out_of_a_legacy_archive() {
    let serialized_file = build_serialized_file();
    let archive_bytes = build_legacy_archive("CAB-test", &serialized_file);

    let archive = Archive::open(Cursor::new(archive_bytes)).expect("well-formed archive parses");
    assert_eq!(archive.node_count(), 1);
    assert!(!archive.is_resource(0));
    assert_eq!(archive.node_name(0), Some("CAB-test"));

    let sf = archive.serialized_file(0).expect("node is a serialized file");
    assert_eq!(sf.format, 16);
    assert!(!sf.type_metadata.has_type_trees);

    let info = sf.object_info(1).expect("object with path_id 1 exists");
    assert_eq!(sf.type_name(info), "TextAsset");

    let value = sf.read_object(1).expect("decodes against the synthesized default tree");
    match unity_read::classes::wrap(&sf.type_name(info), &value) {
        KnownClass::TextAsset(asset) => {
            assert_eq!(asset.name(), Some("example"));
            assert_eq!(asset.script(), Some("ligma\n"));
        },
        other => panic!("expected a TextAsset view, got {other:?}"),
    }
}

#[test]
fn duplicate_path_id_is_rejected_as_corrupt() {
    let serialized_file = build_serialized_file_with_duplicate_path_id();
    let archive_bytes = build_legacy_archive("CAB-test", &serialized_file);

    let archive = Archive::open(Cursor::new(archive_bytes)).expect("outer archive still parses");
    let err = archive.serialized_file(0).expect_err("duplicate path_id must be rejected");
    assert!(matches!(err, unity_read::Error::Corrupt(_)));
}
