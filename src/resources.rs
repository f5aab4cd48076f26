//! Static data shipped with the library: the interned string pool used by
//! the blob [`TypeTree`](crate::type_tree::TypeTreeNode) encoding, the
//! class-id → class-name table, and fallback type trees for assets that
//! don't embed their own.
//!
//! Real Unity builds ship these as binary resources (`strings.dat`,
//! `classes.json`, `structs.dat`) extracted from the engine itself. This
//! crate doesn't have access to Unity's proprietary tables, so it embeds a
//! representative subset built from the well-known, publicly documented
//! class-id and common-string conventions used across the Unity modding
//! ecosystem. It is not byte-exact with any particular Unity version; see
//! `DESIGN.md` for the tradeoff.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::type_tree::TypeTreeNode;

/// Common strings Unity's blob `TypeTree` encoding can reference by offset
/// instead of spelling out in an asset's own local string pool (the
/// high-bit-set case in `node_str_offset`). Order matters: offsets are
/// computed as if these were concatenated NUL-terminated in sequence,
/// matching how the real table is laid out.
const COMMON_STRINGS: &[&str] = &[
    "AABB",
    "AnimationClip",
    "AnimationCurve",
    "AnimationState",
    "Array",
    "Base",
    "BitField",
    "bitset",
    "bool",
    "char",
    "ColorRGBA",
    "Component",
    "data",
    "deque",
    "double",
    "dynamic_array",
    "FastPropertyName",
    "first",
    "float",
    "Font",
    "GameObject",
    "Generic Mono",
    "GradientNEW",
    "GUID",
    "GUIStyle",
    "int",
    "list",
    "long long",
    "map",
    "Matrix4x4f",
    "MdFour",
    "MonoBehaviour",
    "MonoScript",
    "m_ByteSize",
    "m_Curve",
    "m_EditorClassIdentifier",
    "m_EditorHideFlags",
    "m_Enabled",
    "m_ExtensionPtr",
    "m_GameObject",
    "m_Name",
    "m_ObjectHideFlags",
    "m_PrefabInternal",
    "m_PrefabParentObject",
    "m_Script",
    "m_StaticEditorFlags",
    "m_Type",
    "m_Version",
    "Object",
    "pair",
    "PPtr<Component>",
    "PPtr<GameObject>",
    "PPtr<Material>",
    "PPtr<MonoBehaviour>",
    "PPtr<MonoScript>",
    "PPtr<Object>",
    "PPtr<Shader>",
    "PPtr<Sprite>",
    "PPtr<TextAsset>",
    "PPtr<Texture>",
    "PPtr<Texture2D>",
    "PPtr<Transform>",
    "Quaternionf",
    "Rectf",
    "second",
    "set",
    "short",
    "size",
    "SInt16",
    "SInt32",
    "SInt64",
    "SInt8",
    "staticvector",
    "string",
    "TextAsset",
    "TextMesh",
    "Texture",
    "Texture2D",
    "TypelessData",
    "UInt16",
    "UInt32",
    "UInt64",
    "UInt8",
    "unsigned int",
    "unsigned long long",
    "unsigned short",
    "vector",
    "Vector2f",
    "Vector3f",
    "Vector4f",
];

static COMMON_STRING_OFFSETS: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(COMMON_STRINGS.len());
    let mut offset: u32 = 0;
    for s in COMMON_STRINGS {
        map.insert(offset, *s);
        offset += u32::try_from(s.len() + 1).expect("common string table fits in u32");
    }
    map
});

/// Resolves a string from the shared common-string table by the byte offset
/// a blob `TypeTree` node would have stored it at.
#[must_use]
pub fn common_string_at(offset: usize) -> Option<&'static str> {
    let offset = u32::try_from(offset).ok()?;
    COMMON_STRING_OFFSETS.get(&offset).copied()
}

/// Well-known Unity class-id → class-name pairs. Not exhaustive across every
/// engine version, but covers the classes this crate's wrapper layer
/// understands plus the common scene-graph types.
const CLASS_NAMES: &[(i32, &str)] = &[
    (1, "GameObject"),
    (4, "Transform"),
    (8, "Shader"),
    (21, "Material"),
    (23, "MeshRenderer"),
    (25, "Renderer"),
    (28, "Texture2D"),
    (33, "MeshFilter"),
    (43, "Mesh"),
    (48, "Shader"),
    (49, "TextAsset"),
    (54, "Rigidbody"),
    (83, "AudioClip"),
    (90, "Avatar"),
    (91, "AnimatorController"),
    (95, "Animator"),
    (111, "Animation"),
    (114, "MonoBehaviour"),
    (115, "MonoScript"),
    (128, "Font"),
    (134, "PhysicMaterial"),
    (142, "AssetBundle"),
    (150, "PhysicMaterial"),
    (152, "MovieTexture"),
    (156, "TerrainData"),
    (213, "Sprite"),
    (224, "RectTransform"),
    (226, "CanvasRenderer"),
    (1001, "PrefabInstance"),
];

static CLASS_NAME_TABLE: Lazy<HashMap<i32, &'static str>> =
    Lazy::new(|| CLASS_NAMES.iter().copied().collect());

/// Looks up the engine class name for a `class_id`, per `classes.json`.
/// Unknown ids render as `"<Unknown #N>"`, matching the spec's fallback.
#[must_use]
pub fn class_name_for(class_id: i32) -> String {
    CLASS_NAME_TABLE
        .get(&class_id)
        .map_or_else(|| format!("<Unknown #{class_id}>"), |s| (*s).to_string())
}

fn leaf(type_name: &str, name: &str, size: i32) -> TypeTreeNode {
    TypeTreeNode {
        type_name: type_name.to_string(),
        name: name.to_string(),
        size,
        index: 0,
        is_array: false,
        version: 1,
        flags: 0,
        children: Vec::new(),
    }
}

fn string_field(name: &str) -> TypeTreeNode {
    let mut array_size = leaf("int", "size", 4);
    array_size.index = 0;
    let mut array_data = leaf("char", "data", 1);
    array_data.index = 1;
    array_data.is_array = true;

    let mut array = TypeTreeNode {
        type_name: "Array".to_string(),
        name: "data".to_string(),
        size: -1,
        index: 0,
        is_array: true,
        version: 1,
        flags: 0x4000,
        children: vec![array_size, array_data],
    };
    array.index = 1;

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

fn composite(type_name: &str, name: &str, children: Vec<TypeTreeNode>) -> TypeTreeNode {
    TypeTreeNode {
        type_name: type_name.to_string(),
        name: name.to_string(),
        size: -1,
        index: 0,
        is_array: false,
        version: 1,
        flags: 0,
        children,
    }
}

/// Builds the handful of fallback type trees this crate knows how to
/// synthesize, keyed by class_id. This stands in for the `structs.dat`
/// resource: a real Unity install ships accurate default trees for every
/// class, keyed by class_id and engine version; this crate only needs ones
/// for the classes its [`crate::classes`] wrapper layer understands, so it
/// hand-authors approximations of those instead of embedding the real
/// binary resource (not available to this codebase).
static DEFAULT_TYPE_TREES: Lazy<HashMap<i32, TypeTreeNode>> = Lazy::new(|| {
    let mut map = HashMap::new();

    // TextAsset (49): m_Name, m_Script
    map.insert(
        49,
        composite(
            "TextAsset",
            "Base",
            vec![string_field("m_Name"), string_field("m_Script")],
        ),
    );

    // StreamingInfo is referenced as a field type, not a class_id, so it
    // isn't registered here; see `crate::classes::StreamingInfo`.

    map
});

/// Looks up a synthesized default type tree for `class_id`, used when an
/// object's own asset has no embedded schema for its class.
#[must_use]
pub fn default_type_tree(class_id: i32) -> Option<&'static TypeTreeNode> {
    DEFAULT_TYPE_TREES.get(&class_id)
}
