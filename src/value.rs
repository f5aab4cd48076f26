//! The language-neutral decoded value tree that [`crate::object_reader`]
//! produces by walking a [`crate::type_tree::TypeTreeNode`] schema.

use indexmap::IndexMap;

/// A reference to another object, possibly in another asset ("PPtr" in
/// Unity's own terminology — a "persistent pointer").
///
/// `file_id == 0` means the pointer targets an object inside the asset that
/// produced it; otherwise `file_id` indexes that asset's `asset_refs` table
/// (1-based; entry 0 is always the asset itself). `file_id == 0 &&
/// path_id == 0` is the null pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectPointer {
    pub file_id: i32,
    pub path_id: i64,
}

impl ObjectPointer {
    /// Whether this is the null sentinel, per the spec's zero-zero rule.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.file_id == 0 && self.path_id == 0
    }
}

/// One decoded value from an object's byte payload.
///
/// Composite fields preserve the declaration order of the [`TypeTreeNode`]
/// that produced them: [`Value::Map`] is an [`IndexMap`], not a sorted or
/// hashed map, because some consumers (e.g. a `Material`'s
/// `m_SavedProperties`) depend on positional iteration matching the engine's
/// own field order.
///
/// [`TypeTreeNode`]: crate::type_tree::TypeTreeNode
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    SInt8(i8),
    UInt8(u8),
    SInt16(i16),
    UInt16(u16),
    SInt32(i32),
    UInt32(u32),
    SInt64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    /// A byte array decoded from an `Array`/`TypelessData` node whose
    /// element type is `char` or `UInt8`.
    Bytes(Vec<u8>),
    /// A `string` node's contents.
    String(String),
    /// A composite node whose children are keyed by field name, in
    /// declaration order.
    Map(IndexMap<String, Value>),
    /// An `Array` node whose element type is anything other than a byte.
    List(Vec<Value>),
    /// A `pair` node: exactly two children, positionally significant.
    Pair(Box<Value>, Box<Value>),
    /// A `PPtr<...>` node.
    Pointer(ObjectPointer),
    /// The null `PPtr<...>` sentinel, kept distinct from `Pointer` so
    /// callers never need to inspect `file_id`/`path_id` to check nullness.
    Null,
}

impl Value {
    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::SInt8(v) => Some(i64::from(v)),
            Self::UInt8(v) => Some(i64::from(v)),
            Self::SInt16(v) => Some(i64::from(v)),
            Self::UInt16(v) => Some(i64::from(v)),
            Self::SInt32(v) => Some(i64::from(v)),
            Self::UInt32(v) => Some(i64::from(v)),
            Self::SInt64(v) => Some(v),
            Self::UInt64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(v) => Some(f64::from(v)),
            Self::Double(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_pointer(&self) -> Option<ObjectPointer> {
        match self {
            Self::Pointer(p) => Some(*p),
            Self::Null => Some(ObjectPointer::default()),
            _ => None,
        }
    }

    /// Looks up a field by name on a [`Value::Map`]; `None` for any other
    /// variant or a missing key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }
}
