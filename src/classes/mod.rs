//! Thin typed accessors over the decoded [`Value`] trees [`crate::object_reader`]
//! produces, for the handful of engine classes consumers most often want
//! named fields from (`m_Name`, `image data`, and so on).
//!
//! These views never re-parse anything: they borrow a decoded
//! [`Value::Map`] and forward named lookups to [`Value::get`] plus a cast.
//! A field missing from the map (an older engine version, a stripped build)
//! reads as `None` rather than failing the whole object — only
//! [`crate::object_reader`] enforces the byte-level invariants. Any
//! composite whose type name isn't covered here just stays a plain
//! [`Value::Map`]; interpreting it is a consumer concern.

use crate::value::Value;

mod audio_clip;
mod rendering;
mod scene_objects;
mod streaming_info;
mod text_asset;
mod texture2d;

pub use audio_clip::AudioClip;
pub use rendering::{Material, Mesh, MovieTexture, Shader, Sprite};
pub use scene_objects::{Component, GameObject, MonoBehaviour, MonoScript, Transform};
pub use streaming_info::{StreamedResource, StreamingInfo};
pub use text_asset::TextAsset;
pub use texture2d::{Texture2D, TextureFormat};

/// A named-field view over a decoded [`Value::Map`], borrowed for as long as
/// the underlying value lives.
pub trait ClassView<'v>: Sized {
    /// The engine class name [`wrap`] dispatches this view on.
    const TYPE_NAME: &'static str;

    /// Wraps `value`. Returns `None` if it isn't a [`Value::Map`].
    fn from_value(value: &'v Value) -> Option<Self>;
}

/// Defines a thin named-field view struct over a decoded `Value::Map`, in
/// the spirit of Unity's own typed wrapper classes (`TextAsset`, `AudioClip`,
/// …), minus the re-parsing: every accessor just forwards to `Value::get`
/// plus a `Value::as_*` cast.
macro_rules! define_class_view {
    (
        $(#[$attr:meta])*
        $v:vis struct $Name:ident = $type_name:literal {
            $(
                $(#[$fattr:meta])*
                $fv:vis fn $field:ident() -> $Ret:ty = $key:literal as $as:ident
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy)]
        $v struct $Name<'v> {
            value: &'v $crate::value::Value,
        }

        impl<'v> $Name<'v> {
            $(
                $(#[$fattr])*
                #[must_use]
                $fv fn $field(&self) -> ::std::option::Option<$Ret> {
                    self.value.get($key).and_then($crate::value::Value::$as)
                }
            )*

            /// The underlying decoded map, for fields this view doesn't name.
            #[must_use]
            pub fn value(&self) -> &'v $crate::value::Value {
                self.value
            }
        }

        impl ::std::fmt::Debug for $Name<'_> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($Name)).finish_non_exhaustive()
            }
        }

        impl<'v> $crate::classes::ClassView<'v> for $Name<'v> {
            const TYPE_NAME: &'static str = $type_name;

            fn from_value(value: &'v $crate::value::Value) -> ::std::option::Option<Self> {
                value.as_map().map(|_| Self { value })
            }
        }
    };
}
pub(crate) use define_class_view;

/// A decoded object wrapped by whichever typed view matches its class name,
/// or left as a plain map if none does.
#[derive(Debug, Clone, Copy)]
pub enum KnownClass<'v> {
    AudioClip(AudioClip<'v>),
    Texture2D(Texture2D<'v>),
    TextAsset(TextAsset<'v>),
    Shader(Shader<'v>),
    Mesh(Mesh<'v>),
    GameObject(GameObject<'v>),
    Component(Component<'v>),
    Transform(Transform<'v>),
    MonoBehaviour(MonoBehaviour<'v>),
    MonoScript(MonoScript<'v>),
    MovieTexture(MovieTexture<'v>),
    Sprite(Sprite<'v>),
    Material(Material<'v>),
    StreamingInfo(StreamingInfo<'v>),
    StreamedResource(StreamedResource<'v>),
    /// No typed view recognizes `type_name`; use the map directly.
    Other(&'v Value),
}

/// Wraps a decoded object in its typed view, dispatching on the `TypeTree`
/// root's own type name (the same string [`crate::serialized_file::SerializedFile::type_name`]
/// reports via the class table, for a plain object; a nested field such as
/// `m_StreamData` is looked up by its own node type, not the class_id).
#[must_use]
pub fn wrap<'v>(type_name: &str, value: &'v Value) -> KnownClass<'v> {
    macro_rules! try_wrap {
        ($($Variant:ident),+ $(,)?) => {
            match type_name {
                $(_ if type_name == $Variant::TYPE_NAME => {
                    if let Some(view) = $Variant::from_value(value) {
                        return KnownClass::$Variant(view);
                    }
                },)+
                _ => {},
            }
        };
    }

    try_wrap!(
        AudioClip,
        Texture2D,
        TextAsset,
        Shader,
        Mesh,
        GameObject,
        Component,
        Transform,
        MonoBehaviour,
        MonoScript,
        MovieTexture,
        Sprite,
        Material,
        StreamingInfo,
        StreamedResource,
    );
    KnownClass::Other(value)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn wraps_text_asset_by_class_name() {
        let mut map = IndexMap::new();
        map.insert("m_Name".to_string(), Value::String("example".to_string()));
        map.insert("m_Script".to_string(), Value::String("ligma\n".to_string()));
        let value = Value::Map(map);

        match wrap("TextAsset", &value) {
            KnownClass::TextAsset(t) => {
                assert_eq!(t.name(), Some("example"));
                assert_eq!(t.script(), Some("ligma\n"));
            },
            other => panic!("expected TextAsset, got {other:?}"),
        }
    }

    #[test]
    fn unknown_class_name_stays_a_plain_map() {
        let value = Value::Map(IndexMap::new());
        assert!(matches!(wrap("SomeFutureClass", &value), KnownClass::Other(_)));
    }
}
