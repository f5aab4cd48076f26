//! Minimal named-field views for classes the spec calls out as largely
//! opaque: materials, shader bytecode, meshes, and movie/sprite payloads are
//! surfaced as plain decoded maps beyond the handful of fields below.
//! Interpreting the rest is a consumer concern.

use crate::value::ObjectPointer;

use super::define_class_view;

define_class_view! {
    pub struct Material = "Material" {
        pub fn name() -> &'v str = "m_Name" as as_str,
        pub fn shader() -> ObjectPointer = "m_Shader" as as_pointer,
    }
}

define_class_view! {
    pub struct Shader = "Shader" {
        pub fn name() -> &'v str = "m_Name" as as_str,
    }
}

define_class_view! {
    pub struct Mesh = "Mesh" {
        pub fn name() -> &'v str = "m_Name" as as_str,
    }
}

define_class_view! {
    /// `m_RD` (the render data: atlas rect, texture pointer, physics
    /// outline) is a nested composite rather than a single castable field,
    /// so it stays on the underlying map; see [`Self::value`].
    pub struct Sprite = "Sprite" {
        pub fn name() -> &'v str = "m_Name" as as_str,
    }
}

define_class_view! {
    /// A legacy Ogg Theora video track. The embedded payload (`MovieData`)
    /// is an opaque `.ogv` blob; demuxing it is out of scope for this crate.
    pub struct MovieTexture = "MovieTexture" {
        pub fn name() -> &'v str = "m_Name" as as_str,
        pub fn movie_data() -> &'v [u8] = "m_MovieData" as as_bytes,
    }
}
