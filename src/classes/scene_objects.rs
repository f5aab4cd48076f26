use crate::value::ObjectPointer;

use super::{ClassView, define_class_view};

define_class_view! {
    /// A node in the scene graph: a named bag of [`Component`]s.
    pub struct GameObject = "GameObject" {
        pub fn name() -> &'v str = "m_Name" as as_str,
        pub fn layer() -> i64 = "m_Layer" as as_i64,
    }
}

define_class_view! {
    /// Base fields shared by every `Component` subclass (`Transform`,
    /// `MeshRenderer`, `MonoBehaviour`, …): a back-pointer to the owning
    /// [`GameObject`].
    pub struct Component = "Component" {
        pub fn game_object() -> ObjectPointer = "m_GameObject" as as_pointer,
    }
}

define_class_view! {
    pub struct Transform = "Transform" {
        pub fn game_object() -> ObjectPointer = "m_GameObject" as as_pointer,
        pub fn father() -> ObjectPointer = "m_Father" as as_pointer,
    }
}

define_class_view! {
    /// An attached script instance. Field data beyond the `MonoScript`
    /// pointer is user-defined per script, so it stays a plain map; see
    /// [`Self::value`].
    pub struct MonoBehaviour = "MonoBehaviour" {
        pub fn game_object() -> ObjectPointer = "m_GameObject" as as_pointer,
        pub fn script() -> ObjectPointer = "m_Script" as as_pointer,
        pub fn name() -> &'v str = "m_Name" as as_str,
    }
}

define_class_view! {
    /// Identifies which compiled script type a [`MonoBehaviour`] instance.
    pub struct MonoScript = "MonoScript" {
        pub fn name() -> &'v str = "m_Name" as as_str,
        pub fn class_name() -> &'v str = "m_ClassName" as as_str,
        pub fn namespace() -> &'v str = "m_Namespace" as as_str,
    }
}
