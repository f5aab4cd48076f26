use num_enum::FromPrimitive;

use super::{ClassView, StreamingInfo, define_class_view};

define_class_view! {
    /// A 2D texture's metadata and (unless streamed) raw encoded pixel data.
    ///
    /// Block decoding (DXT/Crunch/ASTC/…) into pixels is out of scope for
    /// this crate; [`Texture2D::format`] only tags which codec the bytes
    /// need, matching the spec's "format tagging, not decoding" boundary.
    pub struct Texture2D = "Texture2D" {
        pub fn name() -> &'v str = "m_Name" as as_str,
        pub fn width() -> i64 = "m_Width" as as_i64,
        pub fn height() -> i64 = "m_Height" as as_i64,
        pub fn format_raw() -> i64 = "m_TextureFormat" as as_i64,
        pub fn image_data() -> &'v [u8] = "image data" as as_bytes,
    }
}

impl<'v> Texture2D<'v> {
    /// The texture's pixel format, decoded from [`Self::format_raw`].
    #[must_use]
    pub fn format(&self) -> TextureFormat {
        #[allow(clippy::cast_possible_truncation)]
        TextureFormat::from_primitive(self.format_raw().unwrap_or(-1) as i32)
    }

    /// The texture's streamed payload location, for builds that externalize
    /// image data into a sibling `.resource` file (`m_StreamData`).
    #[must_use]
    pub fn stream_data(&self) -> Option<StreamingInfo<'v>> {
        self.value().get("m_StreamData").and_then(StreamingInfo::from_value)
    }
}

/// Well-known Unity `Texture2D` pixel formats (`m_TextureFormat`). Not
/// exhaustive across every engine version; unrecognized values decode to
/// [`TextureFormat::UnknownType`] rather than failing the object read.
#[allow(non_camel_case_types, non_upper_case_globals)]
#[derive(Debug, Eq, PartialEq, FromPrimitive, Clone, Copy, Default, Hash)]
#[repr(i32)]
#[non_exhaustive]
pub enum TextureFormat {
    #[default]
    UnknownType = -1,
    Alpha8 = 1,
    ARGB4444,
    RGB24,
    RGBA32,
    ARGB32,
    RGB565 = 7,
    R16 = 9,
    DXT1,
    DXT5 = 12,
    RGBA4444,
    BGRA32,
    DXT1Crunched = 28,
    DXT5Crunched,
    ETC_RGB4 = 34,
    ETC2_RGB = 45,
    ETC2_RGBA1,
    ETC2_RGBA8,
    ASTC_RGB_4x4,
    ASTC_RGB_5x5,
    ASTC_RGB_6x6,
    ASTC_RGB_8x8,
    ASTC_RGB_10x10,
    ASTC_RGB_12x12,
    ASTC_RGBA_4x4,
    ASTC_RGBA_5x5,
    ASTC_RGBA_6x6,
    ASTC_RGBA_8x8,
    ASTC_RGBA_10x10,
    ASTC_RGBA_12x12,
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::value::Value;

    #[test]
    fn unknown_format_falls_back_to_default() {
        let mut map = IndexMap::new();
        map.insert("m_TextureFormat".to_string(), Value::SInt32(9001));
        let value = Value::Map(map);
        let tex = Texture2D::from_value(&value).unwrap();
        assert_eq!(tex.format(), TextureFormat::UnknownType);
    }
}
