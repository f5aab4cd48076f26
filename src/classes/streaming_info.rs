use crate::archive::Archive;
use crate::error::{Error, Result};
use crate::value::Value;

use super::{ClassView, define_class_view};

define_class_view! {
    /// Streaming payload location for a resource stored outside its asset
    /// (e.g. `Texture2D.m_StreamData`, `AudioClip.m_Resource` on newer
    /// formats that externalize large payloads into a sibling
    /// `.resource` file).
    pub struct StreamingInfo = "StreamingInfo" {
        pub fn offset() -> i64 = "offset" as as_i64,
        pub fn size() -> i64 = "size" as as_i64,
        pub fn path() -> &'v str = "path" as as_str,
    }
}

/// The older equivalent of [`StreamingInfo`], used by engine versions that
/// name the field `source` rather than `path`.
define_class_view! {
    pub struct StreamedResource = "StreamedResource" {
        pub fn offset() -> i64 = "m_Offset" as as_i64,
        pub fn size() -> i64 = "m_Size" as as_i64,
        pub fn source() -> &'v str = "source" as as_str,
    }
}

impl<'v> StreamingInfo<'v> {
    /// Whether this streaming location is unset (the payload is embedded in
    /// the object itself instead).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path().unwrap_or_default().is_empty()
    }

    /// Loads the referenced bytes from `archive`'s sibling `.resource` node.
    ///
    /// Unity records the full archive-relative path; only a node's own name
    /// (its last path component) is matched against the archive's nodes.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no sibling node matches; [`Error::Corrupt`] for
    /// a negative offset/size; [`Error::Truncated`] if the recorded range
    /// falls outside the resource's data.
    pub fn load_data<'a>(&self, archive: &'a Archive) -> Result<&'a [u8]> {
        let path = self.path().filter(|p| !p.is_empty()).ok_or_else(|| Error::corrupt("StreamingInfo has no path"))?;
        load_range(archive, path, self.offset().unwrap_or(0), self.size().unwrap_or(0))
    }
}

impl<'v> StreamedResource<'v> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source().unwrap_or_default().is_empty()
    }

    /// Loads the referenced bytes from `archive`'s sibling `.resource` node.
    ///
    /// # Errors
    ///
    /// See [`StreamingInfo::load_data`].
    pub fn load_data<'a>(&self, archive: &'a Archive) -> Result<&'a [u8]> {
        let path = self.source().filter(|p| !p.is_empty()).ok_or_else(|| Error::corrupt("StreamedResource has no source"))?;
        load_range(archive, path, self.offset().unwrap_or(0), self.size().unwrap_or(0))
    }
}

fn load_range<'a>(archive: &'a Archive, path: &str, offset: i64, size: i64) -> Result<&'a [u8]> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let index = archive
        .find_node_by_name(name)
        .ok_or_else(|| Error::not_found(format!("streaming resource {name} not found")))?;

    let offset = usize::try_from(offset).map_err(|_| Error::corrupt("negative streaming offset"))?;
    let size = usize::try_from(size).map_err(|_| Error::corrupt("negative streaming size"))?;

    let data = archive.resource_data(index)?;
    data.get(offset..).and_then(|d| d.get(..size)).ok_or(Error::Truncated)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn empty_path_reports_empty() {
        let mut map = IndexMap::new();
        map.insert("path".to_string(), Value::String(String::new()));
        let value = Value::Map(map);
        let info = StreamingInfo::from_value(&value).unwrap();
        assert!(info.is_empty());
    }
}
