use super::define_class_view;

define_class_view! {
    /// A plain-text or binary blob asset (`.txt`, `.json`, `.bytes`, …).
    pub struct TextAsset = "TextAsset" {
        pub fn name() -> &'v str = "m_Name" as as_str,
        pub fn script() -> &'v str = "m_Script" as as_str,
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::super::ClassView;
    use super::*;
    use crate::value::Value;

    #[test]
    fn reads_name_and_script() {
        let mut map = IndexMap::new();
        map.insert("m_Name".to_string(), Value::String("example".to_string()));
        map.insert("m_Script".to_string(), Value::String("ligma\n".to_string()));
        let value = Value::Map(map);

        let asset = TextAsset::from_value(&value).unwrap();
        assert_eq!(asset.name(), Some("example"));
        assert_eq!(asset.script(), Some("ligma\n"));
    }
}
