use super::{ClassView, StreamedResource, define_class_view};

define_class_view! {
    /// Compressed audio sample data and playback metadata.
    ///
    /// Decoding the payload (commonly an embedded FSB5 bank) into a
    /// playable format is a consumer concern; see the crate's module docs.
    pub struct AudioClip = "AudioClip" {
        pub fn name() -> &'v str = "m_Name" as as_str,
        pub fn channels() -> i64 = "m_Channels" as as_i64,
        pub fn frequency() -> i64 = "m_Frequency" as as_i64,
        pub fn bits_per_sample() -> i64 = "m_BitsPerSample" as as_i64,
        pub fn length() -> f64 = "m_Length" as as_f64,
        pub fn compression_format() -> i64 = "m_CompressionFormat" as as_i64,
        pub fn load_type() -> i64 = "m_LoadType" as as_i64,
    }
}

impl<'v> AudioClip<'v> {
    /// The clip's externalized payload location, for builds that stream
    /// audio data from a sibling `.resource` file rather than embedding it.
    #[must_use]
    pub fn resource(&self) -> Option<StreamedResource<'v>> {
        self.value().get("m_Resource").and_then(StreamedResource::from_value)
    }
}
