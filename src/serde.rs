//! Serde extensions

/// Human-readable durations (`1s`, `2m 30s`, `500ms`)
///
/// Use with `#[serde(with = "crate::serde::duration")]`.
pub mod duration {
    use std::fmt;
    use std::time::Duration;

    struct DurationVisitor;

    impl<'a> serde::de::Visitor<'a> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a duration such as \"5s\" or \"1m 30s\"")
        }

        fn visit_str<A>(self, string: &str) -> Result<Self::Value, A>
        where
            A: serde::de::Error,
        {
            string
                .parse::<humantime::Duration>()
                .map(Into::<Duration>::into)
                .map_err(|err| serde::de::Error::custom(format!("{}: {}", string, err)))
        }
    }

    /// Parse a duration from its human-readable form
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(DurationVisitor)
    }

    /// Format a duration in its human-readable form
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&humantime::Duration::from(*duration).to_string())
    }

}
