pub mod goal;
pub mod task;

/// Serde adapter storing optional times of day as `HH:MM`.
///
/// Reading also accepts `HH:MM:SS`; empty strings decode as `None`.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => s.serialize_str(&time.format(FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse(text).map(Some).map_err(serde::de::Error::custom),
        }
    }

    /// Parse `HH:MM` or `HH:MM:SS`.
    pub fn parse(text: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(text, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
    }
}

pub use hhmm::parse as parse_time_of_day;
