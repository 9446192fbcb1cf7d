//! Serialization utilities for common data types

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// Serde helpers for `Option<Duration>` stored as milliseconds
///
/// A missing or `null` value maps to `None`; pair with
/// `#[serde(default)]` so the field may be omitted entirely.
///
/// # Usage
/// ```rust
/// use std::time::Duration;
///
/// use atomdict_common::utils::option_duration_millis;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Example {
///     #[serde(default, with = "option_duration_millis")]
///     timeout: Option<Duration>,
/// }
///
/// let parsed: Example = serde_json::from_str(r#"{"timeout": 250}"#).unwrap();
/// assert_eq!(parsed.timeout, Some(Duration::from_millis(250)));
/// ```
pub mod option_duration_millis {
    use super::*;

    /// Serde serialization result type
    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    /// Serialize as milliseconds (u64), or `none` when absent
    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        match duration {
            Some(duration) => {
                let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                serializer.serialize_some(&millis)
            }
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize optional milliseconds (u64) into a Duration
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct TestStruct {
        #[serde(default, with = "option_duration_millis")]
        timeout: Option<Duration>,
        name: String,
    }

    /// Tests that a present Duration serializes to milliseconds
    #[test]
    fn test_option_duration_millis_serialize() {
        let data =
            TestStruct { timeout: Some(Duration::from_millis(1500)), name: "test".to_string() };

        let json = serde_json::to_string(&data).expect("Should serialize valid struct");
        assert!(json.contains("1500"), "Should contain milliseconds value");
    }

    /// Tests that null and missing values map to None
    #[test]
    fn test_option_duration_millis_absent() {
        let explicit: TestStruct =
            serde_json::from_str(r#"{"timeout": null, "name": "a"}"#).expect("null timeout");
        assert_eq!(explicit.timeout, None);

        let missing: TestStruct = serde_json::from_str(r#"{"name": "b"}"#).expect("no timeout");
        assert_eq!(missing.timeout, None);
    }

    /// Tests that TOML integers deserialize to Duration
    #[test]
    fn test_option_duration_millis_toml() {
        let parsed: TestStruct =
            toml::from_str("timeout = 40\nname = \"c\"").expect("Should parse TOML");
        assert_eq!(parsed.timeout, Some(Duration::from_millis(40)));
    }
}
