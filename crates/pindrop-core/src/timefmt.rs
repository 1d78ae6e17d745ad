//! ISO-8601 timestamp codec for the extraction API.
//!
//! Servers emit both whole-second (`2024-06-01T00:35:57Z`) and
//! fractional-second (`2024-06-01T00:35:57.458710Z`) forms; decoding accepts
//! either. Encoding always uses the whole-second `Z` form.
//!
//! Usage: `#[serde(with = "timefmt")]`, or `#[serde(with = "timefmt::option")]`
//! for optional fields.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

pub mod option {
    use super::*;

    pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match dt {
            Some(dt) => super::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Stamp {
        #[serde(with = "crate::timefmt")]
        at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct MaybeStamp {
        #[serde(default, with = "crate::timefmt::option")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_fractional_and_whole_second_forms_decode() {
        let fractional = parse("2024-06-01T00:35:57.458710Z").unwrap();
        let whole = parse("2024-06-01T00:35:57Z").unwrap();
        assert_eq!(fractional.trunc_subsecs(0), whole);
    }

    #[test]
    fn test_encoding_is_whole_second() {
        let stamp: Stamp = serde_json::from_str(r#"{"at": "2024-06-01T00:35:57.458710Z"}"#).unwrap();
        let encoded = serde_json::to_string(&stamp).unwrap();
        assert_eq!(encoded, r#"{"at":"2024-06-01T00:35:57Z"}"#);
    }

    #[test]
    fn test_offset_form_normalises_to_utc() {
        let dt = parse("2024-06-01T02:35:57+02:00").unwrap();
        assert_eq!(dt, parse("2024-06-01T00:35:57Z").unwrap());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let result: Result<Stamp, _> = serde_json::from_str(r#"{"at": "yesterday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_option_field_decodes_null_and_missing() {
        let missing: MaybeStamp = serde_json::from_str("{}").unwrap();
        assert!(missing.at.is_none());
        let null: MaybeStamp = serde_json::from_str(r#"{"at": null}"#).unwrap();
        assert!(null.at.is_none());
        let present: MaybeStamp =
            serde_json::from_str(r#"{"at": "2024-06-01T00:35:57Z"}"#).unwrap();
        assert!(present.at.is_some());
    }
}
