//! Lenient date parsing for backend payloads.
//!
//! The backend mixes RFC 3339 timestamps with naive `YYYY-MM-DDTHH:MM:SS`
//! values (no offset) and plain dates. Naive values are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a timestamp in any of the accepted shapes.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a calendar date, accepting full timestamps as well.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(raw).map(|dt| dt.date_naive()))
}

/// Serde adapter for `Option<DateTime<Utc>>` fields.
///
/// Writes RFC 3339; reads any shape [`parse_datetime`] accepts. Blank strings
/// and nulls read as `None`.
pub mod option_datetime {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_datetime(s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date-time: {}", s))),
        }
    }
}

/// Serde adapter for `Option<NaiveDate>` fields.
pub mod option_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_some(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_date(s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_datetime("2024-05-01T10:30:00+01:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_as_utc() {
        let dt = parse_datetime("2024-05-01T10:30:00").unwrap();
        assert_eq!(dt.hour(), 10);

        let with_fraction = parse_datetime("2024-05-01T10:30:00.1234567").unwrap();
        assert_eq!(with_fraction.minute(), 30);

        let date_only = parse_datetime("2024-05-01").unwrap();
        assert_eq!(date_only.hour(), 0);
    }

    #[test]
    fn test_parse_date_from_timestamp() {
        let date = parse_date("1990-02-14T00:00:00").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (1990, 2, 14));
        assert!(parse_date("14/02/1990").is_none());
    }
}
