use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

use super::SourceError;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y:%m:%d %H:%M:%S",
];

/// A timestamp as the library reports it: with an offset, or without one.
/// Timestamps without an offset are wall-clock times in the local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTimestamp {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl SourceTimestamp {
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            SourceTimestamp::Aware(dt) => dt.with_timezone(&Utc),
            SourceTimestamp::Naive(naive) => local_to_utc(naive),
        }
    }
}

/// Resolve a local wall-clock time. Ambiguous times (DST fall-back) take the
/// earlier instant; times inside a DST gap are read as UTC.
fn local_to_utc(naive: &NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => naive.and_utc(),
    }
}

impl FromStr for SourceTimestamp {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(SourceTimestamp::Aware(dt));
        }
        if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
            return Ok(SourceTimestamp::Aware(dt));
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(SourceTimestamp::Naive(naive));
            }
        }
        Err(SourceError::Timestamp(s.to_string()))
    }
}

impl From<DateTime<Utc>> for SourceTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        SourceTimestamp::Aware(dt.fixed_offset())
    }
}

impl<'de> Deserialize<'de> for SourceTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_with_offset() {
        let ts: SourceTimestamp = "2021-06-01T12:00:00-07:00".parse().unwrap();
        assert!(matches!(ts, SourceTimestamp::Aware(_)));
        assert_eq!(
            ts.to_utc(),
            Utc.with_ymd_and_hms(2021, 6, 1, 19, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let ts: SourceTimestamp = "2019-07-04T16:24:01.007000+00:00".parse().unwrap();
        assert_eq!(ts.to_utc().timestamp_subsec_millis(), 7);
    }

    #[test]
    fn test_parse_naive_is_local() {
        let ts: SourceTimestamp = "2021-06-01 12:00:00".parse().unwrap();
        let naive = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(ts, SourceTimestamp::Naive(naive));

        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(ts.to_utc(), expected);
    }

    #[test]
    fn test_exif_style() {
        let ts: SourceTimestamp = "2020:01:02 03:04:05".parse().unwrap();
        assert!(matches!(ts, SourceTimestamp::Naive(_)));
    }

    #[test]
    fn test_reject_garbage() {
        assert!("yesterday".parse::<SourceTimestamp>().is_err());
    }

    #[test]
    fn test_deserialize() {
        let ts: Option<SourceTimestamp> =
            serde_json::from_str(r#""2022-02-02T02:02:02Z""#).unwrap();
        assert_eq!(
            ts.unwrap().to_utc(),
            Utc.with_ymd_and_hms(2022, 2, 2, 2, 2, 2).unwrap()
        );
        assert!(serde_json::from_str::<SourceTimestamp>(r#""nope""#).is_err());
    }
}
