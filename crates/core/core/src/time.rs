//! Timestamp normalization, date ranges and bucketing granularity.
//!
//! Documents carry dates in several shapes (native backend timestamps,
//! ISO strings, epoch-millisecond numbers, or nothing at all). They are
//! resolved exactly once, at ingestion, into a millisecond epoch value.

use crate::document::FieldValue;
use crate::error::{AdminError, AdminResult};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MS_PER_DAY: i64 = 86_400_000;

/// A date as it was found on a document, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTimestamp {
    /// Native backend timestamp.
    Backend(DateTime<Utc>),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// A date string of unknown quality.
    Text(String),
    /// No usable value.
    Missing,
}

impl RawTimestamp {
    /// Classifies a document field.
    pub fn from_field(value: Option<&FieldValue>) -> Self {
        match value {
            Some(FieldValue::Timestamp(ts)) => Self::Backend(*ts),
            Some(FieldValue::Integer(ms)) => Self::EpochMillis(*ms),
            Some(FieldValue::Double(ms)) if ms.is_finite() => Self::EpochMillis(*ms as i64),
            Some(FieldValue::String(s)) => Self::Text(s.clone()),
            Some(FieldValue::Map(map)) => {
                // Timestamps exported through JSON tooling end up as
                // {seconds, nanoseconds} maps.
                let seconds = map
                    .get("seconds")
                    .or_else(|| map.get("_seconds"))
                    .and_then(FieldValue::as_f64);
                let nanos = map
                    .get("nanoseconds")
                    .or_else(|| map.get("_nanoseconds"))
                    .and_then(FieldValue::as_f64)
                    .unwrap_or(0.0);
                match seconds.and_then(|s| DateTime::from_timestamp(s as i64, nanos as u32)) {
                    Some(ts) => Self::Backend(ts),
                    None => Self::Missing,
                }
            }
            _ => Self::Missing,
        }
    }

    /// Resolves to epoch milliseconds; `None` when missing or unparseable.
    pub fn resolve(&self) -> Option<i64> {
        match self {
            Self::Backend(ts) => Some(ts.timestamp_millis()),
            Self::EpochMillis(ms) => Some(*ms),
            Self::Text(text) => parse_date_text(text).map(|ts| ts.timestamp_millis()),
            Self::Missing => None,
        }
    }

    /// Resolves to epoch milliseconds, substituting `now_ms` when the value
    /// is missing or unparseable.
    pub fn resolve_or(&self, now_ms: i64) -> i64 {
        self.resolve().unwrap_or(now_ms)
    }

    /// Returns true if nothing usable was found.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Parses the date strings seen in hand-written and exported documents.
///
/// Zoneless values are read as UTC.
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Returns the current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Converts epoch milliseconds to a wall-clock time in `offset`.
pub fn local_time(ms: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp_millis(ms).map(|ts| ts.with_timezone(&offset))
}

/// Epoch milliseconds of local midnight starting `day` in `offset`.
fn start_of_day_ms(day: NaiveDate, offset: FixedOffset) -> i64 {
    let midnight = day.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis();
    midnight - i64::from(offset.local_minus_utc()) * 1000
}

/// Time-bucketing resolution for charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Month,
    Year,
}

impl Granularity {
    /// Returns the lowercase name used in labels and query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Bucket key of a timestamp: `yyyy-MM-dd`, `yyyy-MM` or `yyyy`.
    pub fn bucket_key(&self, ms: i64, offset: FixedOffset) -> Option<String> {
        let local = local_time(ms, offset)?;
        Some(self.key_for_date(local.date_naive()))
    }

    fn key_for_date(&self, date: NaiveDate) -> String {
        match self {
            Self::Day => date.format("%Y-%m-%d").to_string(),
            Self::Month => date.format("%Y-%m").to_string(),
            Self::Year => format!("{:04}", date.year()),
        }
    }

    /// Human label for a bucket key (`Jan 5`, `Jan 2024`, `2024`).
    ///
    /// Keys that do not parse are returned unchanged.
    pub fn display_label(&self, key: &str) -> String {
        let parsed = match self {
            Self::Day => NaiveDate::parse_from_str(key, "%Y-%m-%d")
                .map(|d| d.format("%b %-d").to_string()),
            Self::Month => NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d")
                .map(|d| d.format("%b %Y").to_string()),
            Self::Year => return key.to_string(),
        };
        parsed.unwrap_or_else(|_| key.to_string())
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(AdminError::invalid(
                "granularity",
                format!("expected day, month or year, got '{other}'"),
            )),
        }
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Longest accepted range, in days. Bounds the number of day buckets.
    pub const MAX_SPAN_DAYS: i64 = 366 * 20;

    /// Creates a range; `from` must not be after `to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> AdminResult<Self> {
        if from > to {
            return Err(AdminError::invalid(
                "from",
                format!("{from} is after {to}"),
            ));
        }
        if (to - from).num_days() >= Self::MAX_SPAN_DAYS {
            return Err(AdminError::invalid(
                "to",
                format!("range may span at most {} days", Self::MAX_SPAN_DAYS),
            ));
        }
        Ok(Self { from, to })
    }

    /// Builds a range from optional ends; either end missing means no range.
    pub fn from_parts(from: Option<NaiveDate>, to: Option<NaiveDate>) -> AdminResult<Option<Self>> {
        match (from, to) {
            (Some(from), Some(to)) => Self::new(from, to).map(Some),
            _ => Ok(None),
        }
    }

    /// `[startOfDay(from), endOfDay(to)]` in epoch milliseconds.
    pub fn bounds_ms(&self, offset: FixedOffset) -> (i64, i64) {
        let start = start_of_day_ms(self.from, offset);
        let end = start_of_day_ms(self.to, offset) + MS_PER_DAY - 1;
        (start, end)
    }

    /// Every bucket key spanned by the range, empty buckets included.
    pub fn bucket_keys(&self, granularity: Granularity) -> Vec<String> {
        match granularity {
            Granularity::Day => self
                .from
                .iter_days()
                .take_while(|d| *d <= self.to)
                .map(|d| granularity.key_for_date(d))
                .collect(),
            Granularity::Month => {
                let mut keys = Vec::new();
                let (mut year, mut month) = (self.from.year(), self.from.month());
                let end = (self.to.year(), self.to.month());
                while (year, month) <= end {
                    keys.push(format!("{year:04}-{month:02}"));
                    if month == 12 {
                        year += 1;
                        month = 1;
                    } else {
                        month += 1;
                    }
                }
                keys
            }
            Granularity::Year => (self.from.year()..=self.to.year())
                .map(|y| format!("{y:04}"))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_raw_timestamp_shapes() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let ms = ts.timestamp_millis();

        assert_eq!(RawTimestamp::from_field(Some(&FieldValue::Timestamp(ts))).resolve(), Some(ms));
        assert_eq!(RawTimestamp::from_field(Some(&FieldValue::Integer(ms))).resolve(), Some(ms));
        assert_eq!(
            RawTimestamp::from_field(Some(&FieldValue::from("2024-01-02T03:04:05Z"))).resolve(),
            Some(ms)
        );
        assert!(RawTimestamp::from_field(None).is_missing());
        assert!(RawTimestamp::from_field(Some(&FieldValue::Boolean(true))).is_missing());
    }

    #[test]
    fn test_unparseable_text_falls_back() {
        let raw = RawTimestamp::Text("next tuesday".to_string());
        assert_eq!(raw.resolve(), None);
        assert_eq!(raw.resolve_or(42), 42);
    }

    #[test]
    fn test_seconds_map_is_backend_timestamp() {
        let mut map = crate::document::Fields::new();
        map.insert("seconds".to_string(), FieldValue::Integer(1_704_067_200));
        map.insert("nanoseconds".to_string(), FieldValue::Integer(0));
        let raw = RawTimestamp::from_field(Some(&FieldValue::Map(map)));
        assert_eq!(raw.resolve(), Some(1_704_067_200_000));
    }

    #[test]
    fn test_parse_date_only() {
        let parsed = parse_date_text("2024-03-01").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_bounds_cover_whole_days() {
        let range = DateRange::new(day(2024, 1, 1), day(2024, 1, 3)).unwrap();
        let (start, end) = range.bounds_ms(FixedOffset::east_opt(0).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp_millis());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap().timestamp_millis() - 1);
    }

    #[test]
    fn test_bounds_respect_offset() {
        let range = DateRange::new(day(2024, 1, 1), day(2024, 1, 1)).unwrap();
        let lagos = FixedOffset::east_opt(3600).unwrap();
        let (start, _) = range.bounds_ms(lagos);
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap().timestamp_millis());
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(DateRange::new(day(2024, 2, 1), day(2024, 1, 1)).is_err());
        assert_eq!(DateRange::from_parts(Some(day(2024, 1, 1)), None).unwrap(), None);
    }

    #[test]
    fn test_bucket_keys_per_granularity() {
        let range = DateRange::new(day(2023, 11, 30), day(2024, 2, 2)).unwrap();
        assert_eq!(range.bucket_keys(Granularity::Day).len(), 65);
        assert_eq!(
            range.bucket_keys(Granularity::Month),
            vec!["2023-11", "2023-12", "2024-01", "2024-02"]
        );
        assert_eq!(range.bucket_keys(Granularity::Year), vec!["2023", "2024"]);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(Granularity::Day.display_label("2024-01-05"), "Jan 5");
        assert_eq!(Granularity::Month.display_label("2024-01"), "Jan 2024");
        assert_eq!(Granularity::Year.display_label("2024"), "2024");
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!("Month".parse::<Granularity>().unwrap(), Granularity::Month);
        assert!("week".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_range_span_is_capped() {
        assert!(DateRange::new(day(2000, 1, 1), day(2019, 12, 31)).is_ok());

        let err = DateRange::new(day(1, 1, 1), day(9999, 12, 31)).unwrap_err();
        assert_eq!(err.status_code(), 422);
    }
}
