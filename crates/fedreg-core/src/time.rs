use crate::error::{CoreError, Result};
use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime};

/// Window inside which a document counts as new.
pub const NEW_DOCUMENT_WINDOW: Duration = Duration::hours(24);

/// A Federal Register publication date.
///
/// The upstream API returns bare calendar dates (`2025-11-05`), but full
/// RFC 3339 timestamps are accepted too. Values without an offset are read
/// as UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicationDate(pub OffsetDateTime);

impl PublicationDate {
    pub fn new(datetime: OffsetDateTime) -> Self {
        Self(datetime)
    }

    pub fn inner(&self) -> &OffsetDateTime {
        &self.0
    }

    /// Whether this date lies less than 24 hours before `now`.
    ///
    /// `now` is shifted into the offset carried by the publication date
    /// before comparing.
    pub fn is_new_at(&self, now: OffsetDateTime) -> bool {
        let now = now.to_offset(self.0.offset());
        now - self.0 < NEW_DOCUMENT_WINDOW
    }
}

impl fmt::Display for PublicationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self.0.format(&Rfc3339).map_err(|_| fmt::Error)?;
        write!(f, "{formatted}")
    }
}

impl FromStr for PublicationDate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(datetime) = OffsetDateTime::parse(s, &Rfc3339) {
            return Ok(Self(datetime));
        }
        let local = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
        if let Ok(datetime) = PrimitiveDateTime::parse(s, &local) {
            return Ok(Self(datetime.assume_utc()));
        }
        let date_only = format_description!("[year]-[month]-[day]");
        Date::parse(s, &date_only)
            .map(|date| Self(date.midnight().assume_utc()))
            .map_err(|e| CoreError::invalid_date(format!("'{s}': {e}")))
    }
}

pub fn parse_publication_date(value: &str) -> Result<PublicationDate> {
    value.parse()
}

/// Recency flag for a raw publication date string.
///
/// Anything that does not parse is treated as not new.
pub fn is_within_24_hours(publication_date: &str, now: OffsetDateTime) -> bool {
    parse_publication_date(publication_date)
        .map(|date| date.is_new_at(now))
        .unwrap_or(false)
}

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// `YYYY-MM-DD` form used by the upstream date filters.
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Calendar date `ago` before `now`, formatted for a `publication_date` filter.
pub fn date_filter(now: OffsetDateTime, ago: Duration) -> String {
    format_date((now - ago).date())
}

pub fn format_rfc3339(datetime: OffsetDateTime) -> Result<String> {
    Ok(datetime.format(&Rfc3339)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn test_parse_bare_date() {
        let parsed: PublicationDate = "2025-11-05".parse().unwrap();
        assert_eq!(parsed.inner(), &datetime!(2025-11-05 00:00:00 UTC));
    }

    #[test]
    fn test_parse_rfc3339_keeps_offset() {
        let parsed: PublicationDate = "2025-11-05T10:00:00+02:00".parse().unwrap();
        assert_eq!(parsed.inner().offset().whole_hours(), 2);
        assert_eq!(parsed.inner(), &datetime!(2025-11-05 08:00:00 UTC));
    }

    #[test]
    fn test_parse_zulu_suffix() {
        let parsed: PublicationDate = "2025-11-05T10:00:00Z".parse().unwrap();
        assert_eq!(parsed.inner(), &datetime!(2025-11-05 10:00:00 UTC));
    }

    #[test]
    fn test_parse_without_offset_is_utc() {
        let parsed: PublicationDate = "2025-11-05T10:30:00".parse().unwrap();
        assert_eq!(parsed.inner(), &datetime!(2025-11-05 10:30:00 UTC));
    }

    #[test]
    fn test_parse_invalid() {
        let err = "yesterday".parse::<PublicationDate>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidDate(_)));
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_23_hours_ago_is_new() {
        let now = datetime!(2025-11-06 12:00:00 UTC);
        let published = format_rfc3339(now - Duration::hours(23)).unwrap();
        assert!(is_within_24_hours(&published, now));
    }

    #[test]
    fn test_25_hours_ago_is_not_new() {
        let now = datetime!(2025-11-06 12:00:00 UTC);
        let published = format_rfc3339(now - Duration::hours(25)).unwrap();
        assert!(!is_within_24_hours(&published, now));
    }

    #[test]
    fn test_exactly_24_hours_is_not_new() {
        let now = datetime!(2025-11-06 00:00:00 UTC);
        assert!(!is_within_24_hours("2025-11-05", now));
    }

    #[test]
    fn test_bare_date_same_day_is_new() {
        let now = datetime!(2025-11-05 18:00:00 UTC);
        assert!(is_within_24_hours("2025-11-05", now));
    }

    #[test]
    fn test_recency_respects_publication_offset() {
        // 23 hours earlier in absolute terms, expressed in a different offset
        let now = datetime!(2025-11-06 12:00:00 UTC);
        assert!(is_within_24_hours("2025-11-05T08:00:00-05:00", now));
        assert!(!is_within_24_hours("2025-11-05T06:00:00-05:00", now));
    }

    #[test]
    fn test_unparseable_is_not_new() {
        let now = now_utc();
        assert!(!is_within_24_hours("", now));
        assert!(!is_within_24_hours("not a date", now));
        assert!(!is_within_24_hours("2025-13-45", now));
    }

    #[test]
    fn test_date_filter() {
        let now = datetime!(2025-11-05 09:15:00 UTC);
        assert_eq!(date_filter(now, Duration::days(30)), "2025-10-06");
        assert_eq!(date_filter(now, Duration::hours(24)), "2025-11-04");
    }

    #[test]
    fn test_format_date_pads() {
        assert_eq!(format_date(date!(2025 - 01 - 07)), "2025-01-07");
    }

    #[test]
    fn test_display_roundtrip() {
        let parsed: PublicationDate = "2025-11-05T10:00:00Z".parse().unwrap();
        assert_eq!(parsed.to_string(), "2025-11-05T10:00:00Z");
    }
}
