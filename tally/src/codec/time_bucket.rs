use chrono::{DateTime, Datelike, DurationRound, NaiveDateTime, TimeDelta, Utc};

use crate::error::{Result, TallyError};

const TOKEN_LEN: usize = 12;
const TOKEN_FORMAT: &str = "%Y%m%d%H%M";

/// Years that format as exactly four digits.
const TOKEN_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Formats `at` as `YYYYMMDDHHmm` in UTC.
pub fn bucket_time_token(at: DateTime<Utc>) -> String {
    at.format(TOKEN_FORMAT).to_string()
}

/// Rejects instants whose token would not parse back, so nothing is ever
/// counted under a bucket the drainer cannot read.
pub fn check_bucket_time(at: DateTime<Utc>) -> Result<()> {
    if TOKEN_YEARS.contains(&at.year()) {
        Ok(())
    } else {
        Err(TallyError::validation(
            "at",
            "year must be between 0 and 9999",
            Some(&at.to_rfc3339()),
        ))
    }
}

/// Parses a `YYYYMMDDHHmm` token back into the start of that minute.
pub fn parse_bucket_time_token(token: &str) -> Result<DateTime<Utc>> {
    if token.len() != TOKEN_LEN || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TallyError::decode(token, "expected 12 digit YYYYMMDDHHmm token"));
    }

    NaiveDateTime::parse_from_str(token, TOKEN_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| TallyError::decode(token, format!("not a valid calendar minute: {e}")))
}

pub fn truncate_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(TimeDelta::minutes(1)).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_token_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 30).unwrap();
        assert_eq!(bucket_time_token(at), "202401011015");
    }

    #[test]
    fn test_parse_truncates_seconds() {
        let parsed = parse_bucket_time_token("202401011015").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_bucket_time_token("2024010110").is_err());
        assert!(parse_bucket_time_token("20240101101x").is_err());
        assert!(parse_bucket_time_token("202413011015").is_err());
        assert!(parse_bucket_time_token("202401011075").is_err());
    }

    #[test]
    fn test_check_bucket_time_limits_year() {
        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 0).unwrap();
        let past_end = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        let before_start = Utc.with_ymd_and_hms(-1, 12, 31, 23, 59, 0).unwrap();

        assert!(check_bucket_time(last).is_ok());
        assert_eq!(parse_bucket_time_token(&bucket_time_token(last)).unwrap(), last);

        let err = check_bucket_time(past_end).unwrap_err();
        assert!(matches!(err, TallyError::Validation { ref field, .. } if field == "at"));
        assert!(check_bucket_time(before_start).is_err());
    }

    #[test]
    fn test_minute_boundaries() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 30).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 59).unwrap();
        let c = Utc.with_ymd_and_hms(2024, 1, 1, 10, 16, 0).unwrap();

        assert_eq!(bucket_time_token(a), bucket_time_token(b));
        assert_ne!(bucket_time_token(b), bucket_time_token(c));
        assert_eq!(truncate_to_minute(b), Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap());
    }
}
