use chrono::{DateTime, Utc};

/// Parse an ISO-8601 / RFC 3339 timestamp as stored on records.
///
/// Returns `None` for anything that does not parse; callers decide whether
/// that means "drop the record" or "treat as older than everything".
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_accepts_offsets() {
        let utc = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
        let offset = parse_timestamp("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(utc, offset);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-45T00:00:00Z").is_none());
    }
}
