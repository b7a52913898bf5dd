//! Integration tests for Ride Admin Core
//!
//! This test suite covers:
//! - Record ingestion from documents
//! - Date range filtering bounds
//! - Error handling

use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use ride_admin_core::{
    AdminError, DateRange, Document, FieldValue, Granularity, Ride, RideStatus, Transaction, User,
};

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

mod ingestion_tests {
    use super::*;

    #[test]
    fn test_mixed_timestamp_shapes_normalize_once() {
        let backend = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let docs = vec![
            Document::new("a").with("requestedAt", backend),
            Document::new("b").with("requestedAt", "2024-01-02T12:00:00Z"),
            Document::new("c").with("requestedAt", FieldValue::Integer(1_704_283_200_000)),
            Document::new("d"),
        ];

        let rides: Vec<Ride> = docs.iter().map(|d| Ride::from_document(d, 5)).collect();
        let stamps: Vec<i64> = rides.iter().map(|r| r.timestamp).collect();
        assert_eq!(
            stamps,
            vec![
                backend.timestamp_millis(),
                backend.timestamp_millis() + 86_400_000,
                1_704_283_200_000,
                5
            ]
        );
    }

    #[test]
    fn test_transaction_customer_fallbacks() {
        let doc = Document::new("t1").with("customerEmail", "ada@example.com");
        let txn = Transaction::from_document(&doc, 0);
        assert_eq!(txn.customer.as_deref(), Some("ada@example.com"));
        assert_eq!(txn.amount, 0);
    }

    #[test]
    fn test_user_unparseable_created_at_is_absent() {
        let doc = Document::new("u1").with("createdAt", "not a date");
        assert_eq!(User::from_document(&doc).created_at, None);
    }

    #[test]
    fn test_ride_status_round_trip_through_json() {
        let ride = Ride::from_document(&Document::new("r").with("status", "pending"), 0);
        let json = serde_json::to_value(&ride).unwrap();
        assert_eq!(json["status"], "pending");
        let back: Ride = serde_json::from_value(json).unwrap();
        assert_eq!(back.status, RideStatus::Pending);
    }
}

mod range_tests {
    use super::*;

    #[test]
    fn test_range_bounds_are_inclusive() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap();
        let (start, end) = range.bounds_ms(utc());

        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp_millis();
        let last = Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap().timestamp_millis() + 999;
        assert_eq!((start, end), (first, last));
    }

    #[test]
    fn test_bucket_key_uses_offset() {
        // 23:30 UTC on Jan 1 is already Jan 2 in Lagos.
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap().timestamp_millis();
        let lagos = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(Granularity::Day.bucket_key(ts, utc()).unwrap(), "2024-01-01");
        assert_eq!(Granularity::Day.bucket_key(ts, lagos).unwrap(), "2024-01-02");
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_invalid_granularity_is_user_error() {
        let err = "fortnight".parse::<Granularity>().unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_serde_error_conversion() {
        let err: AdminError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, AdminError::SerializationError { .. }));
    }
}
