//! Core record types for Ride Admin.
//!
//! Each record is built from a [`Document`] exactly once. Date fields are
//! normalized into a single millisecond timestamp at that point, so
//! filtering and sorting never look at the source fields again.

use crate::document::Document;
use crate::time::RawTimestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a ride.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Pending,
    Completed,
    Cancelled,
    /// Any status string outside the three known ones, kept verbatim.
    #[serde(untagged)]
    Other(String),
}

impl RideStatus {
    /// Parses a raw status string. Unknown values are preserved.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the wire string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ride request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id: String,
    pub status: RideStatus,
    /// Normalized request time in epoch milliseconds.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropoff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passenger_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fare: Option<f64>,
}

impl Ride {
    /// Builds a ride from its document. A missing or unparseable
    /// `requestedAt` resolves to `now_ms`.
    pub fn from_document(doc: &Document, now_ms: i64) -> Self {
        let status = doc
            .get_string("status")
            .map(|s| RideStatus::parse(&s))
            .unwrap_or_else(|| RideStatus::Other(String::new()));

        Self {
            id: doc.id.clone(),
            status,
            timestamp: RawTimestamp::from_field(doc.get("requestedAt")).resolve_or(now_ms),
            pickup: doc.first_string(&["pickup", "pickupLocation"]),
            dropoff: doc.first_string(&["dropoff", "dropoffLocation"]),
            driver_id: doc.get_string("driverId"),
            passenger_id: doc.first_string(&["passengerId", "riderId"]),
            fare: doc.first_of(&["price", "fare"]).and_then(|v| v.as_f64()),
        }
    }
}

/// A payment transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// Amount in minor currency units (kobo).
    pub amount: i64,
    /// Normalized payment time in epoch milliseconds.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Transaction {
    /// Source fields for the payment time, in priority order.
    pub const TIMESTAMP_FIELDS: [&'static str; 3] = ["paidAt", "paid_at", "createdAt"];

    /// Builds a transaction from its document.
    ///
    /// The first of `paidAt`, `paid_at`, `createdAt` that resolves wins;
    /// when none does the payment time is `now_ms`.
    pub fn from_document(doc: &Document, now_ms: i64) -> Self {
        let timestamp = Self::TIMESTAMP_FIELDS
            .iter()
            .find_map(|field| RawTimestamp::from_field(doc.get(field)).resolve())
            .unwrap_or(now_ms);

        Self {
            id: doc.id.clone(),
            amount: doc.get_f64("amount").map(|a| a.round() as i64).unwrap_or(0),
            timestamp,
            customer: doc.first_string(&["userId", "customerId", "email", "customerEmail"]),
            status: doc.get_string("status"),
            reference: doc.get_string("reference"),
        }
    }

    /// Amount in major currency units.
    pub fn amount_major(&self) -> f64 {
        self.amount as f64 / 100.0
    }
}

/// Kind of platform account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Driver,
    Rider,
    #[serde(untagged)]
    Other(String),
}

impl AccountType {
    /// Parses a raw account type string.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "driver" => Self::Driver,
            "rider" => Self::Rider,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the wire string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Driver => "driver",
            Self::Rider => "rider",
            Self::Other(s) => s,
        }
    }
}

/// A platform user (rider or driver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Normalized creation time; `None` when the document has no usable
    /// `createdAt`. Such users are left out of date-filtered views.
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl User {
    /// Builds a user from its document.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            created_at: RawTimestamp::from_field(doc.get("createdAt")).resolve(),
            account_type: doc.get_string("accountType").map(|s| AccountType::parse(&s)),
            account_status: doc.get_string("accountStatus"),
            first_name: doc.get_string("firstName"),
            last_name: doc.get_string("lastName"),
            email: doc.get_string("email"),
            phone: doc.first_string(&["phoneNumber", "phone"]),
        }
    }

    /// `first last`, with missing parts left empty.
    pub fn full_name(&self) -> String {
        full_name(self.first_name.as_deref(), self.last_name.as_deref())
    }
}

pub(crate) fn full_name(first: Option<&str>, last: Option<&str>) -> String {
    format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default())
        .trim()
        .to_string()
}

/// Review state of a withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    /// Parses a raw status; unknown values are treated as pending.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// A driver's request to withdraw earnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    pub amount: f64,
    pub status: WithdrawalStatus,
    /// Normalized request time; `None` when absent.
    pub requested_at: Option<i64>,
}

impl WithdrawalRequest {
    /// Builds a withdrawal request from its document.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            user_id: doc.get_string("userId"),
            first_name: doc.get_string("firstName"),
            last_name: doc.get_string("lastName"),
            account_type: doc.get_string("accountType").map(|s| AccountType::parse(&s)),
            amount: doc.get_f64("amount").unwrap_or(0.0),
            status: doc
                .get_string("status")
                .map(|s| WithdrawalStatus::parse(&s))
                .unwrap_or(WithdrawalStatus::Pending),
            requested_at: RawTimestamp::from_field(doc.first_of(&["requestedAt", "createdAt"]))
                .resolve(),
        }
    }

    pub fn full_name(&self) -> String {
        full_name(self.first_name.as_deref(), self.last_name.as_deref())
    }
}

/// Media attached to a news article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    #[default]
    None,
}

impl MediaType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::None,
        }
    }

    /// Stored string; `None` is stored as an empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::None => "",
        }
    }

    /// Media type of an upload: `image/*` or `video/*`, nothing else.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if content_type.starts_with("image/") {
            Some(Self::Image)
        } else if content_type.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// A news article shown in the rider and driver apps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub headline: String,
    pub article: String,
    pub media_url: String,
    pub media_type: MediaType,
    pub video_link: String,
    pub instagram_link: String,
    pub twitter_link: String,
    pub linkedin_link: String,
    /// Last update time.
    pub updated_at: Option<i64>,
    pub created_at: Option<i64>,
}

impl NewsArticle {
    /// Builds an article from its document.
    pub fn from_document(doc: &Document) -> Self {
        let text = |key: &str| doc.get_string(key).unwrap_or_default();
        Self {
            id: doc.id.clone(),
            headline: text("headline"),
            article: text("article"),
            media_url: text("mediaURL"),
            media_type: MediaType::parse(&text("mediaType")),
            video_link: text("videoLink"),
            instagram_link: text("instagramLink"),
            twitter_link: text("twitterLink"),
            linkedin_link: text("linkedinLink"),
            updated_at: RawTimestamp::from_field(doc.get("timestamp")).resolve(),
            created_at: RawTimestamp::from_field(doc.get("createdAt")).resolve(),
        }
    }

    /// Sort key: creation time, falling back to the last update.
    pub fn sort_time(&self) -> Option<i64> {
        self.created_at.or(self.updated_at)
    }

    pub fn has_media(&self) -> bool {
        !self.media_url.is_empty()
    }

    /// Number of space-separated words in the body.
    pub fn word_count(&self) -> usize {
        self.article.split(' ').count()
    }
}

/// A ride category and its pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideCategory {
    pub id: String,
    pub name: String,
    pub rate_per_kilometer: f64,
    pub surge_charge_rate: f64,
}

impl RideCategory {
    /// Builds a category from its document. Missing rates read as zero.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.get_string("name").unwrap_or_default(),
            rate_per_kilometer: doc.get_f64("rate_per_kilometer").unwrap_or(0.0),
            surge_charge_rate: doc.get_f64("surge_charge_rate").unwrap_or(0.0),
        }
    }
}

/// The authenticated dashboard operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    /// Provider user id.
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AdminIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FieldValue;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_ride_from_document() {
        let requested = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let doc = Document::new("r1")
            .with("status", "completed")
            .with("requestedAt", requested)
            .with("pickupLocation", "Yaba")
            .with("price", "2500");

        let ride = Ride::from_document(&doc, 0);
        assert_eq!(ride.status, RideStatus::Completed);
        assert_eq!(ride.timestamp, requested.timestamp_millis());
        assert_eq!(ride.pickup.as_deref(), Some("Yaba"));
        assert_eq!(ride.fare, Some(2500.0));
    }

    #[test]
    fn test_ride_missing_timestamp_is_now() {
        let doc = Document::new("r1").with("requestedAt", "garbage");
        assert_eq!(Ride::from_document(&doc, 777).timestamp, 777);
        assert_eq!(Ride::from_document(&Document::new("r2"), 777).timestamp, 777);
    }

    #[test]
    fn test_unknown_ride_status_preserved() {
        let doc = Document::new("r1").with("status", "accepted");
        assert_eq!(
            Ride::from_document(&doc, 0).status,
            RideStatus::Other("accepted".to_string())
        );
    }

    #[test]
    fn test_transaction_timestamp_priority() {
        let paid = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let created = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();

        let doc = Document::new("t1")
            .with("paid_at", paid)
            .with("createdAt", created)
            .with("amount", 150000i64);
        let txn = Transaction::from_document(&doc, 0);
        assert_eq!(txn.timestamp, paid.timestamp_millis());
        assert_eq!(txn.amount_major(), 1500.0);

        let doc = Document::new("t2").with("createdAt", created);
        assert_eq!(Transaction::from_document(&doc, 0).timestamp, created.timestamp_millis());

        assert_eq!(Transaction::from_document(&Document::new("t3"), 9).timestamp, 9);
    }

    #[test]
    fn test_user_without_created_at() {
        let doc = Document::new("u1").with("firstName", "Ada").with("accountType", "driver");
        let user = User::from_document(&doc);
        assert_eq!(user.created_at, None);
        assert_eq!(user.account_type, Some(AccountType::Driver));
        assert_eq!(user.full_name(), "Ada");
    }

    #[test]
    fn test_news_from_document() {
        let doc = Document::new("n1")
            .with("headline", "Fares drop")
            .with("article", "Fares drop this week")
            .with("mediaType", "image")
            .with("mediaURL", "https://cdn.example.com/a.png")
            .with("createdAt", FieldValue::Integer(10));
        let article = NewsArticle::from_document(&doc);
        assert!(article.has_media());
        assert_eq!(article.media_type, MediaType::Image);
        assert_eq!(article.word_count(), 4);
        assert_eq!(article.sort_time(), Some(10));
    }

    #[test]
    fn test_media_type_from_content_type() {
        assert_eq!(MediaType::from_content_type("image/png"), Some(MediaType::Image));
        assert_eq!(MediaType::from_content_type("Video/MP4"), Some(MediaType::Video));
        assert_eq!(MediaType::from_content_type("application/pdf"), None);
        assert_eq!(MediaType::from_content_type(""), None);
    }

    #[test]
    fn test_ride_category_from_document() {
        let doc = Document::new("economy")
            .with("name", "Economy")
            .with("rate_per_kilometer", 150i64)
            .with("surge_charge_rate", "1.5");
        let category = RideCategory::from_document(&doc);
        assert_eq!(category.name, "Economy");
        assert_eq!(category.rate_per_kilometer, 150.0);
        assert_eq!(category.surge_charge_rate, 1.5);

        let bare = RideCategory::from_document(&Document::new("x"));
        assert_eq!(bare.rate_per_kilometer, 0.0);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&RideStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        let json = serde_json::to_string(&RideStatus::Other("accepted".into())).unwrap();
        assert_eq!(json, "\"accepted\"");
    }
}
