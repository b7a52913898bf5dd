//! # Ride Admin Dashboard
//!
//! Analytics and management API for the ride-hailing admin dashboard.
//! Provides the dashboard aggregator plus user, ride, ride category,
//! withdrawal and news management on top of any
//! [`DocumentStore`](ride_admin_core::DocumentStore).

mod api;
mod stats;

pub use api::*;
pub use stats::*;

use chrono::{FixedOffset, Offset, Utc};

/// Names of the backing collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub users: String,
    pub rides: String,
    pub transactions: String,
    pub withdrawals: String,
    pub news: String,
    pub ride_categories: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            rides: "rides".to_string(),
            transactions: "transactions".to_string(),
            withdrawals: "withdrawal_requests".to_string(),
            news: "news".to_string(),
            ride_categories: "ride_categories".to_string(),
        }
    }
}

/// Admin dashboard configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Collection names.
    pub collections: Collections,
    /// Offset used to read calendar days.
    pub offset: FixedOffset,
    /// Object store folder for uploaded news media.
    pub media_prefix: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            collections: Collections::default(),
            offset: Utc.fix(),
            media_prefix: "news-media".to_string(),
        }
    }
}

impl AdminConfig {
    /// Creates a new admin config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the collection names.
    pub fn collections(mut self, collections: Collections) -> Self {
        self.collections = collections;
        self
    }

    /// Sets the calendar offset.
    pub fn offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the media folder.
    pub fn media_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.media_prefix = prefix.into();
        self
    }

    /// Analytics query defaults derived from this config.
    pub fn query(&self) -> AnalyticsQuery {
        AnalyticsQuery {
            offset: self.offset,
            ..AnalyticsQuery::default()
        }
    }
}
