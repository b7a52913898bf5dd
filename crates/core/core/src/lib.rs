//! # Ride Admin Core
//!
//! This crate provides the foundational types and traits for the Ride Admin
//! dashboard. It defines the store-level `Document`, the normalized records
//! (`Ride`, `Transaction`, `User`, ...), error types, the session context
//! and the trait interfaces that backend adapters must implement.

pub mod context;
pub mod document;
pub mod error;
pub mod guard;
pub mod time;
pub mod traits;
pub mod types;

// Re-export commonly used items at the crate root
pub use context::{SessionContext, SessionState, SessionSubscription};
pub use document::{Document, FieldValue, Fields};
pub use error::{AdminError, AdminResult};
pub use guard::GuardDecision;
pub use time::{DateRange, Granularity, RawTimestamp};
pub use traits::{AuthProvider, DocumentStore, ObjectStore};
pub use types::{
    AccountType, AdminIdentity, MediaType, NewsArticle, Ride, RideCategory, RideStatus, Transaction,
    User, WithdrawalRequest, WithdrawalStatus,
};
