//! # Ride Admin Firebase Adapter
//!
//! REST implementations of the backend traits against Firebase:
//!
//! - [`FirestoreStore`]: Firestore v1 documents API
//! - [`FirebaseStorage`]: Firebase Storage v0 object API
//! - [`IdentityToolkit`]: ID token verification
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ride_admin_adapter_firebase::{FirebaseConfig, FirestoreStore, FirebaseStorage};
//!
//! let config = FirebaseConfig::new("my-project", "api-key").storage_bucket("my-project.appspot.com");
//! let store = Arc::new(FirestoreStore::new(config.clone()));
//! let objects = Arc::new(FirebaseStorage::new(config));
//! ```

mod auth;
mod error;
mod firestore;
mod storage;
pub mod value;

pub use auth::IdentityToolkit;
pub use error::FirebaseError;
pub use firestore::FirestoreStore;
pub use storage::FirebaseStorage;

/// Firebase project settings.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    /// Web API key, sent as the `key` query parameter.
    pub api_key: String,
    /// Storage bucket; defaults to `<project>.appspot.com`.
    pub storage_bucket: String,
    /// OAuth access token for privileged access, sent as a bearer token.
    pub access_token: Option<String>,
    pub firestore_url: String,
    pub storage_url: String,
    pub identity_url: String,
}

impl FirebaseConfig {
    pub const FIRESTORE_URL: &'static str = "https://firestore.googleapis.com/v1";
    pub const STORAGE_URL: &'static str = "https://firebasestorage.googleapis.com/v0";
    pub const IDENTITY_URL: &'static str = "https://identitytoolkit.googleapis.com/v1";

    /// Creates a config for a project.
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        let project_id = project_id.into();
        Self {
            storage_bucket: format!("{project_id}.appspot.com"),
            project_id,
            api_key: api_key.into(),
            access_token: None,
            firestore_url: Self::FIRESTORE_URL.to_string(),
            storage_url: Self::STORAGE_URL.to_string(),
            identity_url: Self::IDENTITY_URL.to_string(),
        }
    }

    /// Sets the storage bucket.
    pub fn storage_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.storage_bucket = bucket.into();
        self
    }

    /// Sets the bearer access token.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Points Firestore at another host, such as the local emulator.
    pub fn firestore_url(mut self, url: impl Into<String>) -> Self {
        self.firestore_url = url.into();
        self
    }

    /// Points Storage at another host.
    pub fn storage_url(mut self, url: impl Into<String>) -> Self {
        self.storage_url = url.into();
        self
    }

    /// Points the identity API at another host.
    pub fn identity_url(mut self, url: impl Into<String>) -> Self {
        self.identity_url = url.into();
        self
    }

    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.query(&[("key", self.api_key.as_str())]);
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}
