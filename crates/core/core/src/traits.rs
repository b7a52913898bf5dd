//! Core traits for Ride Admin.
//!
//! These are the seams to the hosted backend: the document database, the
//! object storage service and the identity provider. Adapters implement
//! them; the dashboard service only ever sees `Arc<dyn ...>`.

use async_trait::async_trait;

use crate::document::{Document, Fields};
use crate::error::AdminResult;
use crate::types::AdminIdentity;

/// Trait for document database adapters.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads every document in a collection. No filtering, ordering or
    /// pagination is applied on the caller's behalf.
    async fn list_documents(&self, collection: &str) -> AdminResult<Vec<Document>>;

    /// Gets a single document by id.
    async fn get_document(&self, collection: &str, id: &str) -> AdminResult<Option<Document>>;

    /// Merges `fields` into an existing document.
    ///
    /// Fails with `NotFound` if the document does not exist.
    async fn update_fields(&self, collection: &str, id: &str, fields: Fields) -> AdminResult<()>;

    /// Inserts a new document and returns its generated id.
    async fn insert_document(&self, collection: &str, fields: Fields) -> AdminResult<String>;

    /// Deletes a document. Deleting a missing document is not an error.
    async fn delete_document(&self, collection: &str, id: &str) -> AdminResult<()>;
}

/// Trait for blob storage adapters.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads a blob at `path` and returns its public download URL.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> AdminResult<String>;

    /// Deletes the blob at `path`.
    async fn delete(&self, path: &str) -> AdminResult<()>;

    /// Recovers the object path from a download URL issued by this store.
    ///
    /// Returns `None` for URLs that point elsewhere (external links).
    fn path_from_url(&self, url: &str) -> Option<String>;
}

/// Trait for identity providers.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verifies an identity token and returns who it belongs to.
    async fn verify_token(&self, token: &str) -> AdminResult<AdminIdentity>;
}
