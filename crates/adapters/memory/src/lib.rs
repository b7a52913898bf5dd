//! # Ride Admin Memory Adapter
//!
//! In-memory implementations of the backend traits, primarily intended
//! for testing and local development.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ride_admin_adapter_memory::{MemoryDocumentStore, MemoryObjectStore};
//!
//! let store = Arc::new(MemoryDocumentStore::new());
//! let objects = Arc::new(MemoryObjectStore::new());
//! let api = AdminApi::new(store, objects);
//! ```

use async_trait::async_trait;
use ride_admin_core::error::{AdminError, AdminResult};
use ride_admin_core::traits::{AuthProvider, DocumentStore, ObjectStore};
use ride_admin_core::{AdminIdentity, Document, Fields};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Documents of one collection, ordered by id.
type Collection = BTreeMap<String, Document>;

/// In-memory document store.
///
/// Data is lost when the process exits. Collections can be made to fail
/// on demand to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    failing: Arc<RwLock<HashSet<String>>>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a document with a known id.
    pub async fn put(&self, collection: &str, doc: Document) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(doc.id.clone(), doc);
    }

    /// Inserts many documents.
    pub async fn put_all(&self, collection: &str, docs: impl IntoIterator<Item = Document>) {
        for doc in docs {
            self.put(collection, doc).await;
        }
    }

    /// Makes every operation on `collection` fail with a store error.
    pub async fn fail_collection(&self, collection: &str) {
        self.failing.write().await.insert(collection.to_string());
    }

    /// Returns the number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |c| c.len())
    }

    /// Clears all stored data.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
        self.failing.write().await.clear();
    }

    async fn check(&self, collection: &str) -> AdminResult<()> {
        if self.failing.read().await.contains(collection) {
            return Err(AdminError::store(format!(
                "collection '{collection}' is unavailable"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_documents(&self, collection: &str) -> AdminResult<Vec<Document>> {
        self.check(collection).await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_document(&self, collection: &str, id: &str) -> AdminResult<Option<Document>> {
        self.check(collection).await?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn update_fields(&self, collection: &str, id: &str, fields: Fields) -> AdminResult<()> {
        self.check(collection).await?;
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| AdminError::not_found(collection, "id", id))?;
        doc.fields.extend(fields);
        Ok(())
    }

    async fn insert_document(&self, collection: &str, fields: Fields) -> AdminResult<String> {
        self.check(collection).await?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        let doc = Document {
            id: id.clone(),
            fields,
        };
        self.put(collection, doc).await;
        Ok(id)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> AdminResult<()> {
        self.check(collection).await?;
        let mut collections = self.collections.write().await;
        if let Some(c) = collections.get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }
}

/// Stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-memory object store.
///
/// Download URLs look like `memory://objects/<path>`.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    fail_deletes: Arc<RwLock<bool>>,
}

impl MemoryObjectStore {
    /// URL prefix of objects held by this store.
    pub const URL_PREFIX: &'static str = "memory://objects/";

    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a stored object.
    pub async fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.read().await.get(path).cloned()
    }

    /// Returns the number of stored objects.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Makes every delete fail.
    pub async fn fail_deletes(&self, fail: bool) {
        *self.fail_deletes.write().await = fail;
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> AdminResult<String> {
        self.objects.write().await.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("{}{}", Self::URL_PREFIX, path))
    }

    async fn delete(&self, path: &str) -> AdminResult<()> {
        if *self.fail_deletes.read().await {
            return Err(AdminError::storage(format!("cannot delete '{path}'")));
        }
        match self.objects.write().await.remove(path) {
            Some(_) => Ok(()),
            None => Err(AdminError::storage(format!("object '{path}' does not exist"))),
        }
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(Self::URL_PREFIX)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    }
}

/// In-memory identity provider.
///
/// Tokens are registered up front. Sign-in state changes are published on
/// a watch channel so a `SessionContext` can follow them.
#[derive(Debug, Clone)]
pub struct MemoryAuthProvider {
    tokens: Arc<RwLock<HashMap<String, AdminIdentity>>>,
    current: Arc<watch::Sender<Option<AdminIdentity>>>,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthProvider {
    /// Creates a provider with no accepted tokens.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
            current: Arc::new(tx),
        }
    }

    /// Accepts `token` as belonging to `identity`.
    pub async fn register(&self, token: impl Into<String>, identity: AdminIdentity) {
        self.tokens.write().await.insert(token.into(), identity);
    }

    /// Subscribes to sign-in state changes.
    pub fn listen(&self) -> watch::Receiver<Option<AdminIdentity>> {
        self.current.subscribe()
    }

    /// Publishes a sign-in.
    pub fn sign_in(&self, identity: AdminIdentity) {
        self.current.send_replace(Some(identity));
    }

    /// Publishes a sign-out.
    pub fn sign_out(&self) {
        self.current.send_replace(None);
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn verify_token(&self, token: &str) -> AdminResult<AdminIdentity> {
        self.tokens
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(AdminError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ride_admin_core::FieldValue;

    #[tokio::test]
    async fn test_insert_and_list() {
        let store = MemoryDocumentStore::new();
        let mut fields = Fields::new();
        fields.insert("headline".to_string(), FieldValue::from("Hello"));

        let id = store.insert_document("news", fields).await.unwrap();
        let docs = store.list_documents("news").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert!(store.list_documents("rides").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryDocumentStore::new();
        store
            .put("rides", Document::new("r1").with("status", "pending").with("price", 10i64))
            .await;

        let mut fields = Fields::new();
        fields.insert("status".to_string(), FieldValue::from("cancelled"));
        store.update_fields("rides", "r1", fields).await.unwrap();

        let doc = store.get_document("rides", "r1").await.unwrap().unwrap();
        assert_eq!(doc.get_string("status").as_deref(), Some("cancelled"));
        assert_eq!(doc.get_f64("price"), Some(10.0));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = MemoryDocumentStore::new();
        let result = store.update_fields("rides", "nope", Fields::new()).await;
        assert!(matches!(result, Err(AdminError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_failing_collection() {
        let store = MemoryDocumentStore::new();
        store.fail_collection("rides").await;
        assert!(store.list_documents("rides").await.is_err());
        assert!(store.list_documents("users").await.is_ok());
    }

    #[tokio::test]
    async fn test_object_round_trip() {
        let objects = MemoryObjectStore::new();
        let url = objects.upload("news-media/a.png", vec![1, 2, 3], "image/png").await.unwrap();
        let path = objects.path_from_url(&url).unwrap();
        assert_eq!(path, "news-media/a.png");
        assert!(objects.path_from_url("https://youtube.com/watch?v=1").is_none());

        objects.delete(&path).await.unwrap();
        assert!(objects.delete(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_auth_provider() {
        let auth = MemoryAuthProvider::new();
        auth.register("tok", AdminIdentity::new("admin")).await;
        assert_eq!(auth.verify_token("tok").await.unwrap().uid, "admin");
        assert!(matches!(auth.verify_token("bad").await, Err(AdminError::InvalidToken)));

        let rx = auth.listen();
        auth.sign_in(AdminIdentity::new("admin"));
        assert!(rx.borrow().is_some());
    }
}
