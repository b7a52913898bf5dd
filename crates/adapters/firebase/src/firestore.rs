//! Firestore v1 REST document store.

use crate::error::error_message;
use crate::value::{decode_document, encode_fields, field_path};
use crate::{FirebaseConfig, FirebaseError};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use ride_admin_core::error::{AdminError, AdminResult};
use ride_admin_core::traits::DocumentStore;
use ride_admin_core::{Document, Fields};
use serde::Deserialize;
use serde_json::json;

/// Documents per list page.
const PAGE_SIZE: u32 = 300;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<serde_json::Value>,
    next_page_token: Option<String>,
}

/// Document store backed by the Firestore REST API.
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    config: FirebaseConfig,
    http_client: Client,
}

impl FirestoreStore {
    pub fn new(config: FirebaseConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: FirebaseConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// URL of the default database's document root.
    pub fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.config.firestore_url, self.config.project_id
        )
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.documents_url(), urlencoding::encode(collection))
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), urlencoding::encode(id))
    }

    async fn fail(response: Response) -> FirebaseError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        FirebaseError::Firestore {
            status,
            message: error_message(&body),
        }
    }

    async fn list_page(
        &self,
        collection: &str,
        page_token: Option<&str>,
    ) -> Result<ListResponse, FirebaseError> {
        let mut request = self
            .http_client
            .get(self.collection_url(collection))
            .query(&[("pageSize", PAGE_SIZE.to_string())]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = self.config.authorize(request).send().await?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list_documents(&self, collection: &str) -> AdminResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(collection, page_token.as_deref()).await?;
            for resource in &page.documents {
                documents.push(decode_document(resource)?);
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(collection, count = documents.len(), "Listed Firestore documents");
        Ok(documents)
    }

    async fn get_document(&self, collection: &str, id: &str) -> AdminResult<Option<Document>> {
        let request = self.http_client.get(self.document_url(collection, id));
        let response = self
            .config
            .authorize(request)
            .send()
            .await
            .map_err(FirebaseError::from)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail(response).await.into());
        }
        let resource: serde_json::Value = response.json().await.map_err(FirebaseError::from)?;
        Ok(Some(decode_document(&resource)?))
    }

    async fn update_fields(&self, collection: &str, id: &str, fields: Fields) -> AdminResult<()> {
        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", field_path(k)))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));

        let request = self
            .http_client
            .patch(self.document_url(collection, id))
            .query(&query)
            .json(&json!({ "fields": encode_fields(&fields) }));
        let response = self
            .config
            .authorize(request)
            .send()
            .await
            .map_err(FirebaseError::from)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AdminError::not_found(collection, "id", id));
        }
        if !response.status().is_success() {
            return Err(Self::fail(response).await.into());
        }
        Ok(())
    }

    async fn insert_document(&self, collection: &str, fields: Fields) -> AdminResult<String> {
        let request = self
            .http_client
            .post(self.collection_url(collection))
            .json(&json!({ "fields": encode_fields(&fields) }));
        let response = self
            .config
            .authorize(request)
            .send()
            .await
            .map_err(FirebaseError::from)?;

        if !response.status().is_success() {
            return Err(Self::fail(response).await.into());
        }
        let resource: serde_json::Value = response.json().await.map_err(FirebaseError::from)?;
        Ok(decode_document(&resource)?.id)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> AdminResult<()> {
        let request = self.http_client.delete(self.document_url(collection, id));
        let response = self
            .config
            .authorize(request)
            .send()
            .await
            .map_err(FirebaseError::from)?;

        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(Self::fail(response).await.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let store = FirestoreStore::new(FirebaseConfig::new("ride-app", "key"));
        assert_eq!(
            store.documents_url(),
            "https://firestore.googleapis.com/v1/projects/ride-app/databases/(default)/documents"
        );
        assert!(store
            .document_url("withdrawal_requests", "a b")
            .ends_with("/documents/withdrawal_requests/a%20b"));
    }

    #[test]
    fn test_list_response_shape() {
        let page: ListResponse = serde_json::from_str(r#"{"nextPageToken":"abc"}"#).unwrap();
        assert!(page.documents.is_empty());
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
    }
}
