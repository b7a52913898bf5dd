//! Firebase Storage object store.

use crate::error::error_message;
use crate::{FirebaseConfig, FirebaseError};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use ride_admin_core::error::AdminResult;
use ride_admin_core::traits::ObjectStore;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    download_tokens: Option<String>,
}

/// Object store backed by the Firebase Storage REST API.
#[derive(Debug, Clone)]
pub struct FirebaseStorage {
    config: FirebaseConfig,
    http_client: Client,
}

impl FirebaseStorage {
    pub fn new(config: FirebaseConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: FirebaseConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Prefix shared by every object URL of the bucket.
    fn objects_url(&self) -> String {
        format!(
            "{}/b/{}/o",
            self.config.storage_url, self.config.storage_bucket
        )
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.objects_url(), urlencoding::encode(path))
    }

    /// Public download URL for an uploaded object.
    pub fn download_url(&self, path: &str, token: Option<&str>) -> String {
        let mut url = format!("{}?alt=media", self.object_url(path));
        if let Some(token) = token {
            url.push_str("&token=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }

    async fn fail(response: Response) -> FirebaseError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        FirebaseError::Storage {
            status,
            message: error_message(&body),
        }
    }
}

#[async_trait]
impl ObjectStore for FirebaseStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> AdminResult<String> {
        let size = bytes.len();
        let request = self
            .http_client
            .post(self.objects_url())
            .query(&[("uploadType", "media"), ("name", path)])
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        let response = self
            .config
            .authorize(request)
            .send()
            .await
            .map_err(FirebaseError::from)?;

        if !response.status().is_success() {
            return Err(Self::fail(response).await.into());
        }
        let uploaded: UploadResponse = response.json().await.map_err(FirebaseError::from)?;
        let token = uploaded
            .download_tokens
            .as_deref()
            .and_then(|t| t.split(',').next());

        tracing::debug!(path = %uploaded.name, size, "Uploaded object");
        Ok(self.download_url(&uploaded.name, token))
    }

    async fn delete(&self, path: &str) -> AdminResult<()> {
        let request = self.http_client.delete(self.object_url(path));
        let response = self
            .config
            .authorize(request)
            .send()
            .await
            .map_err(FirebaseError::from)?;

        if !response.status().is_success() {
            return Err(Self::fail(response).await.into());
        }
        Ok(())
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/", self.objects_url());
        let encoded = url.strip_prefix(&prefix)?;
        let encoded = encoded.split('?').next().unwrap_or(encoded);
        if encoded.is_empty() {
            return None;
        }
        urlencoding::decode(encoded).ok().map(|p| p.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> FirebaseStorage {
        FirebaseStorage::new(FirebaseConfig::new("ride-app", "key"))
    }

    #[test]
    fn test_download_url() {
        assert_eq!(
            storage().download_url("news-media/a b.png", Some("tok")),
            "https://firebasestorage.googleapis.com/v0/b/ride-app.appspot.com/o/news-media%2Fa%20b.png?alt=media&token=tok"
        );
    }

    #[test]
    fn test_path_from_url() {
        let s = storage();
        let url = s.download_url("news-media/1-clip.mp4", Some("tok"));
        assert_eq!(s.path_from_url(&url).as_deref(), Some("news-media/1-clip.mp4"));
        assert_eq!(s.path_from_url("https://youtube.com/watch?v=1"), None);
        assert_eq!(
            s.path_from_url("https://firebasestorage.googleapis.com/v0/b/ride-app.appspot.com/o/?alt=media"),
            None
        );
    }

    #[test]
    fn test_other_bucket_is_not_ours() {
        let s = storage();
        let url = "https://firebasestorage.googleapis.com/v0/b/other.appspot.com/o/x.png?alt=media";
        assert_eq!(s.path_from_url(url), None);
    }
}
