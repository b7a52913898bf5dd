//! ID token verification through the Identity Toolkit API.

use crate::error::error_message;
use crate::{FirebaseConfig, FirebaseError};
use async_trait::async_trait;
use reqwest::Client;
use ride_admin_core::error::{AdminError, AdminResult};
use ride_admin_core::traits::AuthProvider;
use ride_admin_core::AdminIdentity;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
}

/// Identity provider backed by `accounts:lookup`.
#[derive(Debug, Clone)]
pub struct IdentityToolkit {
    config: FirebaseConfig,
    http_client: Client,
}

impl IdentityToolkit {
    pub fn new(config: FirebaseConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }

    fn lookup_url(&self) -> String {
        format!("{}/accounts:lookup", self.config.identity_url)
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkit {
    async fn verify_token(&self, token: &str) -> AdminResult<AdminIdentity> {
        if token.is_empty() {
            return Err(AdminError::InvalidToken);
        }

        let request = self
            .http_client
            .post(self.lookup_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&json!({ "idToken": token }));
        let response = request.send().await.map_err(FirebaseError::from)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let err = FirebaseError::Identity {
                status,
                message: error_message(&body),
            };
            tracing::warn!(error = %err, "ID token rejected");
            return Err(err.into());
        }

        let lookup: LookupResponse = response.json().await.map_err(FirebaseError::from)?;
        let user = lookup
            .users
            .into_iter()
            .next()
            .ok_or(AdminError::InvalidToken)?;

        let identity = AdminIdentity::new(user.local_id);
        Ok(match user.email {
            Some(email) => identity.with_email(email),
            None => identity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_url() {
        let auth = IdentityToolkit::new(FirebaseConfig::new("p", "k"));
        assert_eq!(
            auth.lookup_url(),
            "https://identitytoolkit.googleapis.com/v1/accounts:lookup"
        );
    }

    #[test]
    fn test_lookup_response() {
        let body = r#"{"kind":"identitytoolkit#GetAccountInfoResponse","users":[{"localId":"abc","email":"ops@example.com","emailVerified":true}]}"#;
        let lookup: LookupResponse = serde_json::from_str(body).unwrap();
        assert_eq!(lookup.users[0].local_id, "abc");
        assert_eq!(lookup.users[0].email.as_deref(), Some("ops@example.com"));
    }

    #[tokio::test]
    async fn test_empty_token_rejected_without_request() {
        let auth = IdentityToolkit::new(FirebaseConfig::new("p", "k"));
        assert!(matches!(auth.verify_token("").await, Err(AdminError::InvalidToken)));
    }
}
