//! Session extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ride_admin_core::AdminIdentity;

/// Raw `auth_token` cookie value, inserted by the guard middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(pub String);

/// Extractor for a verified admin.
///
/// Rejects with 401 unless the guard verified the cookie token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(session: AdminSession) -> String {
///     format!("Hello, {}!", session.identity.uid)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub identity: AdminIdentity,
    pub token: String,
}

/// Error returned when no verified admin is present.
#[derive(Debug)]
pub struct AdminSessionRejection {
    message: &'static str,
}

impl IntoResponse for AdminSessionRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
            "code": 401
        });
        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AdminSessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .extensions
            .get::<AuthToken>()
            .cloned()
            .ok_or(AdminSessionRejection {
                message: "Not signed in",
            })?;

        let identity = parts
            .extensions
            .get::<AdminIdentity>()
            .cloned()
            .ok_or(AdminSessionRejection {
                message: "Session could not be verified",
            })?;

        Ok(AdminSession {
            identity,
            token: token.0,
        })
    }
}
