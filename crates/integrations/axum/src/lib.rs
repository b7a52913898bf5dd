//! # Ride Admin Axum Integration
//!
//! This crate exposes the admin dashboard over HTTP:
//! - Route guard middleware
//! - Session extractors
//! - JSON routes for every dashboard view
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ride_admin_axum::{admin_routes, AppState, GuardLayer};
//!
//! let state = AppState::new(api, auth.clone());
//! let app = admin_routes(state).layer(GuardLayer::new().verify_with(auth));
//! ```

mod extractor;
mod layer;
mod routes;

pub use extractor::{AdminSession, AuthToken};
pub use layer::GuardLayer;
pub use routes::{admin_routes, AppState};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ride_admin_core::error::AdminError;

/// Wrapper for AdminError that implements IntoResponse.
///
/// The body carries the error's user-facing message, never the underlying
/// store error.
pub struct AdminErrorResponse(pub AdminError);

impl IntoResponse for AdminErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "error": self.0.user_message(),
            "code": self.0.status_code()
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<AdminError> for AdminErrorResponse {
    fn from(err: AdminError) -> Self {
        AdminErrorResponse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_are_masked() {
        let response = AdminErrorResponse(AdminError::store("permission denied on rides")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_user_errors_keep_status() {
        let response = AdminErrorResponse(AdminError::missing("headline")).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
