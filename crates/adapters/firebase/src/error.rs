//! Error type for Firebase REST calls.

use ride_admin_core::AdminError;

/// Errors from the Firebase REST APIs.
#[derive(Debug, thiserror::Error)]
pub enum FirebaseError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Firestore returned {status}: {message}")]
    Firestore { status: u16, message: String },
    #[error("Storage returned {status}: {message}")]
    Storage { status: u16, message: String },
    #[error("Identity lookup returned {status}: {message}")]
    Identity { status: u16, message: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FirebaseError {
    fn from(err: reqwest::Error) -> Self {
        FirebaseError::Http(err.to_string())
    }
}

impl From<FirebaseError> for AdminError {
    fn from(err: FirebaseError) -> Self {
        match err {
            FirebaseError::Storage { .. } => AdminError::storage(err.to_string()),
            FirebaseError::Identity { status, .. } if (400..500).contains(&status) => {
                AdminError::InvalidToken
            }
            _ => AdminError::store(err.to_string()),
        }
    }
}

/// Extracts `error.message` from a Google API error body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
