//! Remote store error handling
//!
//! Typed errors for every operation that goes through the store handle.
//! None of these are fatal: the controller logs them and keeps its last
//! rendered state.

use thiserror::Error;

/// Errors that can occur talking to the remote store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection settings are missing or empty
    #[error("Supabase is not configured: set supabase_url and supabase_anon")]
    NotConfigured,

    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The REST API answered with an error status
    #[error("Supabase API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Realtime WebSocket failure
    #[error("Realtime connection error: {0}")]
    Realtime(String),

    /// Invalid URL built from configuration
    #[error("Invalid Supabase URL '{url}': {details}")]
    InvalidUrl { url: String, details: String },
}

impl StoreError {
    /// Check if trying the same call again later might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Http(_) | StoreError::Realtime(_) => true,
            StoreError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Get a hint for the user, if there is one
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::NotConfigured => Some(
                "Set the connection with:\n  tagup config set supabase_url https://<project>.supabase.co\n  tagup config set supabase_anon <anon key>",
            ),
            StoreError::Api { status: 401, .. } | StoreError::Api { status: 403, .. } => {
                Some("Check the anon key and the table's row level security policies.")
            }
            StoreError::Api { status: 404, .. } => {
                Some("Check that the table exists and is exposed through the REST API.")
            }
            StoreError::Http(_) => Some("Check your network connection and the Supabase URL."),
            _ => None,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for StoreError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        StoreError::Realtime(error.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = StoreError::Api {
            status: 400,
            message: "null value in column \"user_name\"".to_string(),
            code: Some("23502".to_string()),
        };

        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("user_name"));
    }

    #[test]
    fn test_retryable_classification() {
        let server = StoreError::Api {
            status: 503,
            message: "unavailable".to_string(),
            code: None,
        };
        let client = StoreError::Api {
            status: 400,
            message: "bad request".to_string(),
            code: None,
        };

        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!StoreError::NotConfigured.is_retryable());
        assert!(StoreError::Realtime("closed".to_string()).is_retryable());
    }

    #[test]
    fn test_recovery_suggestions() {
        assert!(StoreError::NotConfigured
            .recovery_suggestion()
            .unwrap()
            .contains("supabase_url"));

        let unauthorized = StoreError::Api {
            status: 401,
            message: "Invalid API key".to_string(),
            code: None,
        };
        assert!(unauthorized.recovery_suggestion().is_some());

        let decode = StoreError::Decode(serde_json::from_str::<u8>("x").unwrap_err());
        assert!(decode.recovery_suggestion().is_none());
    }
}
