//! Error handling module for the MDM console.
//!
//! Provides the client-side error taxonomy: field-scoped validation failures that never
//! reach the network, API rejections carrying the backend status, and transport failures
//! where no response was received.

use serde::Serialize;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const API_ERROR: &str = "API_ERROR";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const MISSING_SCOPE: &str = "MISSING_SCOPE";
    pub const UNKNOWN_ENTITY: &str = "UNKNOWN_ENTITY";
    pub const NOT_CONFIRMED: &str = "NOT_CONFIRMED";
    pub const IN_FLIGHT: &str = "IN_FLIGHT";
}

/// A single field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// All validation failures produced for one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First error message recorded for `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Client error type.
#[derive(Debug)]
pub enum ClientError {
    /// Form input rejected before any network call
    Validation(ValidationErrors),
    /// Backend answered with a non-2xx status
    Api { status: u16, message: String },
    /// No response was received
    Transport(String),
    /// A 2xx response body could not be decoded
    Decode(String),
    /// Token storage failure
    Storage(String),
    /// User-scoped resource addressed without a user id
    MissingScope(String),
    /// No descriptor registered under the requested key
    UnknownEntity(String),
    /// Destructive action submitted without explicit confirmation
    NotConfirmed,
    /// Another mutating submission for the same form is still pending
    InFlight,
}

impl ClientError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Validation(_) => codes::VALIDATION_ERROR,
            ClientError::Api { status: 401, .. } | ClientError::Api { status: 403, .. } => {
                codes::UNAUTHORIZED
            }
            ClientError::Api { status: 404, .. } => codes::NOT_FOUND,
            ClientError::Api { .. } => codes::API_ERROR,
            ClientError::Transport(_) => codes::TRANSPORT_ERROR,
            ClientError::Decode(_) => codes::DECODE_ERROR,
            ClientError::Storage(_) => codes::STORAGE_ERROR,
            ClientError::MissingScope(_) => codes::MISSING_SCOPE,
            ClientError::UnknownEntity(_) => codes::UNKNOWN_ENTITY,
            ClientError::NotConfirmed => codes::NOT_CONFIRMED,
            ClientError::InFlight => codes::IN_FLIGHT,
        }
    }

    /// Get the human-readable error message.
    pub fn message(&self) -> String {
        match self {
            ClientError::Validation(errors) => errors.to_string(),
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Transport(msg) => msg.clone(),
            ClientError::Decode(msg) => msg.clone(),
            ClientError::Storage(msg) => msg.clone(),
            ClientError::MissingScope(key) => {
                format!("Resource {} requires a user id", key)
            }
            ClientError::UnknownEntity(key) => format!("Unknown entity type {}", key),
            ClientError::NotConfirmed => "Deletion was not confirmed".to_string(),
            ClientError::InFlight => "A submission is already in progress".to_string(),
        }
    }

    /// HTTP status of an API rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the stored credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for ClientError {}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        ClientError::Validation(errors)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            tracing::error!("Response decode error: {:?}", err);
            return ClientError::Decode(format!("Response decode error: {}", err));
        }
        tracing::error!("Transport error: {:?}", err);
        ClientError::Transport(format!("Transport error: {}", err))
    }
}

impl From<sqlx::Error> for ClientError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Token store error: {:?}", err);
        ClientError::Storage(format!("Token store error: {}", err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        ClientError::Decode(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_codes() {
        let not_found = ClientError::Api {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(not_found.error_code(), codes::NOT_FOUND);
        assert!(!not_found.is_unauthorized());

        let forbidden = ClientError::Api {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert_eq!(forbidden.error_code(), codes::UNAUTHORIZED);
        assert!(forbidden.is_unauthorized());
    }

    #[test]
    fn test_validation_display() {
        let mut errors = ValidationErrors::default();
        errors.push("nombre", "Name is required");
        errors.push("codigo", "Code is required");

        assert_eq!(errors.errors.len(), 2);
        assert_eq!(errors.for_field("codigo"), Some("Code is required"));
        assert_eq!(
            ClientError::from(errors).message(),
            "nombre: Name is required; codigo: Code is required"
        );
    }
}
