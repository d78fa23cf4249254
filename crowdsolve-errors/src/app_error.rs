use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AppError {
    /// A required field was missing; raised before any request is sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Expired or invalid credential.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The service refused a mutation on an entity the caller does not own.
    #[error("not permitted: {0}")]
    Ownership(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success answer from the service.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("session storage failed: {0}")]
    Session(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps a non-success HTTP status onto the taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Auth(message),
            403 => Self::Ownership(message),
            404 => Self::NotFound(message),
            _ => Self::Rejected(message),
        }
    }

    pub fn validation(field: &str) -> Self {
        Self::Validation(format!("{field} is required"))
    }

    /// Text shown inline beside the failing form or control.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Validation(msg)
            | Self::Auth(msg)
            | Self::Ownership(msg)
            | Self::NotFound(msg)
            | Self::Rejected(msg)
            | Self::Network(msg) => msg,
            Self::Session(_) => "Your session could not be read. Please log in again.",
            Self::Config(_) => "The client is misconfigured.",
            Self::Internal(_) => "Something went wrong. Please try again.",
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from_status(401, "x"), AppError::Auth("x".into()));
        assert_eq!(
            AppError::from_status(403, "x"),
            AppError::Ownership("x".into())
        );
        assert_eq!(AppError::from_status(404, "x"), AppError::NotFound("x".into()));
        assert_eq!(AppError::from_status(500, "x"), AppError::Rejected("x".into()));
        assert_eq!(AppError::from_status(400, "x"), AppError::Rejected("x".into()));
    }

    #[test]
    fn test_user_message_keeps_service_text() {
        let err = AppError::from_status(403, "Not authorized to edit this problem");
        assert_eq!(err.user_message(), "Not authorized to edit this problem");

        let err = AppError::validation("title");
        assert_eq!(err.user_message(), "title is required");
    }

    #[test]
    fn test_internal_details_stay_hidden() {
        let err = AppError::Internal("mutex poisoned".into());
        assert!(!err.user_message().contains("mutex"));
        assert!(err.to_string().contains("mutex"));
    }
}
