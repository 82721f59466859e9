//! Errors raised by message rules and the stores behind them

use thiserror::Error;

use crate::value_objects::{IdParseError, MessageId};

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Message text is empty")]
    EmptyMessage,

    #[error("Message text too long: max {max} characters")]
    MessageTooLong { max: usize },

    #[error("Malformed identifier: {0}")]
    InvalidId(#[from] IdParseError),

    /// Persistence rejected a second message under an existing id
    #[error("Message id already stored: {0}")]
    DuplicateMessageId(MessageId),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl DomainError {
    /// Error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::MessageTooLong { .. } => "MESSAGE_TOO_LONG",
            Self::InvalidId(_) => "INVALID_ID",
            Self::DuplicateMessageId(_) => "DUPLICATE_MESSAGE_ID",
            Self::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    /// Caused by the request rather than the server
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyMessage | Self::MessageTooLong { .. } | Self::InvalidId(_)
        )
    }

    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::DuplicateMessageId(_) | Self::DatabaseError(_))
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> u16 {
        if self.is_validation() {
            400
        } else {
            500
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::EmptyMessage.code(), "EMPTY_MESSAGE");
        assert_eq!(DomainError::MessageTooLong { max: 10 }.code(), "MESSAGE_TOO_LONG");
        assert_eq!(DomainError::from(IdParseError::Empty).code(), "INVALID_ID");
    }

    #[test]
    fn test_classification() {
        assert!(DomainError::EmptyMessage.is_validation());
        assert_eq!(DomainError::EmptyMessage.status_code(), 400);

        let collision = DomainError::DuplicateMessageId(MessageId::new("m1"));
        assert!(collision.is_infrastructure());
        assert!(!collision.is_validation());
        assert_eq!(collision.status_code(), 500);
    }

    #[test]
    fn test_display() {
        let err = DomainError::MessageTooLong { max: 4000 };
        assert_eq!(err.to_string(), "Message text too long: max 4000 characters");
    }
}
