//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use inbox_core::MAX_TEXT_LEN;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// `MAX_TEXT_LEN` in the integer type length validation takes
const TEXT_MAX_CHARS: u64 = MAX_TEXT_LEN as u64;

/// Send a direct message
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 128, message = "receiver_id must be 1-128 characters"))]
    pub receiver_id: String,

    #[validate(length(min = 1, max = TEXT_MAX_CHARS, message = "text must be 1-4000 characters"))]
    pub text: String,
}

impl SendMessageRequest {
    pub fn new(receiver_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            receiver_id: receiver_id.into(),
            text: text.into(),
        }
    }
}
