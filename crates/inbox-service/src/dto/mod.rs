//! Data transfer objects for API requests and responses
//!
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs
//!
//! Messages and conversations go over the wire in their domain form, the
//! same shape the stream events carry.

pub mod requests;
pub mod responses;

pub use requests::SendMessageRequest;
pub use responses::{HealthResponse, MarkReadResponse};
