//! # inbox-service
//!
//! Application layer: sending and reading direct messages, conversation
//! aggregation, and the DTOs the HTTP layer exchanges.

pub mod dto;
pub mod services;

pub use dto::{HealthResponse, MarkReadResponse, SendMessageRequest};
pub use services::{
    ConversationService, MessageService, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult,
};
