//! Service context - dependency container for services
//!
//! Holds the repositories and the event publisher the services need.

use std::sync::Arc;

use inbox_core::traits::{EventPublisher, MessageRepository, NoopPublisher, UserRepository};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// Cloning is cheap; every field is shared.
#[derive(Clone)]
pub struct ServiceContext {
    message_repo: Arc<dyn MessageRepository>,
    user_repo: Arc<dyn UserRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl ServiceContext {
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        user_repo: Arc<dyn UserRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            message_repo,
            user_repo,
            publisher,
        }
    }

    // === Repositories ===

    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    // === Outbound events ===

    /// Pushes events to users' open streams
    pub fn publisher(&self) -> &dyn EventPublisher {
        self.publisher.as_ref()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("publisher", &"dyn EventPublisher")
            .finish()
    }
}

/// Builder for creating ServiceContext
///
/// Repositories are required. Without a publisher, events are dropped.
#[derive(Default)]
pub struct ServiceContextBuilder {
    message_repo: Option<Arc<dyn MessageRepository>>,
    user_repo: Option<Arc<dyn UserRepository>>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Internal` if a repository is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.message_repo
                .ok_or_else(|| ServiceError::internal("message_repo is required"))?,
            self.user_repo
                .ok_or_else(|| ServiceError::internal("user_repo is required"))?,
            self.publisher.unwrap_or_else(|| Arc::new(NoopPublisher)),
        ))
    }
}
