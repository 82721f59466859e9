//! Gateway state
//!
//! Shared dependencies handed to every request handler.

use crate::broadcast::EventDispatcher;
use crate::connection::ConnectionRegistry;
use inbox_common::{AppConfig, JwtService};
use inbox_service::ServiceContext;
use std::sync::Arc;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    service_context: Arc<ServiceContext>,
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<EventDispatcher>,
    jwt_service: Arc<JwtService>,
    config: Arc<AppConfig>,
}

impl GatewayState {
    pub fn new(
        service_context: ServiceContext,
        dispatcher: Arc<EventDispatcher>,
        jwt_service: JwtService,
        config: AppConfig,
    ) -> Self {
        Self {
            service_context: Arc::new(service_context),
            registry: dispatcher.registry().clone(),
            dispatcher,
            jwt_service: Arc::new(jwt_service),
            config: Arc::new(config),
        }
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Open streams of every user
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("config", &"AppConfig")
            .finish()
    }
}
