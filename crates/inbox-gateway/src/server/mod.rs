//! Gateway server setup
//!
//! Wires the store, registry, dispatcher and services together and runs the
//! HTTP listener with graceful shutdown.

mod state;

pub use state::GatewayState;

use crate::broadcast::EventDispatcher;
use crate::connection::ConnectionRegistry;
use crate::middleware::apply_middleware;
use crate::routes::create_router;
use axum::Router;
use inbox_common::{AppConfig, AppError, JwtService, StoreBackend};
use inbox_core::{MessageRepository, UserRepository};
use inbox_service::ServiceContextBuilder;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    let router = apply_middleware(create_router(), &state.config().cors, state.config().app.env.is_production());
    router.with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    let (message_repo, user_repo): (Arc<dyn MessageRepository>, Arc<dyn UserRepository>) =
        match config.store {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                let store = Arc::new(inbox_db::MemoryStore::new());
                (store.clone() as Arc<dyn MessageRepository>, store as Arc<dyn UserRepository>)
            }
            StoreBackend::Postgres => {
                let db_config = config
                    .database
                    .as_ref()
                    .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres store".to_string()))?;

                tracing::info!("Connecting to PostgreSQL...");
                let pool = inbox_db::create_pool(db_config)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                inbox_db::apply_schema(&pool)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                tracing::info!("PostgreSQL connection established");

                (
                    Arc::new(inbox_db::PgMessageRepository::new(pool.clone())) as Arc<dyn MessageRepository>,
                    Arc::new(inbox_db::PgUserRepository::new(pool)) as Arc<dyn UserRepository>,
                )
            }
        };

    assemble_state(config, message_repo, user_repo)
}

/// Build `GatewayState` over already constructed repositories
///
/// The dispatcher is the service layer's event publisher, so every mutation
/// pushes to the registry created here.
pub fn assemble_state(
    config: AppConfig,
    message_repo: Arc<dyn MessageRepository>,
    user_repo: Arc<dyn UserRepository>,
) -> Result<GatewayState, AppError> {
    let registry = ConnectionRegistry::new_shared();
    let dispatcher = Arc::new(EventDispatcher::new(registry));

    let service_context = ServiceContextBuilder::new()
        .message_repo(message_repo)
        .user_repo(user_repo)
        .publisher(dispatcher.clone())
        .build()
        .map_err(AppError::from)?;

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expiry);

    Ok(GatewayState::new(service_context, dispatcher, jwt_service, config))
}

/// Serve `state` on `listener` until `shutdown` resolves
///
/// Once shutdown begins every open stream is closed, so in-flight SSE
/// responses finish and the listener can drain.
pub async fn serve<F>(listener: TcpListener, state: GatewayState, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let registry = state.registry().clone();
    let app = create_app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let closed = registry.close_all();
            tracing::info!(closed, "Shutting down, open streams closed");
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.gateway.address();
    let state = create_gateway_state(config).await?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on http://{}/api/v1/stream", addr);

    serve(listener, state, shutdown_signal()).await
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{assemble_state, GatewayState};
    use inbox_common::{
        AppConfig, AppSettings, CorsConfig, Environment, JwtConfig, ServerConfig, StoreBackend,
        StreamConfig,
    };
    use inbox_core::{UserId, UserProfile};
    use inbox_db::MemoryStore;
    use std::sync::Arc;

    pub fn test_config() -> AppConfig {
        AppConfig {
            app: AppSettings {
                name: "inbox-test".to_string(),
                env: Environment::Development,
            },
            gateway: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            store: StoreBackend::Memory,
            database: None,
            jwt: JwtConfig {
                secret: "gateway-test-secret".to_string(),
                access_token_expiry: 900,
            },
            stream: StreamConfig::default(),
            cors: CorsConfig::default(),
        }
    }

    /// State over a memory store seeded with a1 (Alice) and b1 (Bob)
    pub fn app_state() -> GatewayState {
        let store = Arc::new(MemoryStore::with_users([
            UserProfile::new(UserId::new("a1"), "Alice"),
            UserProfile::new(UserId::new("b1"), "Bob"),
        ]));
        assemble_state(test_config(), store.clone(), store).unwrap()
    }

    pub fn bearer(state: &GatewayState, user: &str) -> String {
        state.jwt_service().issue_token(&UserId::new(user)).unwrap()
    }
}
