//! Test fixtures

use inbox_common::{
    AppConfig, AppSettings, CorsConfig, Environment, JwtConfig, ServerConfig, StoreBackend,
    StreamConfig,
};
use inbox_core::{UserId, UserProfile};
use serde::Serialize;

pub const JWT_SECRET: &str = "integration-test-secret";

/// Seeded profiles: a1 Alice, b1 Bob, c1 Carol
pub fn users() -> Vec<UserProfile> {
    vec![
        UserProfile::new(UserId::new("a1"), "Alice"),
        UserProfile::new(UserId::new("b1"), "Bob"),
        UserProfile::new(UserId::new("c1"), "Carol"),
    ]
}

/// Memory-backed configuration bound to an ephemeral port
pub fn test_config() -> AppConfig {
    AppConfig {
        app: AppSettings {
            name: "inbox-integration".to_string(),
            env: Environment::Development,
        },
        gateway: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        store: StoreBackend::Memory,
        database: None,
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            access_token_expiry: 900,
        },
        stream: StreamConfig::default(),
        cors: CorsConfig::default(),
    }
}

/// Body of `POST /api/v1/messages`
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub receiver_id: &'a str,
    pub text: &'a str,
}
