//! # inbox-gateway
//!
//! Real-time delivery for direct messages. Each authenticated user may hold
//! any number of server-sent event streams; every message send and read
//! receipt is fanned out to the affected users' open streams.

pub mod broadcast;
pub mod connection;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;

pub use server::{assemble_state, create_app, create_gateway_state, run, serve, GatewayState};
