//! HTTP gateway over the agent pipeline and wallet service.

pub mod auth;
pub mod server;
pub mod types;

pub use server::{GatewayState, RateLimiter, start_server};
