//! User-facing entry points into the agent: HTTP gateway and terminal REPL.

pub mod repl;
pub mod web;

pub use repl::ReplChannel;
pub use web::{GatewayState, start_server};
