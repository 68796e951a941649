//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Backend clients (Ollama HTTP API, `ollama` CLI subprocess, in-process mock)
//! - HTTP API (axum router, controllers, dependency container)

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;
