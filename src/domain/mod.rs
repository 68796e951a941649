//! # Domain Layer
//!
//! Request-scoped models, the prompt builder, and the error taxonomy.
//! This layer is independent of HTTP, process and runtime concerns.

pub mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
