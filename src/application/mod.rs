//! # Application Layer
//!
//! Use cases orchestrating the prompt builder and the backend client, plus the
//! interfaces connectors implement.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
