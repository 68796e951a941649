pub mod container;
pub mod controller;
pub mod error;
pub mod form;
pub mod router;
pub mod server;

pub use container::{BackendKind, Container, ContainerConfig};
pub use error::ApiError;
pub use form::FormFields;
pub use router::Router;
pub use server::{app, serve, ServeHandle, MAX_BODY_BYTES};
