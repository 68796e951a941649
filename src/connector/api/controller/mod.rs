pub mod analyze_controller;
pub mod chat_controller;
pub mod health_controller;
pub mod models_controller;

pub use analyze_controller::analyze;
pub use chat_controller::chat;
pub use health_controller::health;
pub use models_controller::{list_models, pull_model};
