mod analyze_chart;
mod chat;
mod manage_models;
mod relay;

pub use analyze_chart::*;
pub use chat::*;
pub use manage_models::*;
pub use relay::*;
