mod analysis_request;
mod generation;
mod health;
mod image;
mod price_bar;
mod prompt;

pub use analysis_request::*;
pub use generation::*;
pub use health::*;
pub use image::*;
pub use price_bar::*;
pub use prompt::*;
