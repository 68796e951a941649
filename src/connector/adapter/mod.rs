mod mock_backend;
mod ollama_cli_client;
mod ollama_http_client;

pub use mock_backend::*;
pub use ollama_cli_client::*;
pub use ollama_http_client::*;
