use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use barsight::{
    serve, BackendKind, Commands, Container, ContainerConfig, Router, DEFAULT_BASE_URL,
    DEFAULT_MAX_BARS, DEFAULT_MODEL, DEFAULT_PROGRAM,
};

#[derive(Parser)]
#[command(name = "barsight")]
#[command(author, version, about = "Chart and price-action analysis on a local Ollama model", long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// How to reach Ollama: its HTTP API or the `ollama` program
    #[arg(long, global = true, value_enum, default_value = "http")]
    backend: BackendKind,

    #[arg(long, global = true, env = "OLLAMA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    ollama_url: String,

    #[arg(short, long, global = true, env = "OLLAMA_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, global = true, env = "OLLAMA_BIN", default_value = DEFAULT_PROGRAM)]
    ollama_bin: String,

    /// Most recent bars rendered into the analysis prompt
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_BARS)]
    max_bars: usize,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn container_config(&self) -> ContainerConfig {
        ContainerConfig {
            backend: self.backend,
            ollama_url: self.ollama_url.clone(),
            model: self.model.clone(),
            ollama_bin: self.ollama_bin.clone(),
            max_bars: self.max_bars,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    // RUST_LOG, when set, takes precedence over --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let container = Container::new(cli.container_config());

    if let Commands::Serve { port, public } = cli.command {
        let host = if public { "0.0.0.0" } else { "127.0.0.1" };
        let handle = serve(Arc::new(container), &format!("{host}:{port}")).await?;
        return handle.wait_for_ctrl_c().await;
    }

    let output = Router::new(&container).route(cli.command).await?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}
