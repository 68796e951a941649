use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway (/chat, /analyze, /health, /models, /models/pull)
    Serve {
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Bind to 0.0.0.0 instead of 127.0.0.1, exposing the server on all network interfaces
        #[arg(long)]
        public: bool,
    },

    /// Send a prompt straight to the model
    Chat {
        prompt: String,

        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// Ask for a price-action analysis
    Analyze {
        question: String,

        /// JSON file holding an array of bars ({"t","open","high","low","close","volume"})
        #[arg(long)]
        ohlc: Option<PathBuf>,

        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Print fragments as the model produces them
        #[arg(short, long)]
        stream: bool,
    },

    /// Check whether the backend is reachable
    Health,

    /// List the models the backend knows about
    Models,

    /// Download a model through the backend
    Pull {
        model_name: String,
    },
}
