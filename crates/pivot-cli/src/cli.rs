use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::PivotConfig;
use crate::error::Result;
use crate::logging::{self, LogFormat};
use crate::render::OutputFormat;
use crate::run::{run_generate, run_replay};

#[derive(Debug, Parser)]
#[command(
    name = "pivot",
    about = "Stream alternate-history pivot trees from a generator and lay them out",
    version
)]
pub struct Cli {
    /// TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter directive, e.g. `info` or `pivot_stream=debug`. `RUST_LOG` wins.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log line format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Request a tree from a live generator and render it.
    Generate(GenerateArgs),

    /// Drive a session from recorded server messages (one JSON object per line).
    Replay(ReplayArgs),
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Historical event to branch from.
    #[arg(long, short)]
    pub prompt: String,

    /// Tree depth requested from the generator.
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Generator websocket URL.
    #[arg(long)]
    pub url: Option<String>,

    /// Give up after this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// JSONL file of server messages.
    pub file: PathBuf,

    /// Prompt sent with the replayed request.
    #[arg(long, default_value = "replay")]
    pub prompt: String,

    /// Tree depth sent with the replayed request.
    #[arg(long)]
    pub max_depth: Option<u32>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, Copy, Default, Args)]
pub struct OutputArgs {
    /// Output format on stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Re-render after every layout pass that changed the model.
    #[arg(long)]
    pub watch: bool,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref(), cli.log_format)?;
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let config = PivotConfig::load(cli.config.as_deref())?;
    let stdout = std::io::stdout();
    match cli.command {
        Commands::Generate(args) => run_generate(&args, config, stdout.lock()),
        Commands::Replay(args) => run_replay(&args, &config, stdout.lock()),
    }
}
