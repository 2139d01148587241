use clap::Parser;
use std::path::PathBuf;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherbot", version, about = "Telegram weather bot")]
pub struct Cli {
    /// Path to the TOML config file (defaults to the platform config dir).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite request log (overrides config and environment).
    #[arg(long)]
    pub db: Option<PathBuf>,
}
