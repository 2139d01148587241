//! Binary crate for the Telegram weather bot.
//!
//! This crate focuses on:
//! - Startup wiring (config, request log, provider)
//! - The Telegram transport (long polling, reply keyboards)

use std::sync::Arc;

use clap::Parser;
use weatherbot_core::{Config, Dialogue, OpenWeatherProvider, RequestLog};

mod bot;
mod cli;
mod telegram;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Cli::parse();
    let config = Config::load(args.config.as_deref(), args.db)?;

    let log = RequestLog::open(&config.db_path).await?;
    let provider = Arc::new(OpenWeatherProvider::new(config.openweather_api_key.clone())?);
    let dialogue = Arc::new(Dialogue::new(provider, log));
    let api = telegram::TelegramApi::new(config.telegram_token.clone())?;

    tracing::info!(db = %config.db_path.display(), "Starting weather bot");
    bot::run(api, dialogue).await
}
