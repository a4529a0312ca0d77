mod api;
mod cli;
mod commands;
mod config;
mod controller;
mod errors;
mod format;
mod process;
mod router;
mod ticker;
mod toast;
mod ui;
mod view;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    if let Some(url) = cli.url.as_deref() {
        config = config.with_page_url(url)?;
    }
    if let Some(token) = cli.token {
        config = config.with_token(token);
    }

    commands::run(cli.command, &config).await
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
