mod action;
mod common;
mod create;
mod info;
mod list;
mod logs;
mod rename;
mod ui;

use anyhow::Result;

use crate::cli::Commands;
use crate::config::AppConfig;
use crate::process::ProcessAction;

pub async fn run(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::List => list::run(config).await,
        Commands::Info { id } => info::run(config, id).await,
        Commands::Create {
            script,
            name,
            path,
            watch,
        } => {
            create::run(
                config,
                create::CreateArgs {
                    script,
                    name,
                    path,
                    watch,
                },
            )
            .await
        }
        Commands::Start { id } => action::run(config, id, ProcessAction::Start, false).await,
        Commands::Stop { id, yes } => action::run(config, id, ProcessAction::Stop, yes).await,
        Commands::Restart { id } => action::run(config, id, ProcessAction::Restart, false).await,
        Commands::Remove { id, yes } => action::run(config, id, ProcessAction::Remove, yes).await,
        Commands::Rename { id, name } => rename::run(config, id, name).await,
        Commands::Logs { id, stream, follow } => {
            logs::run(config, id, stream.into(), follow).await
        }
        Commands::Ui { interval_ms } => ui::run(config, interval_ms).await,
    }
}
