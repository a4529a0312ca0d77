use anyhow::{bail, Context, Result};
use chrono::Utc;

use crate::api::{ApiClient, Supervisor};
use crate::config::AppConfig;
use crate::view::ProcessRow;

pub(crate) async fn run(config: &AppConfig, id: u64) -> Result<()> {
    let api = ApiClient::from_config(config);
    let process = match api.process_info(id).await {
        Ok(process) => process,
        Err(err) if err.status() == Some(404) => bail!("Process {id} not found"),
        Err(err) => return Err(err).with_context(|| format!("Failed to load process {id}")),
    };
    let row = ProcessRow::from_summary(&process, Utc::now());

    println!("ID:       {}", row.id);
    println!("Name:     {}", row.name);
    println!("Script:   {}", row.script);
    println!("Status:   {}", row.status.label());
    println!("PID:      {}", row.pid);
    if let Some(started) = process.started {
        println!("Started:  {}", started.to_rfc3339());
    }
    println!("Uptime:   {}", row.uptime);
    println!("CPU:      {}", row.cpu);
    println!("Memory:   {}", row.memory);
    println!("Restarts: {}", row.restarts);

    Ok(())
}
