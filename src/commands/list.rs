use anyhow::Result;

use crate::config::AppConfig;

use super::common::{list_controller, print_snapshot, report};

pub(crate) async fn run(config: &AppConfig) -> Result<()> {
    let mut controller = list_controller(config);
    controller.refresh().await;
    report(&mut controller)?;
    print_snapshot(&controller);
    Ok(())
}
