use anyhow::Result;

use crate::config::AppConfig;

use super::common::{list_controller, print_snapshot, report};

pub(crate) async fn run(config: &AppConfig, id: u64, name: String) -> Result<()> {
    let mut controller = list_controller(config);
    controller.rename(id, &name).await;
    report(&mut controller)?;
    if controller.has_loaded() {
        print_snapshot(&controller);
    }

    Ok(())
}
