use anyhow::Result;

use crate::config::AppConfig;
use crate::controller::AssumeYes;
use crate::process::ProcessAction;

use super::common::{list_controller, print_snapshot, report, StdinConfirm};

/// Runs a lifecycle action. Destructive actions prompt unless `yes` is set.
pub(crate) async fn run(
    config: &AppConfig,
    id: u64,
    action: ProcessAction,
    yes: bool,
) -> Result<()> {
    let mut controller = list_controller(config);
    let done = if yes {
        controller.perform(id, action, &mut AssumeYes).await
    } else {
        controller.perform(id, action, &mut StdinConfirm).await
    };

    report(&mut controller)?;
    if !done {
        anyhow::bail!("aborted");
    }
    if controller.has_loaded() {
        print_snapshot(&controller);
    }

    Ok(())
}
