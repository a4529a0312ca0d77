use anyhow::Result;

use crate::config::AppConfig;

use super::common::{list_controller, print_snapshot, report};

#[derive(Debug, Default)]
pub(crate) struct CreateArgs {
    pub script: String,
    pub name: Option<String>,
    pub path: Option<String>,
    pub watch: Option<String>,
}

pub(crate) async fn run(config: &AppConfig, args: CreateArgs) -> Result<()> {
    let mut controller = list_controller(config);
    controller.open_create_form();
    if let Some(form) = controller.create_form_mut() {
        form.script = args.script;
        form.name = args.name.unwrap_or_default();
        form.path = args.path.unwrap_or_default();
        form.watch = args.watch.unwrap_or_default();
    }

    controller.submit_create().await;
    report(&mut controller)?;
    if controller.has_loaded() {
        print_snapshot(&controller);
    }

    Ok(())
}
