//! `rebox rebuild` (also the default command).

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::rebuild::Orchestrator;
use crate::infra::exec_context::HostContext;
use crate::infra::prompt::DialoguerPrompt;
use crate::infra::proxmox::PctHost;
use crate::output::TerminalReporter;

/// Run the rebuild workflow.
///
/// # Errors
///
/// Returns an error on invalid configuration or any fatal rebuild failure.
pub async fn run(app: &AppContext) -> Result<()> {
    let loaded = app.load_config()?;
    let config = &loaded.config;
    app.output.header(&format!(
        "Rebuilding sandbox {} ({})",
        config.resource.id, config.resource.hostname
    ));

    let host = PctHost::default_runner();
    let local = HostContext::default_runner();
    let outcome = {
        let reporter = TerminalReporter::new(&app.output);
        Orchestrator::new(&host, &local, &DialoguerPrompt, &reporter)
            .rebuild(config, &loaded.payload_dir, app.policy)
            .await?
    };
    app.renderer().render_rebuild(&outcome)
}
