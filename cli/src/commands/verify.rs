//! `rebox verify`: the post-build checklist, on demand.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::context::ResourceContext;
use crate::application::services::{lifecycle, verification};
use crate::domain::{ResourceStatus, recipe};
use crate::infra::proxmox::PctHost;

/// Run every verification check against the running resource.
///
/// Failing checks are reported but do not change the exit code.
///
/// # Errors
///
/// Returns an error if the resource is not running or `pct` cannot be
/// invoked.
pub async fn run(app: &AppContext) -> Result<()> {
    let loaded = app.load_config()?;
    let config = &loaded.config;
    let id = config.resource.id;
    let host = PctHost::default_runner();

    let status = lifecycle::status(&host, id).await?;
    if status != ResourceStatus::Running {
        anyhow::bail!("resource {id} is {status}; run `rebox rebuild` or start it first");
    }

    app.output.header(&format!("Verifying sandbox {id}"));
    let report = verification::run(
        &recipe::verification_checks(config),
        &ResourceContext::new(&host, id),
    )
    .await;
    app.renderer().render_verification(&report)
}
