//! `rebox status`

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::lifecycle;
use crate::infra::proxmox::PctHost;

/// Show resource status and, when running, its address.
///
/// # Errors
///
/// Returns an error if the config is invalid or `pct` cannot be invoked.
pub async fn run(app: &AppContext) -> Result<()> {
    let loaded = app.load_config()?;
    let host = PctHost::default_runner();
    let view = lifecycle::overview(&host, loaded.config.resource.id).await?;
    app.renderer()
        .render_status(&loaded.config.resource.hostname, &view)
}
