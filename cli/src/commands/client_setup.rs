//! `rebox client-setup`: workstation shortcuts only, no host access.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::client_setup;
use crate::domain::recipe;
use crate::infra::blocks::TextBlockInstaller;
use crate::output::TerminalReporter;

/// Install the SSH host entry and shell alias for the sandbox.
///
/// # Errors
///
/// Returns an error if the home directory is unknown or a file cannot be
/// backed up or written.
pub fn run(app: &AppContext) -> Result<()> {
    let loaded = app.load_config()?;
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    let blocks = recipe::client_blocks(&loaded.config, &home);

    app.output.header(&format!(
        "Configuring workstation access to '{}'",
        loaded.config.client.alias
    ));
    let results = {
        let reporter = TerminalReporter::new(&app.output);
        client_setup::run(&TextBlockInstaller::new(), &reporter, &blocks)?
    };
    app.renderer().render_client_setup(&results)
}
