//! Terminal implementation of the `OperatorPrompt` port.

use anyhow::{Context, Result};

use crate::application::ports::OperatorPrompt;

/// Asks on the controlling terminal via `dialoguer`. Defaults to "no".
pub struct DialoguerPrompt;

impl OperatorPrompt for DialoguerPrompt {
    fn confirm(&self, prompt: &str) -> Result<Option<bool>> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact_opt()
            .context("confirmation prompt failed")
    }
}
