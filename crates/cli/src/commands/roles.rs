//! Roles command handler.

use clap::Args;
use ragchat_chat::ROLE_PRESETS;
use ragchat_core::{AppError, AppResult};

/// List the predefined system roles
#[derive(Args, Debug)]
pub struct RolesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RolesCommand {
    pub fn execute(&self) -> AppResult<()> {
        if self.json {
            let json = serde_json::to_string_pretty(ROLE_PRESETS)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            print_presets();
        }
        Ok(())
    }
}

/// Print presets as `key  label` lines, shared with the chat `/roles` command.
pub fn print_presets() {
    for preset in ROLE_PRESETS {
        println!("{:<12} {}", preset.key, preset.label);
    }
}
