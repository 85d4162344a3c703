//! Session maintenance CLI commands.

use anyhow::Result;
use clap::Subcommand;
use console::style;

use crate::state::ConcreteAuthService;

#[derive(Subcommand)]
pub enum SessionsCommand {
    /// Delete every expired session from the store.
    Purge,
}

pub async fn purge(auth: &ConcreteAuthService, json: bool) -> Result<()> {
    let removed = auth.purge_expired_sessions().await?;

    if json {
        println!("{}", serde_json::json!({"purged": removed}));
    } else {
        println!(
            "  {} Purged {} expired session{}",
            style("✓").green().bold(),
            style(removed).bold(),
            if removed == 1 { "" } else { "s" }
        );
    }

    Ok(())
}
