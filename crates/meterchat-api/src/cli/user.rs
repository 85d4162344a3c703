//! User management CLI commands: create, show, grant.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Password;

use crate::state::ConcreteAuthService;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user without going through /register.
    Create {
        username: String,

        /// Starting balance (defaults to budget.default_balance).
        #[arg(long)]
        balance: Option<u64>,

        /// Password for scripts; prompts with confirmation when omitted.
        #[arg(long)]
        password: Option<String>,
    },

    /// Show a user's balance.
    Show { username: String },

    /// Add tokens to a user's balance.
    Grant { username: String, tokens: u64 },
}

/// Create a user with a hidden, confirmed password prompt.
///
/// # Examples
///
/// ```bash
/// mchat user create alice --balance 5000
/// ```
pub async fn create_user(
    auth: &ConcreteAuthService,
    username: &str,
    password: Option<String>,
    balance: u64,
    json: bool,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt(format!("Password for {}", style(username).bold()))
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };

    let user = auth.create_user(username, &password, balance).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!();
    println!("  {} User created", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Username:").bold(), style(&user.username).cyan());
    println!("  {}   {}", style("Balance:").bold(), user.token_balance);
    println!();

    Ok(())
}

pub async fn show_user(auth: &ConcreteAuthService, username: &str, json: bool) -> Result<()> {
    let Some(user) = auth.find_user(username).await? else {
        if json {
            println!("{}", serde_json::json!({"found": false, "username": username}));
        } else {
            println!(
                "  {} No user named '{}'",
                style("✗").red().bold(),
                style(username).bold()
            );
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Username").fg(Color::White),
        Cell::new("Balance").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    let balance_cell = if user.token_balance == 0 {
        Cell::new(user.token_balance).fg(Color::Red)
    } else {
        Cell::new(user.token_balance).fg(Color::Green)
    };

    table.add_row(vec![
        Cell::new(&user.username).fg(Color::Cyan),
        balance_cell,
        Cell::new(user.created_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
        Cell::new(user.updated_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
    ]);

    println!();
    println!("{table}");
    println!();

    Ok(())
}

pub async fn grant_tokens(
    auth: &ConcreteAuthService,
    username: &str,
    tokens: u64,
    json: bool,
) -> Result<()> {
    let balance = auth.grant(username, tokens).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"username": username, "granted": tokens, "balance": balance})
        );
    } else {
        println!(
            "  {} Granted {} tokens to '{}' (balance: {})",
            style("✓").green().bold(),
            tokens,
            style(username).bold(),
            style(balance).cyan()
        );
    }

    Ok(())
}
