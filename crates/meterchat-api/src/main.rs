//! Metered chat relay entry point.
//!
//! Binary name: `mchat`
//!
//! Parses CLI arguments, loads `{data_dir}/config.toml`, opens the database,
//! then either serves the HTTP relay or runs an operator command.

mod cli;
mod http;
mod state;

use std::time::Duration;

use clap::Parser;
use clap_complete::generate;
use tracing::{error, info, warn};

use cli::{Cli, Commands};
use meterchat_core::llm::provider::CompletionProvider;
use meterchat_types::config::RelayConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let otel = matches!(cli.command, Commands::Serve { otel: true, .. });
    meterchat_observe::tracing_setup::init_tracing(cli.verbose, otel)?;

    // Shell completions don't need config or a database
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "mchat", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = meterchat_infra::config::resolve_data_dir()?;
    let mut config = meterchat_infra::config::load_relay_config(&data_dir).await;
    let db_pool = state::open_database(&data_dir).await?;

    match cli.command {
        Commands::Serve { port, host, .. } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            serve(db_pool, config).await?;
            meterchat_observe::tracing_setup::shutdown_tracing();
        }

        Commands::User { action } => {
            let auth = state::operator_auth_service(db_pool, &config);
            match action {
                cli::user::UserCommand::Create {
                    username,
                    balance,
                    password,
                } => {
                    let balance = balance.unwrap_or(config.budget.default_balance);
                    cli::user::create_user(&auth, &username, password, balance, cli.json).await?;
                }
                cli::user::UserCommand::Show { username } => {
                    cli::user::show_user(&auth, &username, cli.json).await?;
                }
                cli::user::UserCommand::Grant { username, tokens } => {
                    cli::user::grant_tokens(&auth, &username, tokens, cli.json).await?;
                }
            }
        }

        Commands::Sessions { action } => {
            let auth = state::operator_auth_service(db_pool, &config);
            match action {
                cli::sessions::SessionsCommand::Purge => {
                    cli::sessions::purge(&auth, cli.json).await?;
                }
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

async fn serve(
    db_pool: meterchat_infra::sqlite::pool::DatabasePool,
    config: RelayConfig,
) -> anyhow::Result<()> {
    let api_key = meterchat_infra::config::load_api_key(&config)?;
    let provider = meterchat_infra::llm::create_provider(&config.provider, api_key)?;
    info!(
        provider = %provider.name(),
        base_url = %config.provider.base_url,
        models = config.models.len(),
        "Completion provider ready"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let purge_every = Duration::from_secs(config.session.purge_interval_secs.max(1));
    let state = AppState::from_parts(db_pool, config, provider);

    let purger = tokio::spawn(purge_sessions_periodically(state.clone(), purge_every));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} meterchat relay listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purger.abort();
    println!("\n  Server stopped.");
    Ok(())
}

/// Sweep expired sessions on a fixed interval until the task is aborted.
async fn purge_sessions_periodically(state: AppState, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately; skip it so startup isn't a purge.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match state.auth_service.purge_expired_sessions().await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Purged expired sessions"),
            Err(e) => warn!(error = %e, "Session purge failed"),
        }
    }
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
