mod cli;
mod context;
mod handlers;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use context::CliContext;
use output::OutputFormat;
use taskboard_core::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Ok(log_path) = std::env::var("TASKBOARD_DEBUG_LOG") {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .init();
    }

    let cli = Cli::parse();
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    if let Err(e) = run(cli).await {
        output::output_error(format, &e.to_string());
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load();
    let mut ctx = CliContext::open(&cli, &config).await?;

    match cli.command {
        Commands::Show => {
            let board = ctx.session.snapshot().await;
            output::output_success(ctx.format, &board)?;
        }
        Commands::List(list_cmd) => {
            handlers::list::handle(&mut ctx, list_cmd.action).await?;
        }
        Commands::Card(card_cmd) => {
            handlers::card::handle(&mut ctx, card_cmd.action).await?;
        }
    }

    ctx.session.shutdown().await?;
    Ok(())
}
