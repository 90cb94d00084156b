//! `LeadLedger` - enquiry intake and follow-up automation service.
//!
//! Serves the enquiry form endpoint, the scheduled follow-up trigger and the
//! admin API, and offers the follow-up batch and statistics from the command
//! line for use with system cron.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use leadledger_core::{EnquiryRepository, EnquiryStore, FollowUpDispatcher, HttpMailer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use routes::AppState;

#[derive(Debug, Parser)]
#[command(name = "leadledger", version, about = "Enquiry intake and follow-up automation")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Address to bind, overriding the config file
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
    /// Run one follow-up batch
    FollowUp {
        /// List the enquiries that are due without sending anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Print enquiry statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref()).await?;

    match cli.command {
        Command::Serve { listen } => serve(&config, listen).await,
        Command::FollowUp { dry_run } => follow_up(&config, dry_run).await,
        Command::Stats => stats(&config).await,
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "leadledger=debug,leadledger_core=debug"
    } else {
        "leadledger=info,leadledger_core=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<EnquiryRepository>> {
    let path = config.database_path();
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    let db_path = path
        .to_str()
        .context("database path is not valid UTF-8")?;
    let repo = EnquiryRepository::new(db_path)
        .await
        .with_context(|| format!("opening database {db_path}"))?;

    info!("Using database {:?}", path);
    Ok(Arc::new(repo))
}

fn build_mailer(config: &Config) -> anyhow::Result<Arc<HttpMailer>> {
    if config.mail.api_key.is_empty() {
        warn!("No email API key configured; the email API will reject sends");
    }
    Ok(Arc::new(HttpMailer::new(config.mailer_config())?))
}

async fn serve(config: &Config, listen: Option<SocketAddr>) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let mailer = build_mailer(config)?;

    if config.cron_secret.is_none() {
        warn!("No cron secret configured; the follow-up trigger is open to anyone");
    }
    if config.admin_token.is_none() {
        info!("No admin token configured; admin routes are disabled");
    }

    let state = Arc::new(AppState::new(store, mailer, config));
    let app = routes::router(state);
    let addr = listen.unwrap_or(config.listen);

    info!(%addr, "Starting LeadLedger");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn follow_up(config: &Config, dry_run: bool) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let mailer = build_mailer(config)?;
    let dispatcher = FollowUpDispatcher::new(store, mailer, config.notification_settings())
        .with_settings(config.follow_up_settings());
    let now = Utc::now();

    if dry_run {
        let due = dispatcher.preview(now).await?;
        for enquiry in &due {
            println!(
                "{}\t{}\t{}\t{}",
                enquiry.id,
                enquiry.priority,
                enquiry.created_at.format("%Y-%m-%d %H:%M"),
                enquiry.email
            );
        }
        println!("{} enquiries due a follow-up", due.len());
        return Ok(());
    }

    let report = dispatcher.run(now).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn stats(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let stats = store.stats().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
