//! `MailWatch` - mailbox alert monitor
//!
//! Watches one folder of a JSON spool mailbox, classifies messages into alert
//! tiers and mails the admins once per snooze window.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod spool;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailwatch_core::{Attribute, DeliveryMode, Monitor, Searcher, SearcherRegistry, stop_channel};

use config::FileConfig;
use spool::SpoolMailbox;

#[derive(Parser)]
#[command(name = "mailwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true, env = "MAILWATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the configured folder and raise alerts.
    Watch {
        /// Log alerts instead of sending them (still snoozes).
        #[arg(long)]
        dry_run: bool,

        /// Show alerts for review instead of sending them.
        #[arg(long, conflicts_with = "dry_run")]
        display: bool,

        /// Run a single cycle and exit.
        #[arg(long)]
        once: bool,
    },

    /// Search the configured folder.
    Search {
        /// Attribute to search (subject, sender, to, body or a retained field).
        #[arg(short, long, default_value = "subject")]
        by: String,

        /// Term to look for.
        term: String,

        /// Match the term anywhere in the value.
        #[arg(short, long)]
        partial: bool,

        /// Do not match `FW:`/`FWD:` prefixed subjects.
        #[arg(long)]
        no_forward: bool,

        /// Do not match `RE:` prefixed subjects.
        #[arg(long)]
        no_reply: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailwatch=info,mailwatch_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let mut file = FileConfig::load(&config_path)?;
    info!(config = %config_path.display(), "loaded configuration");

    match cli.command {
        Commands::Watch {
            dry_run,
            display,
            once,
        } => {
            if dry_run {
                file.delivery = DeliveryMode::DryRun;
            } else if display {
                file.delivery = DeliveryMode::Display;
            }
            cmd_watch(&file, once).await
        }
        Commands::Search {
            by,
            term,
            partial,
            no_forward,
            no_reply,
        } => cmd_search(&file, &by, term, partial, !no_forward, !no_reply).await,
    }
}

/// Watch command.
async fn cmd_watch(file: &FileConfig, once: bool) -> Result<()> {
    let config = file.monitor_config()?;
    if let Some(dir) = config.snooze_path().parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating snooze directory {}", dir.display()))?;
    }

    let provider = SpoolMailbox::new(&file.spool, &file.outbox);
    info!(spool = %provider.spool().display(), "using spool mailbox");
    let mut monitor =
        Monitor::new(provider, config, file.classifier()?).with_normalizer(file.normalizer());

    if once {
        let report = monitor.check_for_alerts().await?;
        info!(
            fetched = report.fetched,
            classified = report.classified,
            suppressed = report.suppressed,
            tier = ?report.active_tier,
            snoozed = report.snoozed,
            "single cycle finished"
        );
        return Ok(());
    }

    let (handle, signal) = stop_channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for interrupt");
            return;
        }
        info!("interrupt received, stopping");
        handle.stop();
    });

    monitor.run(signal).await?;
    Ok(())
}

/// Search command.
async fn cmd_search(
    file: &FileConfig,
    by: &str,
    term: String,
    partial: bool,
    forward: bool,
    reply: bool,
) -> Result<()> {
    let normalizer = file.normalizer();
    let registry = normalizer
        .fields()
        .retained
        .iter()
        .fold(SearcherRegistry::standard(), |registry, field| {
            registry.register(field, Attribute::Field(field.clone()))
        });
    let query = registry
        .query_for(by, term)?
        .partial(partial)
        .forward_prefix(forward)
        .reply_prefix(reply);

    let provider = SpoolMailbox::new(&file.spool, &file.outbox);
    let found = Searcher::new(&provider)
        .with_normalizer(normalizer)
        .in_folder(file.folder_selector())
        .find(&query)
        .await?;

    for message in &found {
        println!("{}\t{}\t{}", message.id(), message.sender(), message.subject());
    }
    info!(count = found.len(), "search finished");
    Ok(())
}
