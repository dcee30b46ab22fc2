mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::ticket::{self, TicketCommandArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::firestore::FirestoreClient;
use crate::infra::slack::SlackClient;

#[derive(Parser)]
#[command(
    name = "fixify-notify",
    author,
    version,
    about = "Slack notifications for new FIXIFY tickets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a ticket-created event and notify Slack when it qualifies.
    TicketCreated(TicketArgs),
    /// Inspect the notifier configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct TicketArgs {
    /// Ticket document id. Defaults to the id found in the snapshot.
    #[arg(short, long)]
    ticket_id: Option<String>,
    /// Path to the ticket snapshot JSON. Reads stdin when omitted.
    #[arg(short, long)]
    snapshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!(error = %error, "fixify-notify failed");
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    init_tracing(config.log_json);

    match cli.command {
        Commands::Config(args) => config_cmd::run(&config, args.command),
        Commands::TicketCreated(args) => run_ticket_created(config, args).await,
    }
}

async fn run_ticket_created(config: AppConfig, args: TicketArgs) -> AppResult<()> {
    if config.slack_bot_token.is_none() {
        tracing::warn!("SLACK_BOT_TOKEN not configured; notifications will fail");
    }

    let store = Arc::new(FirestoreClient::new(&config.firestore, config.http_timeout)?);
    let messaging = Arc::new(SlackClient::new(config.http_timeout)?);
    let context = AppContext::new(config, store, messaging);

    ticket::run(
        &context,
        TicketCommandArgs {
            ticket_id: args.ticket_id,
            snapshot: args.snapshot,
        },
    )
    .await
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false);

    if json {
        builder
            .json()
            .flatten_event(true)
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
            .with_current_span(true)
            .with_span_list(false)
            .init();
    } else {
        builder.init();
    }
}
