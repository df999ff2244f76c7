//! Beacon CLI binary
//!
//! Command-line interface over a locally persisted attention engine.

use clap::{Parser, Subcommand};
use cli::{AddRequest, Client, EngineOptions, FocusAction};
use schema::{AttentionFilter, PriorityTier};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "beacon")]
#[command(about = "Inspect and manage the Beacon attention engine")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// State file (`.json` for the JSON store, otherwise SQLite)
    #[arg(long, env = "BEACON_STATE_FILE", value_name = "PATH")]
    state: Option<PathBuf>,

    /// Engine configuration (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Show desktop notifications for delivered items
    #[arg(long)]
    notify: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an attention item
    Add {
        /// Producing module id (planner, messages, ...)
        #[arg(long)]
        module: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        summary: Option<String>,
        /// Call-to-action label
        #[arg(long)]
        action: Option<String>,
        /// Producer-supplied item id
        #[arg(long)]
        id: Option<String>,
        /// Due date (RFC 3339, YYYY-MM-DD or epoch millis)
        #[arg(long)]
        due: Option<String>,
        /// Producer priority hint, e.g. "urgent"
        #[arg(long)]
        priority: Option<String>,
        /// Extra metadata as KEY=VALUE (repeatable)
        #[arg(long, value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },
    /// List undismissed bundles, newest first
    List {
        #[arg(long)]
        module: Option<String>,
        #[arg(long)]
        tier: Option<PriorityTier>,
        /// Hide bundles suppressed by focus mode
        #[arg(long)]
        focus: bool,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show counts per priority tier
    Counts {
        /// Include items suppressed by focus mode
        #[arg(long)]
        all: bool,
    },
    /// Show the header badge
    Badge,
    /// Dismiss a bundle or an item
    Dismiss { id: String },
    /// Manage focus mode
    Focus {
        #[command(subcommand)]
        cmd: FocusCmd,
    },
}

#[derive(Subcommand)]
enum FocusCmd {
    /// Enable focus mode
    On {
        /// Modules allowed through (replaces the current list when given)
        modules: Vec<String>,
        /// Do not let urgent items bypass the allow-list
        #[arg(long)]
        block_urgent: bool,
    },
    /// Disable focus mode
    Off,
    /// Add a module to the allow-list
    Allow { module: String },
    /// Remove a module from the allow-list
    Deny { module: String },
    /// Show focus mode settings
    Status,
}

impl From<FocusCmd> for FocusAction {
    fn from(cmd: FocusCmd) -> Self {
        match cmd {
            FocusCmd::On {
                modules,
                block_urgent,
            } => Self::On {
                modules,
                block_urgent,
            },
            FocusCmd::Off => Self::Off,
            FocusCmd::Allow { module } => Self::Allow(module),
            FocusCmd::Deny { module } => Self::Deny(module),
            FocusCmd::Status => Self::Status,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    beacon_core::utils::init_tracing(&cli.log_level)?;

    if let Err(e) = run(cli).await {
        error!("Command failed: {}", e);
        eprintln!("Error [{}]: {}", e.code(), e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> cli::Result<()> {
    let options = EngineOptions {
        state: cli.state,
        config: cli.config,
        notify: cli.notify,
    };
    let client = Client::new(cli::open_engine(&options).await?, cli.json);

    let output = match cli.command {
        Commands::Add {
            module,
            title,
            summary,
            action,
            id,
            due,
            priority,
            meta,
        } => {
            client
                .add(AddRequest {
                    module,
                    title,
                    summary,
                    action,
                    id,
                    due,
                    priority,
                    meta,
                })
                .await?
        }
        Commands::List {
            module,
            tier,
            focus,
            limit,
        } => client.list(&AttentionFilter {
            module,
            priority: tier,
            respect_focus: focus,
            limit,
        })?,
        Commands::Counts { all } => client.counts(all)?,
        Commands::Badge => client.badge()?,
        Commands::Dismiss { id } => client.dismiss(&id).await?,
        Commands::Focus { cmd } => client.focus(cmd.into()).await?,
    };

    println!("{output}");
    Ok(())
}
