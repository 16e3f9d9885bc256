//! Subname indexer command line
//!
//! Follows the registry event log into a read model and answers queries against it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use subname_indexer::config::IndexerConfig;
use subname_indexer::model::NodeId;
use subname_indexer::projector::Projector;
use subname_indexer::query::{NameFilter, Page, QueryApi, SortOrder};
use subname_indexer::source::JsonLinesSource;
use subname_indexer::store::{MemoryStore, ReadModelStore};
use subname_indexer::telemetry::init_tracing;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "subname-indexer")]
#[command(about = "Projects subname ledger events into a queryable read model", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Event log to read, overrides the config file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Snapshot file, overrides the config file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the event log until interrupted
    Run {
        /// Stop once the log is drained instead of polling for more
        #[arg(long)]
        once: bool,
    },
    /// Look up one name by node hash
    Name {
        /// Node as hex, with or without 0x
        node: String,
    },
    /// List names
    Names(NamesArgs),
    /// Resolver records of a node
    Records {
        node: String,
    },
}

#[derive(Args)]
struct NamesArgs {
    /// Only names held by this address
    #[arg(long, conflicts_with = "label")]
    owner: Option<String>,

    /// Only labels containing this fragment
    #[arg(long)]
    label: Option<String>,

    /// Include expired and revoked names
    #[arg(long)]
    all: bool,

    /// Newest first
    #[arg(long)]
    desc: bool,

    #[arg(long, default_value_t = 0)]
    offset: usize,

    #[arg(long, default_value_t = 10)]
    limit: usize,
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?
        .as_secs())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_node(node: &str) -> Result<NodeId> {
    NodeId::parse(node).map_err(|e| anyhow!("invalid node {:?}: {}", node, e))
}

async fn open_store(config: &IndexerConfig) -> Result<MemoryStore> {
    match &config.snapshot_path {
        Some(path) => MemoryStore::open(path)
            .await
            .with_context(|| format!("opening snapshot {}", path.display())),
        None => Ok(MemoryStore::new()),
    }
}

async fn run(config: IndexerConfig, once: bool) -> Result<()> {
    let store: Arc<dyn ReadModelStore> = Arc::new(open_store(&config).await?);
    let source = Arc::new(JsonLinesSource::new(&config.events_path));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => warn!(error = %e, "Could not listen for ctrl-c, stopping"),
        }
        let _ = shutdown_tx.send(true);
    });

    info!(
        events = %config.events_path.display(),
        snapshot = ?config.snapshot_path,
        root_name = %config.projector.root_name,
        "Starting indexer"
    );
    let projector = Projector::new(store, source, config.projector.clone(), shutdown_rx);
    let stats = if once {
        projector.catch_up().await?
    } else {
        projector.run().await?
    };
    print_json(&stats)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => IndexerConfig::load(path)?,
        None => IndexerConfig::default(),
    };
    if let Some(events) = cli.events {
        config.events_path = events;
    }
    if let Some(snapshot) = cli.snapshot {
        config.snapshot_path = Some(snapshot);
    }
    config.validate()?;
    init_tracing(&config.log_filter).map_err(|e| anyhow!("initializing logging: {}", e))?;

    match cli.command {
        Commands::Run { once } => run(config, once).await,
        Commands::Name { node } => {
            let node = parse_node(&node)?;
            let api = QueryApi::new(Arc::new(open_store(&config).await?));
            match api.by_node(&node, NameFilter::all_at(unix_now()?)).await? {
                Some(view) => print_json(&view),
                None => Err(anyhow!("no name for node {}", node)),
            }
        }
        Commands::Names(args) => {
            let api = QueryApi::new(Arc::new(open_store(&config).await?));
            let filter = NameFilter {
                active_only: !args.all,
                now: unix_now()?,
                order: if args.desc {
                    SortOrder::Descending
                } else {
                    SortOrder::Ascending
                },
            };
            let page = Page::new(args.offset, args.limit);
            let result = match (&args.owner, &args.label) {
                (Some(owner), _) => api.by_owner(owner, filter, page).await?,
                (None, Some(label)) => api.by_label(label, filter, page).await?,
                (None, None) => api.names(filter, page).await?,
            };
            print_json(&result)
        }
        Commands::Records { node } => {
            let node = parse_node(&node)?;
            let api = QueryApi::new(Arc::new(open_store(&config).await?));
            print_json(&api.records(&node).await?.unwrap_or_default())
        }
    }
}
