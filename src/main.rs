//! `vela`: resolve unit resources, extract Q&A pairs and fetch bucket assets
//! from the command line. Every command prints JSON (or raw bytes, for
//! `fetch`) to stdout; logs go to stderr.

use std::fmt::Debug;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use miette::{IntoDiagnostic, Result, miette};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use vela_cache::{ResourceCache, UnitKey};
use vela_config::Config;
use vela_extract::{PatternSet, QaResolver, extract_from_text};
use vela_library::{
    BucketModuleSource, DEFAULT_MODULE_PREFIX, ModuleRegistry, ModuleSourceHandle, PreloadEvent, Resolver,
};
use vela_storage::AssetClient;
use vela_storage::transport::HttpTransport;

#[derive(Debug, Parser)]
#[command(name = "vela", version, about)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(long, short, global = true, env = "VELA_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the teacher resources of a unit.
    Resolve { book: String, unit: String },
    /// Warm many units (`book1-unit2`) and print how many resources each has.
    Preload {
        #[arg(required = true)]
        keys: Vec<String>,
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
    },
    /// Derive question/answer pairs from filenames or a block of text.
    Qa(QaArgs),
    /// Download a bucket asset to stdout.
    Fetch { path: String },
}

#[derive(Debug, Args)]
struct QaArgs {
    /// Media filenames, e.g. `01 A What do you eat – bread.jpg`.
    #[arg(required_unless_present = "text", conflicts_with = "text")]
    filenames: Vec<String>,
    /// Unit the files belong to, enabling unit-specific patterns.
    #[arg(long)]
    unit: Option<String>,
    /// JSON pattern definitions consulted before the filename heuristics.
    #[arg(long)]
    patterns: Option<PathBuf>,
    /// Extract every pair from a text file instead.
    #[arg(long)]
    text: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).map_err(report)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level.as_ref())))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Resolve { book, unit } => {
            let key = UnitKey::new(book, unit).map_err(report)?;
            let resolver = resolver(&config).await?;
            let resources = resolver.resolve(&key).await;
            print_json(&resources[..])
        },
        Command::Preload { keys, concurrency } => {
            let keys = keys.iter().map(|key| key.parse::<UnitKey>()).collect::<Result<Vec<_>, _>>().map_err(report)?;
            let resolver = resolver(&config).await?;
            let events = resolver.preload_all(keys, concurrency);
            futures::pin_mut!(events);
            let mut resolved = Vec::new();
            while let Some(event) = events.next().await {
                tracing::debug!(?event, "Preload progress");
                if let PreloadEvent::Resolved { key, count } = event {
                    resolved.push(serde_json::json!({ "key": key, "count": count }));
                }
            }
            print_json(&resolved)
        },
        Command::Qa(args) => qa(args),
        Command::Fetch { path } => {
            let response = asset_client(&config)?.fetch(&path).await.map_err(report)?;
            std::io::stdout().write_all(&response.body).into_diagnostic()
        },
    }
}

fn qa(args: QaArgs) -> Result<()> {
    if let Some(path) = args.text {
        let text = std::fs::read_to_string(&path).into_diagnostic()?;
        return print_json(&extract_from_text(&text));
    }
    let patterns = match args.patterns {
        Some(path) => PatternSet::from_json(&std::fs::read_to_string(&path).into_diagnostic()?).map_err(report)?,
        None => PatternSet::new(),
    };
    let resolver = QaResolver::with_patterns(patterns);
    let pairs: Vec<_> =
        args.filenames.iter().filter_map(|filename| resolver.resolve(filename, args.unit.as_deref())).collect();
    print_json(&pairs)
}

fn asset_client(config: &Config) -> Result<AssetClient> {
    let transport = HttpTransport::new().map_err(report)?;
    let location = config.storage.location().map_err(report)?;
    Ok(AssetClient::new(Arc::new(transport), location, config.retry_policy()))
}

/// Modules come from `resources.data_dir` when configured, otherwise from
/// the bucket.
async fn resolver(config: &Config) -> Result<Resolver> {
    let source: ModuleSourceHandle = match &config.resources.data_dir {
        Some(dir) => {
            let mut registry = ModuleRegistry::new();
            registry.load_dir(dir).await.map_err(report)?;
            Arc::new(registry)
        },
        None => {
            let prefix = config.resources.bucket_prefix.as_deref().unwrap_or(DEFAULT_MODULE_PREFIX);
            Arc::new(BucketModuleSource::with_prefix(asset_client(config)?, prefix))
        },
    };
    Ok(Resolver::new(source, Arc::new(ResourceCache::new())))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn report(error: impl Debug) -> miette::Report {
    miette!("{error:?}")
}
