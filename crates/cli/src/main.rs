mod bootstrap;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelcast_core::{
    load_config, metrics, validate_config, AssetTag, Config, DedupCache, Distributor, MediaTool,
    SanitizedConfig,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "reelcast", version, about = "Catalog to channel to public feed, one asset per run")]
struct Cli {
    /// Configuration file
    #[arg(long, short, global = true, env = "REELCAST_CONFIG", default_value = "reelcast.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the pipeline once
    Run {
        /// Which part of the catalog to draw from
        #[arg(long, default_value = "free")]
        tier: AssetTag,
    },
    /// Check configuration and every collaborator without running
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn execute(cli: Cli) -> Result<ExitCode> {
    info!(version = VERSION, "reelcast starting");

    info!("Loading configuration from {:?}", cli.config);
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    info!(
        config = %serde_json::to_string(&sanitized).unwrap_or_default(),
        "Configuration loaded"
    );

    metrics::register_metrics();

    let code = match cli.command {
        Command::Run { tier } => run(&config, tier).await,
        Command::Check => check(&config).await,
    };

    if let Some(path) = &config.metrics.textfile_path {
        if let Err(e) = write_metrics(path).await {
            warn!(path = %path.display(), "Failed to write metrics textfile: {:#}", e);
        }
    }

    code
}

async fn run(config: &Config, tier: AssetTag) -> Result<ExitCode> {
    let adapters = bootstrap::Adapters::build(config).await?;

    adapters
        .distributor
        .validate()
        .await
        .context("Distribution channel session check failed")?;

    let orchestrator = adapters.into_orchestrator(config);
    let report = orchestrator.run(tier).await?;

    info!(
        report = %serde_json::to_string(&report).unwrap_or_default(),
        "Run report"
    );

    Ok(if report.status.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn check(config: &Config) -> Result<ExitCode> {
    let adapters = bootstrap::Adapters::build(config).await?;
    let mut healthy = true;

    if adapters.cache.is_connected() {
        info!(cache = adapters.cache.name(), "Cache reachable");
    } else {
        warn!(cache = adapters.cache.name(), "Cache unreachable, runs would proceed without dedup");
        healthy = false;
    }

    match adapters.distributor.validate().await {
        Ok(()) => info!(distributor = adapters.distributor.name(), "Distribution channel ready"),
        Err(e) => {
            error!(kind = %e.kind(), "Distribution channel check failed: {}", e);
            healthy = false;
        }
    }

    match adapters.media_tool.validate().await {
        Ok(()) => info!(tool = adapters.media_tool.name(), "Media tool available"),
        Err(e) => {
            error!(kind = %e.kind(), "Media tool check failed: {}", e);
            healthy = false;
        }
    }

    Ok(if healthy {
        info!("All checks passed");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Write the metrics registry next to `path`, then move it into place.
async fn write_metrics(path: &Path) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, metrics::gather_text())
        .await
        .with_context(|| format!("Failed to write {:?}", tmp))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move metrics into {:?}", path))?;
    Ok(())
}
