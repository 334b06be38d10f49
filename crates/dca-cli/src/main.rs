//! dca-advisor CLI
//!
//! Runs one daily analysis and prints the market overview followed by the
//! buy recommendation (or "no trade").

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dca_advisor::config::DEFAULT_CONFIG_PATH;
use dca_advisor::svckit::{render_outcome, render_overview};
use dca_advisor::{
    AdvisorConfig, AdvisorRun, CoinGeckoClient, DCAAdvisor, MockPriceSource, PriceSource,
};

/// Daily dollar-cost-averaging buy advisor
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration
    #[arg(long, env = "DCA_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print the run as JSON instead of the table
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Directory for the daily rotated log file
    #[arg(long, default_value = "./logs")]
    log_dir: PathBuf,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    verbose: String,

    /// Use synthetic prices instead of CoinGecko
    #[arg(long, default_value_t = false)]
    offline: bool,
}

/// Logs go to stderr and to `<log_dir>/dca-advisor.log`, rotated daily.
/// `RUST_LOG` wins over `--verbose` when set.
fn init_logging(log_dir: &Path, level: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "dca-advisor.log");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("invalid log level")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false),
        )
        .init();

    Ok(())
}

async fn run(cli: &Cli) -> anyhow::Result<AdvisorRun> {
    let config = AdvisorConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let source: Arc<dyn PriceSource> = if cli.offline {
        warn!("Offline mode: using synthetic price data");
        Arc::new(MockPriceSource::demo())
    } else {
        Arc::new(CoinGeckoClient::from_settings(&config.provider)?)
    };
    info!(source = source.name(), "Price source ready");

    let mut advisor = DCAAdvisor::new(config, source);
    let run = advisor
        .recommend()
        .await
        .context("could not compute a recommendation")?;

    for token in &run.unavailable {
        warn!(token, "No price data this run; token excluded");
    }
    Ok(run)
}

fn print_run(run: &AdvisorRun, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(run)?);
        return Ok(());
    }

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
    println!(
        "{}",
        render_overview(&run.summary, Some(run.outcome.portfolio()), &run.targets)
    );
    print!("{}", render_outcome(&run.outcome));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_dir, &cli.verbose)?;

    info!("Starting DCA advisor");

    tokio::select! {
        result = run(&cli) => {
            let run = result.inspect_err(|e| error!("{e:#}"))?;
            print_run(&run, cli.json)?;
            info!("Analysis complete");
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted");
            eprintln!("\nAborted by user, no recommendation made");
            Ok(())
        }
    }
}
