//! CLI entry point for SpeedTestBot.
//!
//! Reads the day's speed-test log, posts the averages to Twitter (optionally
//! calling out the ISP when download speed is poor), then removes the log.

mod infra;
mod services;

use crate::infra::twitter::client::{DEFAULT_API_URL, TwitterClient};
use crate::services::publisher::Publisher;
use anyhow::{Context, Result};
use clap::Parser;
use speedtest_bot::{
    announce::{Announcement, DEFAULT_SLOW_THRESHOLD_PC, IspConfig},
    output::{Summary, print_json, print_pretty},
    stats::ResultSet,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser, Debug)]
#[command(name = "speedtest_bot")]
#[command(about = "Posts average broadband speeds from a speed-test log", long_about = None)]
struct Config {
    /// Semicolon-delimited log of `latency;download;upload` rows
    #[arg(long, env = "RESULTS_FILE", default_value = "./daily_results.csv")]
    results_file: PathBuf,

    /// Print the post instead of publishing it, and keep the results file
    #[arg(long, env = "DRY_RUN", value_parser = clap::builder::BoolishValueParser::new())]
    dry_run: bool,

    /// Also print the summary as JSON
    #[arg(long)]
    json: bool,

    /// OAuth 2.0 user access token for the posting account
    #[arg(long, env = "TWITTER_ACCESS_TOKEN", hide_env_values = true)]
    twitter_access_token: Option<String>,

    /// Base URL of the Twitter API
    #[arg(long, env = "TWITTER_API_URL", default_value = DEFAULT_API_URL)]
    twitter_api_url: String,

    /// ISP account to mention when download speed is below par
    #[arg(long, env = "ISP_TWITTER_ACC")]
    isp_twitter_account: Option<String>,

    /// Download speed the ISP advertises, in Mbit/s
    #[arg(long, env = "ISP_STATED_DL_SPEED")]
    isp_stated_download_speed: Option<f64>,

    /// Percentage below the advertised speed that counts as slow
    #[arg(long, env = "ISP_SLOW_DL_THRESHOLD_PC", default_value_t = DEFAULT_SLOW_THRESHOLD_PC)]
    isp_slow_threshold_pc: f64,
}

impl Config {
    fn isp(&self) -> IspConfig {
        IspConfig {
            twitter_account: self.isp_twitter_account.clone(),
            advertised_download_speed: self.isp_stated_download_speed,
            slow_threshold_percentage: self.isp_slow_threshold_pc,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/speedtest_bot.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("speedtest_bot.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", LevelFilter::INFO));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let config = Config::parse();

    if let Err(e) = run(&config).await {
        error!(error = %e, "SpeedTestBot failed");
        return Err(e);
    }

    Ok(())
}

fn env_filter(var: &str, default: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .with_env_var(var)
        .from_env_lossy()
}

/// Loads the results file, publishes the summary and removes the file.
///
/// The file is kept when it cannot be read or in dry-run mode. Once it has
/// been read it is removed even if publishing fails.
#[tracing::instrument(skip(config), fields(results_file = %config.results_file.display(), dry_run = config.dry_run))]
async fn run(config: &Config) -> Result<()> {
    if !config.results_file.is_file() {
        anyhow::bail!("Cannot find file {}", config.results_file.display());
    }

    let results = ResultSet::from_source(&config.results_file)?;
    let outcome = publish_results(config, &results).await;

    if config.dry_run {
        info!("Dry run, keeping results file");
    } else {
        info!("Removing results file");
        std::fs::remove_file(&config.results_file).with_context(|| {
            format!("Failed to remove {}", config.results_file.display())
        })?;
    }

    outcome
}

async fn publish_results(config: &Config, results: &ResultSet) -> Result<()> {
    let summary = Summary::from_results(results);
    print_pretty(&summary);
    if config.json {
        print_json(&summary)?;
    }

    if !results.is_valid() {
        warn!("No valid results, nothing to post");
        return Ok(());
    }

    let isp = config.isp();
    let announcement = Announcement::compose(&isp, results);
    info!(kind = announcement.kind(), "Announcement composed");

    if config.dry_run {
        println!("<tweet>\n{announcement}\n</tweet>");
        println!("Created using {}", announcement.kind());
        println!("ISP config: {isp:?}");
        return Ok(());
    }

    if !announcement.is_postable() {
        anyhow::bail!("Announcement is too long to post: {announcement}");
    }

    let token = config
        .twitter_access_token
        .as_deref()
        .context("TWITTER_ACCESS_TOKEN must be set unless running with --dry-run")?;
    let client = TwitterClient::connect(token, &config.twitter_api_url).await?;

    let status = client.publish(&announcement.to_string()).await?;
    info!(id = %status.id, author = %status.author, text = %status.text, "Posted tweet");

    Ok(())
}
