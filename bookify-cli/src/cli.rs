//! Command-line arguments and environment overrides.

use anyhow::{anyhow, Context, Result};
use bookify_api::{BookId, ClientConfig};
use bookify_readiness::PollConfig;
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Wait for BookifyAI book PDFs to finish rendering
///
/// Polls the readiness endpoint of each book until its PDF is available,
/// the attempt ceiling is reached, or the server rejects the request.
#[derive(Parser, Debug)]
#[command(name = "bookify-wait")]
#[command(about = "Wait for BookifyAI book PDFs to become ready")]
#[command(version)]
pub struct Args {
    /// Ids of the books to wait for
    #[arg(required = true, value_name = "BOOK_ID")]
    pub book_ids: Vec<BookId>,

    /// Root of the book API
    #[arg(long, default_value = ClientConfig::DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Bearer token; read from BOOKIFY_AUTH_TOKEN on every request when omitted
    #[arg(long)]
    pub token: Option<String>,

    /// Milliseconds between status requests
    #[arg(short = 'p', long, default_value = "1000")]
    pub period_ms: u64,

    /// Give up after this many status requests
    #[arg(short = 'm', long, default_value = "120")]
    pub max_attempts: u32,

    /// Poll until ready, ignoring --max-attempts
    #[arg(long)]
    pub no_limit: bool,

    /// Save each ready PDF into this directory
    #[arg(short = 'o', long)]
    pub download_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Apply `BOOKIFY_*` overrides using `lookup` to read variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BOOKIFY_API_URL") {
            self.api_url = url;
        }

        if let Some(period) = lookup("BOOKIFY_POLL_PERIOD_MS") {
            self.period_ms = period
                .trim()
                .parse()
                .context("Invalid BOOKIFY_POLL_PERIOD_MS environment variable")?;
        }

        if let Some(max) = lookup("BOOKIFY_MAX_ATTEMPTS") {
            self.max_attempts = max
                .trim()
                .parse()
                .context("Invalid BOOKIFY_MAX_ATTEMPTS environment variable")?;
        }

        if let Some(level) = lookup("BOOKIFY_LOG_LEVEL") {
            self.log_level = level;
        }

        Ok(())
    }

    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        if self.book_ids.is_empty() {
            return Err(anyhow!("At least one book id is required"));
        }

        if self.period_ms == 0 {
            return Err(anyhow!("Poll period must be positive"));
        }

        if self.max_attempts == 0 && !self.no_limit {
            return Err(anyhow!("Max attempts must be at least 1"));
        }

        match self.log_level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(anyhow!(
                    "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
                    self.log_level
                ));
            }
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments and environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub book_ids: Vec<BookId>,
    pub client: ClientConfig,
    pub token: Option<String>,
    pub poll: PollConfig,
    pub download_dir: Option<PathBuf>,
    pub log_level: String,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let mut poll = PollConfig::new().with_period(Duration::from_millis(args.period_ms));
        poll = if args.no_limit {
            poll.uncapped()
        } else {
            poll.with_max_attempts(args.max_attempts)
        };

        // Duplicate ids would restart each other's session
        let mut seen = HashSet::new();
        let mut book_ids = args.book_ids;
        book_ids.retain(|id| seen.insert(*id));

        Self {
            book_ids,
            client: ClientConfig::new(args.api_url),
            token: args.token,
            poll,
            download_dir: args.download_dir,
            log_level: args.log_level.to_lowercase(),
        }
    }
}

impl Config {
    /// Create configuration from command line arguments and environment variables
    pub fn from_env() -> Result<Self> {
        let mut args = Args::parse();
        args.apply_env_overrides(|name| std::env::var(name).ok())?;
        args.validate()?;

        Ok(Config::from(args))
    }

    pub fn print_summary(&self) {
        info!("Configuration:");
        info!("  API: {}", self.client.base_url);
        info!("  Books: {}", self.book_ids.len());
        info!("  Period: {}ms", self.poll.period.as_millis());
        match self.poll.max_attempts {
            Some(max) => info!("  Max attempts: {}", max),
            None => info!("  Max attempts: unlimited"),
        }
        info!("  Credentials: {}", if self.token.is_some() { "flag" } else { "environment" });
        if let Some(dir) = &self.download_dir {
            info!("  Download directory: {}", dir.display());
        }
    }
}
