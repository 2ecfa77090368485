use anyhow::{bail, Context, Result};
use bookify_api::{BookClient, BookDetail, BookId, EnvToken, StaticToken};
use bookify_readiness::logging::{self, LoggingMode};
use bookify_readiness::{Outcome, ReadinessOutcome, ReadinessPoller};
use futures::future::join_all;
use std::path::Path;
use tracing::{error, info, warn};

mod cli;

use cli::Config;

/// Initialize tracing with the configured log level, unless an embedding
/// process already installed a subscriber
fn init_tracing(log_level: &str) -> Result<()> {
    if logging::is_initialized() {
        return Ok(());
    }

    let mode = match log_level {
        "debug" | "trace" => LoggingMode::Debug,
        _ => LoggingMode::Development,
    };

    logging::init_logging_with_filter(mode, log_level).context("Failed to initialize logging")
}

fn build_client(config: &Config) -> Result<BookClient> {
    let client = BookClient::with_config(config.client.clone())
        .with_context(|| format!("Invalid API url '{}'", config.client.base_url))?;

    Ok(match &config.token {
        Some(token) => client.with_credentials(StaticToken::new(token.clone())),
        None => client.with_credentials(EnvToken::default()),
    })
}

/// Wait for one book. Books whose PDF already exists skip polling entirely.
///
/// Returns `None` if the session was cancelled.
async fn wait_for_book(
    client: &BookClient,
    poller: &ReadinessPoller,
    book_id: BookId,
) -> Result<Option<ReadinessOutcome>> {
    match client.book(book_id).await {
        Ok(book) => {
            spawn_view_counter(client.clone(), book_id);
            if book.has_pdf() {
                return Ok(Some(Outcome::Ready(book)));
            }
            info!(%book_id, "PDF is still being generated");
        }
        Err(e) if e.requires_sign_in() => return Ok(Some(Outcome::NeedsSignIn)),
        Err(e) if e.is_not_found() => return Ok(Some(Outcome::NotFound)),
        Err(e) => warn!(%book_id, error = %e, "Could not load book, polling anyway"),
    }

    let mut session = poller.start(book_id)?;
    Ok(session.outcome().await)
}

/// Bump the view counter without waiting for it.
fn spawn_view_counter(client: BookClient, book_id: BookId) {
    tokio::spawn(async move {
        if let Err(e) = client.record_view(book_id).await {
            warn!(%book_id, error = %e, "Failed to record view");
        }
    });
}

async fn save_pdf(client: &BookClient, book: &BookDetail, dir: &Path) -> Result<()> {
    let bytes = client
        .download_pdf(book.book_id)
        .await
        .with_context(|| format!("Failed to download PDF for book {}", book.book_id))?;

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(format!("book-{}.pdf", book.book_id));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("  saved {} ({} bytes)", path.display(), bytes.len());

    // The download counter is best effort
    if let Err(e) = client.record_download(book.book_id).await {
        warn!(book_id = %book.book_id, error = %e, "Failed to record download");
    }

    Ok(())
}

/// Print one notice per book and save ready PDFs. Returns how many books
/// are not available.
async fn report(
    client: &BookClient,
    download_dir: Option<&Path>,
    outcomes: Vec<(BookId, Result<Option<ReadinessOutcome>>)>,
) -> usize {
    let mut unavailable = 0;
    for (book_id, result) in outcomes {
        match result {
            Ok(Some(outcome)) => {
                println!("book {}: {}", book_id, outcome.notice());
                match outcome {
                    Outcome::Ready(book) => {
                        if let Some(dir) = download_dir {
                            if let Err(e) = save_pdf(client, &book, dir).await {
                                error!("{:#}", e);
                                unavailable += 1;
                            }
                        } else if let Ok(url) = client.pdf_url(book_id) {
                            println!("  {}", url);
                        }
                    }
                    _ => unavailable += 1,
                }
            }
            Ok(None) => {
                println!("book {}: cancelled", book_id);
                unavailable += 1;
            }
            Err(e) => {
                error!(%book_id, "{:#}", e);
                unavailable += 1;
            }
        }
    }
    unavailable
}

async fn run(config: Config) -> Result<()> {
    let client = build_client(&config)?;
    let poller = ReadinessPoller::new(client.clone(), config.poll)
        .context("Invalid polling configuration")?;

    let waits = join_all(
        config
            .book_ids
            .iter()
            .map(|&book_id| wait_for_book(&client, &poller, book_id)),
    );

    let results = tokio::select! {
        results = waits => results,
        _ = tokio::signal::ctrl_c() => {
            let cancelled = poller.cancel_all();
            warn!(cancelled, "Interrupted, cancelled polling sessions");
            bail!("Interrupted");
        }
    };

    let outcomes: Vec<_> = config.book_ids.iter().copied().zip(results).collect();
    let unavailable = report(&client, config.download_dir.as_deref(), outcomes).await;

    if unavailable > 0 {
        bail!(
            "{} of {} books are not available",
            unavailable,
            config.book_ids.len()
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to parse configuration")?;

    init_tracing(&config.log_level)?;
    config.print_summary();

    match run(config).await {
        Ok(()) => {
            info!("All books are ready");
        }
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
