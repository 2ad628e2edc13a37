use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use review_leads::export::{to_csv, to_json};
use review_leads::scrapers::types::DEFAULT_BASE_URL;
use review_leads::{
    BusinessRecord, BusinessSummary, ListingResult, ListingSource, ScraperConfig, TrustpilotScraper,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "review-leads")]
#[command(about = "Find businesses on Trustpilot and enrich them for outreach")]
struct Cli {
    /// Origin of the reviews site
    #[arg(long, env = "REVIEW_LEADS_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "REVIEW_LEADS_TIMEOUT_SECS", default_value_t = 30, global = true)]
    timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    format: OutputFormat,

    /// Write here instead of stdout
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List businesses in a category
    Category {
        slug: String,
        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Search businesses by name
    Search {
        query: String,
        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Enrich businesses read from a listing JSON file
    Enrich {
        #[arg(long, short)]
        input: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ListingArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Drop businesses rated below this
    #[arg(long, default_value_t = 0.0)]
    min_rating: f64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

/// `enrich` accepts either a saved listing or a bare array of businesses.
#[derive(Deserialize)]
#[serde(untagged)]
enum EnrichInput {
    Listing(ListingResult),
    Businesses(Vec<BusinessSummary>),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ScraperConfig {
        timeout_secs: cli.timeout_secs,
        ..ScraperConfig::default()
    }
    .with_base_url(&cli.base_url);
    let scraper = TrustpilotScraper::new(config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current request");
            on_signal.cancel();
        }
    });

    match cli.command {
        Commands::Category { slug, listing } => {
            let source = ListingSource::category(slug);
            let result = run_listing(&scraper, &source, &listing, &cancel).await?;
            write_listing(&result, cli.format, cli.output.as_deref()).await
        }
        Commands::Search { query, listing } => {
            let query = query.trim();
            if query.is_empty() {
                bail!("Search query must not be empty");
            }
            let source = ListingSource::search(query);
            let result = run_listing(&scraper, &source, &listing, &cancel).await?;
            write_listing(&result, cli.format, cli.output.as_deref()).await
        }
        Commands::Enrich { input } => {
            let businesses = read_businesses(&input).await?;
            let records = run_enrichment(&scraper, &businesses, &cancel).await?;
            let text = render(&records, cli.format)?;
            write_output(&text, cli.output.as_deref()).await
        }
    }
}

async fn run_listing(
    scraper: &TrustpilotScraper,
    source: &ListingSource,
    args: &ListingArgs,
    cancel: &CancellationToken,
) -> Result<ListingResult> {
    let mut result = scraper
        .fetch_listing(source, args.page.max(1), cancel)
        .await
        .with_context(|| format!("Failed to fetch listing for {}", source.label()))?;

    result.retain_min_rating(args.min_rating);

    info!(
        "🏢 {} businesses on page {} of {}",
        result.items.len(),
        result.page_number,
        result.source_label
    );
    if result.has_more_pages.is_likely() {
        info!("More pages are likely, try --page {}", result.page_number + 1);
    }
    Ok(result)
}

async fn run_enrichment(
    scraper: &TrustpilotScraper,
    businesses: &[BusinessSummary],
    cancel: &CancellationToken,
) -> Result<Vec<BusinessRecord>> {
    let batch_size = scraper.config().max_batch.max(1);
    let mut records = Vec::with_capacity(businesses.len());

    info!("Enriching {} businesses in batches of {}", businesses.len(), batch_size);

    for chunk in businesses.chunks(batch_size) {
        if cancel.is_cancelled() {
            records.extend(chunk.iter().cloned().map(BusinessRecord::Listed));
            continue;
        }

        let outcome = scraper.enrich_batch(chunk, cancel).await?;
        for error in &outcome.errors {
            warn!("Could not enrich {}: {}", error.domain, error.error);
        }

        let mut results = outcome.results.into_iter();
        for business in chunk {
            match results.next().flatten() {
                Some(enriched) => records.push(BusinessRecord::Enriched(enriched)),
                None => records.push(BusinessRecord::Listed(business.clone())),
            }
        }
    }

    let enriched = records
        .iter()
        .filter(|r| matches!(r, BusinessRecord::Enriched(_)))
        .count();
    info!("✅ Enriched {} of {} businesses", enriched, businesses.len());
    Ok(records)
}

async fn read_businesses(path: &Path) -> Result<Vec<BusinessSummary>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let input: EnrichInput = serde_json::from_str(&raw)
        .with_context(|| format!("{} is neither a listing nor a list of businesses", path.display()))?;

    Ok(match input {
        EnrichInput::Listing(listing) => listing.items,
        EnrichInput::Businesses(items) => items,
    })
}

async fn write_listing(
    result: &ListingResult,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
        OutputFormat::Csv => {
            let records: Vec<_> = result.items.iter().cloned().map(BusinessRecord::Listed).collect();
            to_csv(&records)?
        }
    };
    write_output(&text, output).await
}

fn render(records: &[BusinessRecord], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(records),
        OutputFormat::Csv => to_csv(records),
    }
}

async fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(path, text)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("💾 Saved output to {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
