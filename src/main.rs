//! Ripple-Pipeline main entry point
//!
//! Command-line interface: crawl seeds, run pages through the configured
//! stage pipeline and report what happened.

use anyhow::{bail, Context};
use clap::Parser;
use ripple_pipeline::config::{load_config_with_hash, Config};
use ripple_pipeline::crawler::extract_fields;
use ripple_pipeline::output::{print_statistics, CrawlStatistics, JsonLinesWriter};
use ripple_pipeline::render::select_for_render;
use ripple_pipeline::stages::{build_registry, builtin_catalog, pipeline_order};
use ripple_pipeline::{Crawler, FetchSummary, PageRecord, Payload, StageRegistry};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Ripple-Pipeline: a polite crawler feeding a pluggable record pipeline
///
/// Pages are discovered breadth-first from each seed, turned into records
/// and passed through the stages declared in the configuration file.
#[derive(Parser, Debug)]
#[command(name = "ripple-pipeline")]
#[command(version)]
#[command(about = "A polite crawler feeding a pluggable record pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed URL to crawl (repeatable, overrides `seeds` in the config)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the stage plan without crawling
    #[arg(long)]
    dry_run: bool,

    /// Write enriched records as JSON lines to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// List pages that would be handed to a renderer
    #[arg(long, conflicts_with = "dry_run")]
    render_check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    tracing::info!("Loaded configuration from {:?}", cli.config);
    tracing::debug!("Config hash: {}", config_hash);

    let seeds = if cli.seeds.is_empty() {
        config.seeds.clone()
    } else {
        cli.seeds.clone()
    };

    if cli.dry_run {
        handle_dry_run(&config, &config_hash, &seeds);
        return Ok(());
    }

    if seeds.is_empty() {
        bail!("no seed URLs: pass --seed or set `seeds` in the config");
    }

    handle_crawl(&cli, &config, &seeds).await
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_pipeline=info,warn"),
            1 => EnvFilter::new("ripple_pipeline=debug,info"),
            2 => EnvFilter::new("ripple_pipeline=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Print the resolved configuration and stage plan
fn handle_dry_run(config: &Config, config_hash: &str, seeds: &[String]) {
    println!("=== Configuration Validation ===\n");
    println!("Config hash: {}\n", config_hash);

    println!("Seeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }
    println!();

    let crawler = &config.crawler;
    println!("Crawler:");
    println!("  Max depth: {}", crawler.max_depth);
    println!("  Max pages: {}", crawler.max_pages);
    println!("  Delay: {}s", crawler.delay);
    println!("  Timeout: {}s", crawler.timeout);
    println!("  User agent: {}", crawler.user_agent);
    println!("  Follow external links: {}", crawler.follow_external_links);
    if !crawler.allowed_domains.is_empty() {
        println!("  Allowed domains: {}", crawler.allowed_domains.join(", "));
    }
    println!("  Respect robots.txt: {}", crawler.respect_robots);
    println!();

    println!("Render:");
    println!("  Concurrency: {}", config.render.concurrency);
    println!("  Timeout: {}ms", config.render.timeout_ms);
    println!();

    let catalog = builtin_catalog();
    println!("Stages ({}):", config.stages.len());
    for entry in &config.stages {
        let resolved = match catalog.resolve(&entry.locator, &entry.type_name) {
            Ok(_) => "✓".to_string(),
            Err(e) => format!("✗ {}", e),
        };
        let state = if entry.enabled.unwrap_or(true) {
            "enabled"
        } else {
            "disabled"
        };
        println!(
            "  {} {} ({}:{}, {})",
            resolved, entry.name, entry.locator, entry.type_name, state
        );
    }
    println!();

    println!("Pipeline order:");
    for (i, name) in pipeline_order(config).iter().enumerate() {
        println!("  {}. {}", i + 1, name);
    }
    println!();

    println!("✓ Configuration is valid");
    println!("\nRun without --dry-run to start crawling.");
}

/// Crawl every seed and push each page through the pipeline
async fn handle_crawl(cli: &Cli, config: &Config, seeds: &[String]) -> anyhow::Result<()> {
    let mut registry = build_registry(config).context("loading pipeline stages")?;
    let order = pipeline_order(config);
    tracing::info!("Pipeline: {}", order.join(" -> "));

    let result = run_seeds(cli, config, seeds, &mut registry, &order).await;

    if !cli.quiet {
        println!("=== Stage Info ===\n");
        for (name, info) in registry.info_all() {
            let options = serde_json::to_string(&info.config).unwrap_or_default();
            println!("  {} (enabled: {}) {}", name, info.enabled, options);
        }
        println!();
    }

    registry.cleanup_all();
    result
}

async fn run_seeds(
    cli: &Cli,
    config: &Config,
    seeds: &[String],
    registry: &mut StageRegistry,
    order: &[String],
) -> anyhow::Result<()> {
    let mut crawler = Crawler::from_config(config.crawler.clone())?;

    let mut writer = match &cli.output {
        Some(path) => Some(
            JsonLinesWriter::create(path)
                .with_context(|| format!("creating {}", path.display()))?,
        ),
        None => None,
    };

    let mut failures = 0usize;
    let mut pages: Vec<PageRecord> = Vec::new();

    for seed in seeds {
        tracing::info!("Crawling seed {}", seed);
        let records = crawler.crawl(seed).await?;

        for record in &records {
            let fields = extract_fields(&record.content);
            let payload = Payload::Record(record.with_scraped(&fields));

            match registry.execute_pipeline_in_place(order, payload) {
                Ok(enriched) => {
                    if let Some(writer) = writer.as_mut() {
                        writer.write_payload(&enriched)?;
                    }
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!("Pipeline failed for {}: {}", record.url, e);
                }
            }
        }

        if !cli.quiet {
            let stats =
                CrawlStatistics::from_crawl(seed, &records, crawler.stats(), crawler.skipped());
            print_statistics(&stats);
        }

        if cli.render_check {
            pages.extend(records);
        }
    }

    if let Some(writer) = writer {
        let written = writer.written();
        writer.finish()?;
        tracing::info!("Wrote {} records", written);
    }

    if failures > 0 {
        tracing::warn!("{} records failed in the pipeline", failures);
    }

    if cli.render_check {
        report_render_candidates(&pages);
    }

    Ok(())
}

fn report_render_candidates(pages: &[PageRecord]) {
    let summaries = pages.iter().map(|page| {
        (
            page.url.clone(),
            FetchSummary::from_parts(&page.content, &page.headers),
        )
    });
    let selected = select_for_render(summaries);

    println!("=== Render Check ===\n");
    if selected.is_empty() {
        println!("  No pages need rendering");
    } else {
        for url in &selected {
            println!("  - {}", url);
        }
    }
    println!(
        "\n{} of {} pages would be dispatched to a renderer",
        selected.len(),
        pages.len()
    );
}
