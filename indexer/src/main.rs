use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docindex::source::{dedup_locations, load_records_from};
use docindex::{checked_limit, Category, Index, IndexBuilder, IndexConfig, IndexStats, SearchOptions, TokenizerConfig, DEFAULT_LIMIT};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a documentation search index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and run a single query against it
    Search {
        #[command(flatten)]
        index: IndexArgs,
        /// Query string
        #[arg(long, short)]
        query: String,
        /// Maximum number of results
        #[arg(long, short = 'k', default_value_t = DEFAULT_LIMIT as i64, allow_negative_numbers = true)]
        limit: i64,
        /// Only return records of this category
        #[arg(long)]
        category: Option<Category>,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Build the index and print its statistics
    Stats {
        #[command(flatten)]
        index: IndexArgs,
        /// Print statistics as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args)]
struct IndexArgs {
    /// Input path: a search index file (JSON, JSON Lines, or a Documenter .js) or a directory of them
    #[arg(long)]
    input: PathBuf,
    /// Weight of a title token occurrence
    #[arg(long, default_value_t = 2.0)]
    title_weight: f32,
    /// Weight of a text token occurrence
    #[arg(long, default_value_t = 1.0)]
    text_weight: f32,
    /// Drop tokens shorter than this many characters
    #[arg(long, default_value_t = 2)]
    min_token_len: usize,
    /// Apply English stemming to indexed and query tokens
    #[arg(long, default_value_t = false)]
    stem: bool,
    /// Keep the first record of each duplicated location instead of failing
    #[arg(long, default_value_t = false)]
    keep_first_duplicate: bool,
}

#[derive(Serialize)]
struct StatsReport {
    input: String,
    built_at: String,
    build_ms: u128,
    #[serde(flatten)]
    stats: IndexStats,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { index, query, limit, category, json } => {
            let limit = checked_limit(limit)?;
            let (idx, _) = build_index(&index)?;
            run_search(&idx, &query, &SearchOptions { limit, category }, json)
        }
        Commands::Stats { index, json } => {
            let (idx, build_ms) = build_index(&index)?;
            print_stats(&idx, &index, build_ms, json)
        }
    }
}

fn build_index(args: &IndexArgs) -> Result<(Index, u128)> {
    let mut records = load_records_from(&args.input)?;
    tracing::info!(input = %args.input.display(), records = records.len(), "loaded records");

    if args.keep_first_duplicate {
        let (kept, dropped) = dedup_locations(records);
        for location in &dropped {
            tracing::warn!(location = %location, "dropping record with duplicate location");
        }
        records = kept;
    }

    let config = IndexConfig {
        tokenizer: TokenizerConfig { min_token_len: args.min_token_len, stem: args.stem, ..Default::default() },
        title_weight: args.title_weight,
        text_weight: args.text_weight,
    };
    let start = Instant::now();
    let index = IndexBuilder::new(config)
        .build(&records)
        .with_context(|| format!("building index from {}", args.input.display()))?;
    let build_ms = start.elapsed().as_millis();
    tracing::info!(num_docs = index.len(), num_terms = index.num_terms(), build_ms, "index build complete");
    Ok((index, build_ms))
}

fn run_search(index: &Index, query: &str, opts: &SearchOptions, json: bool) -> Result<()> {
    let hits = index.search_with(query, opts);
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    println!("{} hits for {:?}", hits.total_hits, query);
    for (rank, hit) in hits.results.iter().enumerate() {
        let r = hit.record;
        println!("{:>3}. {:<8.4} [{}] {}  ({}{})", rank + 1, hit.score, r.category, r.title, r.page, r.location);
    }
    Ok(())
}

fn print_stats(index: &Index, args: &IndexArgs, build_ms: u128, json: bool) -> Result<()> {
    let report = StatsReport {
        input: args.input.display().to_string(),
        built_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        build_ms,
        stats: index.stats(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("input:     {}", report.input);
    println!("records:   {}", report.stats.num_docs);
    println!("terms:     {}", report.stats.num_terms);
    println!("postings:  {}", report.stats.num_postings);
    println!("build:     {} ms", report.build_ms);
    for (category, count) in &report.stats.by_category {
        println!("  {:<10} {}", category, count);
    }
    Ok(())
}
