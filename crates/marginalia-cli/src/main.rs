use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use marginalia_core::{AppConfig, Clipping, ClippingType, MergeMode, ProcessOptions};
use marginalia_process::{LibraryStats, ProcessResult, process};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "marginalia",
    about = "Clean up parsed e-reader clippings",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting MARGINALIA_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of the standard location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline decisions to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the processing pipeline over a JSON array of parsed clippings.
    Process {
        input: PathBuf,
        /// Write the result here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long)]
        no_dedup: bool,
        #[arg(long)]
        no_merge: bool,
        /// Flag overlapping highlights instead of merging them.
        #[arg(long)]
        flag_overlaps: bool,
        #[arg(long)]
        no_link: bool,
        #[arg(long)]
        extract_tags: bool,
        #[arg(long)]
        highlights_only: bool,
        /// Fuzzy-duplicate similarity threshold in [0, 1].
        #[arg(long)]
        threshold: Option<f64>,
        /// Drop clippings of this type (repeatable).
        #[arg(long, action = clap::ArgAction::Append)]
        exclude_type: Vec<ClippingType>,
        /// Only keep clippings from this book (repeatable).
        #[arg(long, action = clap::ArgAction::Append)]
        book: Vec<String>,
    },

    /// Show per-book statistics for a JSON array of clippings.
    Stats { input: PathBuf },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Print the config file path.
    Path,
    /// Write the default configuration file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json_output = cli.json || std::env::var("MARGINALIA_JSON").as_deref() == Ok("1");

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_from(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    debug!(path = %config_path.display(), "config loaded");

    match cli.command {
        Commands::Process {
            input,
            output,
            no_dedup,
            no_merge,
            flag_overlaps,
            no_link,
            extract_tags,
            highlights_only,
            threshold,
            exclude_type,
            book,
        } => {
            let mut options = config.processing.clone();
            options.remove_duplicates &= !no_dedup;
            options.merge_overlapping &= !no_merge;
            options.merge_notes &= !no_link;
            options.extract_tags |= extract_tags;
            options.highlights_only |= highlights_only;
            if flag_overlaps {
                options.merge_mode = MergeMode::Flag;
            }
            if let Some(t) = threshold {
                options.fuzzy_threshold = t;
            }
            options.filter.exclude_types.extend(exclude_type);
            options.filter.only_books.extend(book);

            let clippings = read_clippings(&input)?;
            let result = process(clippings, &options);
            let dur = start.elapsed().as_millis();

            if let Some(path) = output {
                let body = serde_json::to_string_pretty(&result.clippings)?;
                std::fs::write(&path, body)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "ok",
                        "data": summary_json(&result, &options),
                        "meta": { "duration_ms": dur, "output": path }
                    }))?;
                } else {
                    print_summary(&result);
                    println!("Wrote {} clippings to {}", result.clippings.len(), path.display());
                }
            } else if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": result,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                print_summary(&result);
            }
        }

        Commands::Stats { input } => {
            let clippings = read_clippings(&input)?;
            let stats = LibraryStats::compute(&clippings);

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": stats,
                    "meta": { "duration_ms": start.elapsed().as_millis() }
                }))?;
            } else {
                println!(
                    "{} clippings in {} books: {} highlights, {} notes, {} bookmarks",
                    stats.total_clippings,
                    stats.total_books,
                    stats.highlights,
                    stats.notes,
                    stats.bookmarks
                );
                for book in &stats.books {
                    println!(
                        "  {title:<40}  {author:<25}  {h:>4} hl  {n:>4} notes  {s:>3} suspicious",
                        title = book.title,
                        author = book.author,
                        h = book.highlights,
                        n = book.notes,
                        s = book.suspicious,
                    );
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":config}))?;
                } else {
                    println!("Config file: {}", config_path.display());
                    println!("{config:#?}");
                }
            }
            ConfigAction::Path => {
                println!("{}", config_path.display());
            }
            ConfigAction::Init { force } => {
                if config_path.exists() && !force {
                    eprintln!(
                        "Config already exists at {}. Use --force to overwrite.",
                        config_path.display()
                    );
                    std::process::exit(7);
                }
                AppConfig::default().save_to(&config_path)?;
                println!("Wrote default config to {}", config_path.display());
            }
        },
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "marginalia_cli=debug,marginalia_process=debug,marginalia_core=debug"
    } else {
        "marginalia_cli=info,marginalia_process=warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_clippings(path: &Path) -> Result<Vec<Clipping>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let clippings: Vec<Clipping> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of clippings", path.display()))?;
    debug!(count = clippings.len(), "read clippings");
    Ok(clippings)
}

fn summary_json(result: &ProcessResult, options: &ProcessOptions) -> serde_json::Value {
    serde_json::json!({
        "clippings": result.clippings.len(),
        "duplicatesRemoved": result.duplicates_removed,
        "mergedHighlights": result.merged_highlights,
        "overlappingFlagged": result.overlapping_flagged,
        "linkedNotes": result.linked_notes,
        "tagsExtracted": result.tags_extracted,
        "emptyRemoved": result.empty_removed,
        "filteredOut": result.filtered_out,
        "suspiciousFlagged": result.suspicious_flagged,
        "fuzzyDuplicatesFlagged": result.fuzzy_duplicates_flagged,
        "options": options,
    })
}

fn print_summary(result: &ProcessResult) {
    println!("Processed {} clippings", result.clippings.len());
    println!("  duplicates removed:     {}", result.duplicates_removed);
    println!("  highlights merged:      {}", result.merged_highlights);
    if result.overlapping_flagged > 0 {
        println!("  overlaps flagged:       {}", result.overlapping_flagged);
    }
    println!("  notes linked:           {}", result.linked_notes);
    if result.tags_extracted > 0 {
        println!("  highlights tagged:      {}", result.tags_extracted);
    }
    println!("  empty removed:          {}", result.empty_removed);
    if result.filtered_out > 0 {
        println!("  filtered out:           {}", result.filtered_out);
    }
    println!("  suspicious flagged:     {}", result.suspicious_flagged);
    println!("  fuzzy duplicates:       {}", result.fuzzy_duplicates_flagged);
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
