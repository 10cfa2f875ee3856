//! # CLI Module
//!
//! Command-line interface for the perceptual duplicate finder.
//!
//! ## Usage
//! ```bash
//! # Scan a directory for duplicates
//! dupe-scan scan ~/Photos
//!
//! # With custom threshold
//! dupe-scan scan ~/Photos --threshold 3
//!
//! # Verbose output
//! dupe-scan scan ~/Photos --verbose
//!
//! # JSON output
//! dupe-scan scan ~/Photos --output json
//! ```

mod collect;

use clap::{Parser, Subcommand, ValueEnum};
use collect::{collect_candidates, ImageFilter};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use perceptual_dedup::core::comparator::{GroupingPolicy, DEFAULT_BUCKET_BITS, DEFAULT_THRESHOLD};
use perceptual_dedup::core::hasher::DEFAULT_HASH_SIZE;
use perceptual_dedup::core::pipeline::{CancellationToken, ClusterResult, DuplicateFinder};
use perceptual_dedup::error::{DedupError, Result};
use perceptual_dedup::events::{ClusterEvent, Event, EventChannel, FingerprintEvent, RunEvent};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Perceptual duplicate image finder
#[derive(Parser, Debug)]
#[command(name = "dupe-scan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan files and directories for visually duplicate images
    Scan(ScanArgs),
}

#[derive(clap::Args, Debug)]
struct ScanArgs {
    /// Files or directories to scan
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Maximum Hamming distance between duplicates (lower = stricter)
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: u32,

    /// Worker threads (0 = automatic, at most 8)
    #[arg(short, long, default_value_t = 0)]
    concurrency: usize,

    /// dHash grid size; fingerprints are size*size bits
    #[arg(long, default_value_t = DEFAULT_HASH_SIZE)]
    hash_size: u32,

    /// Leading fingerprint bits used for bucketing (0 = compare every pair).
    /// Must be smaller than the fingerprint width.
    #[arg(long, default_value_t = DEFAULT_BUCKET_BITS)]
    bucket_bits: u32,

    /// How matches inside a bucket are grouped
    #[arg(long, default_value = "union-find")]
    policy: Policy,

    /// Per-image time budget in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,

    /// Print every matched pair as it is found
    #[arg(long)]
    pairs: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Connected components; order independent (default)
    UnionFind,
    /// Greedy grouping around the smallest fingerprint
    SeedLinkage,
}

impl From<Policy> for GroupingPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::UnionFind => GroupingPolicy::UnionFind,
            Policy::SeedLinkage => GroupingPolicy::SeedLinkage,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (duplicate paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan(args),
    }
}

fn run_scan(args: ScanArgs) -> Result<()> {
    perceptual_dedup::init_tracing(args.verbose);
    let term = Term::stderr();
    let pretty = matches!(args.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("dupe-scan").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let filter = ImageFilter::new().with_hidden(args.include_hidden);
    let candidates = collect_candidates(&args.paths, &filter)?;

    let finder = DuplicateFinder::builder()
        .threshold(args.threshold)
        .concurrency(args.concurrency)
        .hash_size(args.hash_size)
        .bucket_bits(args.bucket_bits)
        .policy(args.policy.into())
        .item_timeout(Duration::from_secs(args.timeout_secs))
        .report_pairs(args.pairs)
        .build();

    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if pretty {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = args.verbose;
    let print_pairs = args.pairs;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Progress(update) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_position(update.percent as u64);
                        pb.set_message(update.phase.to_string());
                    }
                }
                Event::Fingerprint(FingerprintEvent::ItemFailed { path, kind, message }) => {
                    if verbose {
                        let line = format!("{} {} {}", style("!").yellow(), kind, message);
                        match progress_clone {
                            Some(ref pb) => pb.println(line),
                            None => eprintln!("{} ({})", line, path.display()),
                        }
                    }
                }
                Event::Cluster(ClusterEvent::PairMatched {
                    path_a,
                    path_b,
                    distance,
                }) => {
                    if print_pairs {
                        let line = format!(
                            "{} {} ~ {}",
                            style(format!("[{}]", distance)).dim(),
                            display_path(&path_a),
                            display_path(&path_b)
                        );
                        match progress_clone {
                            Some(ref pb) => pb.println(line),
                            None => eprintln!("{}", line),
                        }
                    }
                }
                Event::Run(RunEvent::Completed { .. } | RunEvent::Cancelled { .. }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    // Nothing cancels from the command line; the token is for library callers
    let result = finder.run_with_events(&candidates, &CancellationToken::new(), &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let result = result?;

    match args.output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, args.verbose),
        OutputFormat::Json => print_json_results(&result)?,
        OutputFormat::Minimal => print_minimal_results(&result),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, result: &ClusterResult, verbose: bool) {
    term.write_line("").ok();
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} images fingerprinted in {:.1}s",
        style(result.fingerprinted).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    if result.failed > 0 {
        term.write_line(&format!(
            "  {} images skipped (unreadable, too small or too slow)",
            style(result.failed).yellow()
        ))
        .ok();
    }

    term.write_line(&format!(
        "  {} duplicate groups found",
        style(result.groups.len()).cyan()
    ))
    .ok();

    term.write_line(&format!(
        "  {} duplicate images",
        style(result.duplicate_count()).cyan()
    ))
    .ok();

    term.write_line(&format!(
        "  {} potential space savings",
        style(format_bytes(result.potential_savings_bytes())).yellow()
    ))
    .ok();

    term.write_line("").ok();

    if result.groups.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("✓").green()))
            .ok();
    } else {
        term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined()))
            .ok();
        term.write_line("").ok();

        for (i, group) in result.groups.iter().enumerate() {
            term.write_line(&format!(
                "  {} {} ({} images, distance ≤ {}, {})",
                style(format!("Group {}:", i + 1)).bold(),
                style(group.match_type()).yellow(),
                group.len(),
                group.max_distance(),
                format_bytes(group.duplicate_size_bytes())
            ))
            .ok();

            for path in group.paths() {
                let marker = if path == group.representative() {
                    style("★").green().to_string()
                } else {
                    style("○").dim().to_string()
                };
                term.write_line(&format!("    {} {}", marker, display_path(path)))
                    .ok();
            }

            term.write_line("").ok();
        }
    }

    if verbose && !result.failures.is_empty() {
        term.write_line(&format!("{}", style("Skipped:").bold().underlined()))
            .ok();
        for failure in &result.failures {
            term.write_line(&format!(
                "    {} {} ({})",
                style(failure.kind).yellow(),
                display_path(&failure.path),
                failure.message
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    // Footer
    term.write_line(&format!(
        "{}",
        style("No files were modified. Review the groups before deleting anything.").dim()
    ))
    .ok();
}

fn print_json_results(result: &ClusterResult) -> Result<()> {
    let output = serde_json::json!({
        "total_candidates": result.total_candidates,
        "fingerprinted": result.fingerprinted,
        "failed": result.failed,
        "cancelled": result.cancelled,
        "duplicate_groups": result.groups.len(),
        "duplicate_count": result.duplicate_count(),
        "potential_savings_bytes": result.potential_savings_bytes(),
        "duration_ms": result.duration_ms,
        "groups": result.groups.iter().map(|g| {
            serde_json::json!({
                "id": g.id().to_string(),
                "match_type": g.match_type(),
                "max_distance": g.max_distance(),
                "representative": g.representative(),
                "paths": g.paths(),
                "duplicate_size_bytes": g.duplicate_size_bytes(),
            })
        }).collect::<Vec<_>>(),
        "failures": result.failures,
    });

    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| DedupError::Fatal(format!("failed to render JSON: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

fn print_minimal_results(result: &ClusterResult) {
    for group in &result.groups {
        for path in &group.paths()[1..] {
            println!("{}", path.display());
        }
    }
}

/// Show paths under the home directory as `~/...`
fn display_path(path: &Path) -> String {
    match dirs::home_dir()
        .as_deref()
        .and_then(|home| path.strip_prefix(home).ok())
    {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
