use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use unique_matcher::{DebugCollector, MatchError, Matcher, MatcherConfig, DEFAULT_LOG_FILTER};

#[derive(Parser)]
#[command(name = "unique-matcher")]
#[command(about = "Identify unique items in inventory screenshots", long_about = None)]
struct Cli {
    /// Screenshot files, or directories searched for .png screenshots
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON config file (defaults are used if it doesn't exist)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Data directory, overrides the config
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Only locate the item and read its title
    #[arg(long)]
    extract_only: bool,

    /// Print one JSON line per screenshot
    #[arg(long)]
    json: bool,

    /// Save intermediate images and scores, one subdirectory per screenshot
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = MatcherConfig::load(&cli.config)?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }

    let screenshots = collect_screenshots(&cli.inputs)?;
    if screenshots.is_empty() {
        warn!("No screenshots found");
        return Ok(ExitCode::SUCCESS);
    }

    let matcher = Matcher::load(config).context("Failed to initialize matcher")?;
    info!("Processing {} screenshot(s)", screenshots.len());

    let outcomes: Vec<(&PathBuf, Result<serde_json::Value, MatchError>)> = screenshots
        .par_iter()
        .map(|path| (path, process(&matcher, path, &cli)))
        .collect();

    let mut failures: BTreeMap<&'static str, usize> = BTreeMap::new();
    for (path, outcome) in &outcomes {
        match outcome {
            Ok(report) if cli.json => println!("{}", report),
            Ok(report) => println!("{}: {}", path.display(), describe(report)),
            Err(e) => {
                error!("{}: {}", path.display(), e);
                if cli.json {
                    println!(
                        "{}",
                        json!({
                            "screenshot": path,
                            "error": e.kind(),
                            "message": e.to_string(),
                        })
                    );
                }
                *failures.entry(e.kind()).or_insert(0) += 1;
            }
        }
    }

    let failed: usize = failures.values().sum();
    eprintln!(
        "Processed {} screenshot(s): {} succeeded, {} failed",
        outcomes.len(),
        outcomes.len() - failed,
        failed
    );
    for (kind, count) in &failures {
        eprintln!("  {}: {}", kind, count);
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Expand directories into the .png files below them, sorted.
fn collect_screenshots(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut screenshots = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && is_png(p))
                .collect();
            found.sort();
            screenshots.extend(found);
        } else if input.is_file() {
            screenshots.push(input.clone());
        } else {
            anyhow::bail!("Input not found: {}", input.display());
        }
    }

    Ok(screenshots)
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

fn process(matcher: &Matcher, path: &Path, cli: &Cli) -> Result<serde_json::Value, MatchError> {
    if cli.extract_only {
        let info = matcher.find_unique(path)?;
        return Ok(json!({
            "screenshot": path,
            "base": info.base,
            "name": info.name,
            "identified": info.identified,
        }));
    }

    let result = match debug_output(cli, path) {
        Some(out) => {
            let mut collector = DebugCollector::default();
            let outcome = matcher.find_item_observed(path, &mut collector);
            if let Err(e) = collector.save(&out) {
                warn!("Failed to save debug data for {}: {}", path.display(), e);
            }
            outcome?
        }
        None => matcher.find_item(path)?,
    };
    Ok(json!({
        "screenshot": path,
        "item": result.item.name,
        "file": result.item.file,
        "base": result.item.base,
        "matched_by": result.matched_by.to_string(),
        "identified": result.identified,
        "min_val": result.min_val,
        "hist_val": result.hist_val,
        "sockets": result.sockets(),
    }))
}

/// Per-screenshot debug directory, only when `--debug-dir` is given.
fn debug_output(cli: &Cli, path: &Path) -> Option<PathBuf> {
    let debug_dir = cli.debug_dir.as_ref()?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "screenshot".to_string());
    Some(debug_dir.join(stem))
}

fn describe(report: &serde_json::Value) -> String {
    match (report.get("item"), report.get("matched_by")) {
        (Some(item), Some(by)) => format!(
            "{} ({})",
            item.as_str().unwrap_or_default(),
            by.as_str().unwrap_or_default()
        ),
        _ => format!(
            "base {}, name {}",
            report["base"].as_str().unwrap_or_default(),
            report["name"].as_str().unwrap_or("")
        ),
    }
}
