use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tilec::session::{Composition, Session};
use tilec::source::DirTileSource;

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitStage {
    /// Human-readable tile listing plus bounds
    Tile,
    /// Full compositions as JSON
    Json,
    /// Stored bounds only
    Bounds,
    /// Provenance fingerprints as JSON
    BuildInfo,
}

#[derive(Parser, Debug)]
#[command(
    name = "tilec",
    version,
    about = "Tile composer — builds timed-automaton models from pre-built tiles"
)]
struct Cli {
    /// Composition expressions, run in order in one session.
    /// `name=expr` names the run; otherwise runs are named run0, run1, ...
    #[arg(required = true)]
    expressions: Vec<String>,

    /// Tile directory (accepting/, binary/, ternary/, random/ subdirectories)
    #[arg(short, long, default_value = "tiles")]
    tiles: PathBuf,

    /// Output file path (stdout when absent)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Tile)]
    emit: EmitStage,

    /// Fail when a run produced warnings or skipped input
    #[arg(long)]
    deny_warnings: bool,

    /// Log composition progress (overridden by RUST_LOG)
    #[arg(long)]
    verbose: bool,
}

fn split_named(index: usize, arg: &str) -> (String, String) {
    match arg.split_once('=') {
        Some((name, expr)) if !name.trim().is_empty() => {
            (name.trim().to_string(), expr.to_string())
        }
        _ => (format!("run{}", index), arg.to_string()),
    }
}

fn render(emit: &EmitStage, runs: &[Composition]) -> Result<String, serde_json::Error> {
    let text = match emit {
        EmitStage::Json => serde_json::to_string_pretty(runs)? + "\n",
        EmitStage::BuildInfo => {
            let infos: Vec<_> = runs
                .iter()
                .map(|c| serde_json::json!({ "name": c.name, "provenance": c.provenance }))
                .collect();
            serde_json::to_string_pretty(&infos)? + "\n"
        }
        EmitStage::Bounds => runs.iter().map(bounds_line).collect(),
        EmitStage::Tile => runs
            .iter()
            .map(|c| format!("{}{}", c.tile, bounds_line(c)))
            .collect(),
    };
    Ok(text)
}

fn bounds_line(c: &Composition) -> String {
    let ranges: Vec<String> = c.bounds.iter().map(|b| b.to_string()).collect();
    if ranges.is_empty() {
        format!("{}: unbounded\n", c.name)
    } else {
        format!("{}: {}\n", c.name, ranges.join(" "))
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // ── Load tile catalog ──
    let source = match DirTileSource::open(&cli.tiles) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("tilec: error: {}", e);
            std::process::exit(2);
        }
    };
    if source.catalog().is_empty() {
        eprintln!("tilec: error: no tiles found under {}", cli.tiles.display());
        std::process::exit(2);
    }
    tracing::info!(tiles = source.catalog().len(), root = %cli.tiles.display(), "catalog loaded");

    let catalog = source.catalog().clone();
    let mut session = Session::new(source, catalog);

    // ── Compose ──
    let mut runs = Vec::with_capacity(cli.expressions.len());
    for (i, arg) in cli.expressions.iter().enumerate() {
        let (name, expr) = split_named(i, arg);
        match session.compose(&name, &expr) {
            Ok(c) => runs.push(c),
            Err(e) => {
                eprintln!("tilec: error: {}: {}", name, e);
                std::process::exit(1);
            }
        }
    }

    if cli.deny_warnings {
        let noisy: Vec<&str> = runs
            .iter()
            .filter(|c| !c.diagnostics.is_empty() || !c.skipped.is_empty())
            .map(|c| c.name.as_str())
            .collect();
        if !noisy.is_empty() {
            eprintln!("tilec: error: warnings denied in: {}", noisy.join(", "));
            std::process::exit(1);
        }
    }

    // ── Emit ──
    let text = match render(&cli.emit, &runs) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("tilec: error: {}", e);
            std::process::exit(2);
        }
    };
    let written = match &cli.output {
        Some(path) => std::fs::write(path, &text),
        None => std::io::stdout().write_all(text.as_bytes()),
    };
    if let Err(e) = written {
        eprintln!("tilec: error: {}", e);
        std::process::exit(2);
    }
}
