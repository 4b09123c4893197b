use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use line_status::config::{
    SettingsEvent, TrackerConfig, TrackerSettings, default_config, layers, load_settings,
};
use line_status::diff::builder::as_strs;
use line_status::diff::{LineDiff, RangeBuilder, SimilarLineDiff};
use line_status::document::{Document, TextDocument, apply_modification};
use line_status::tracker::{
    LineStatusTracker, NoopHighlighter, Range, TOO_BIG_MESSAGE, TrackedDocument,
};

/// Line-level change tracking between a baseline and a working copy
#[derive(Parser)]
#[command(name = "line-status")]
#[command(version)]
#[command(about = "Line-level change tracking between a baseline and a working copy")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the changed ranges of CURRENT against BASELINE
    Diff {
        baseline: PathBuf,
        current: PathBuf,

        /// Also print inner ranges of each block
        #[arg(long)]
        inner: bool,

        /// Print JSON instead of one line per range
        #[arg(long)]
        json: bool,

        /// Configuration file applied on top of the user and project config
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Type CURRENT over BASELINE block by block, reconciling after each
    /// edit, and check the result against a full diff
    Replay {
        baseline: PathBuf,
        current: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the default configuration as TOML
    Init,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Diff {
            baseline,
            current,
            inner,
            json,
            config,
        } => run_diff(&baseline, &current, inner, json, config.as_deref()),
        Commands::Replay {
            baseline,
            current,
            config,
        } => run_replay(&baseline, &current, config.as_deref()),
        Commands::Config {
            command: ConfigCommands::Init,
        } => run_config_init(),
    };

    match result {
        Ok(code) => code,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn resolve_settings(config: Option<&Path>, inner: bool) -> TrackerSettings {
    let mut events: Vec<SettingsEvent> = Vec::new();
    let mut explicit = config
        .and_then(|path| layers::load_config_file(path, &mut events))
        .unwrap_or_default();
    if inner {
        explicit.refine_inner_ranges = Some(true);
    }

    let override_value = (explicit != TrackerConfig::default())
        .then(|| serde_json::to_value(&explicit).ok())
        .flatten();
    let root = std::env::current_dir().ok();
    let outcome = load_settings(root.as_deref(), override_value);

    for event in events.iter().chain(&outcome.events) {
        event.log();
    }
    outcome.settings
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("Failed to read {}: {}", path.display(), err))
}

fn run_diff(
    baseline: &Path,
    current: &Path,
    inner: bool,
    json: bool,
    config: Option<&Path>,
) -> Result<ExitCode, String> {
    let settings = resolve_settings(config, inner);
    let baseline_text = read(baseline)?;
    let document = TextDocument::new(read(current)?);

    let tracker = LineStatusTracker::new(NoopHighlighter, settings);
    let ui = tracker.ui().map_err(|err| err.to_string())?;
    ui.set_baseline(&document, baseline_text);

    if tracker.is_too_big_to_diff() {
        eprintln!("{}", TOO_BIG_MESSAGE);
        return Ok(ExitCode::from(2));
    }
    let ranges = tracker.ranges().map_err(|err| err.to_string())?;

    if json {
        let rendered = serde_json::to_string_pretty(&ranges_to_json(&ranges, inner))
            .map_err(|err| err.to_string())?;
        println!("{}", rendered);
    } else {
        for range in &ranges {
            println!("{}", render_range(range));
            if !inner {
                continue;
            }
            for inner_range in range.inner_ranges().unwrap_or_default() {
                println!(
                    "  {} {}..{} vcs {}..{}",
                    inner_range.kind,
                    inner_range.line1,
                    inner_range.line2,
                    inner_range.vcs_line1,
                    inner_range.vcs_line2
                );
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn render_range(range: &Range) -> String {
    format!(
        "{} {}..{} vcs {}..{}",
        range.kind(),
        range.line1(),
        range.line2(),
        range.vcs_line1(),
        range.vcs_line2()
    )
}

fn ranges_to_json(ranges: &[Range], inner: bool) -> serde_json::Value {
    let entries: Vec<_> = ranges
        .iter()
        .map(|range| {
            let mut entry = json!({
                "kind": range.kind().as_str(),
                "line1": range.line1(),
                "line2": range.line2(),
                "vcsLine1": range.vcs_line1(),
                "vcsLine2": range.vcs_line2(),
            });
            if let Some(inner_ranges) = range.inner_ranges().filter(|_| inner) {
                entry["innerRanges"] = inner_ranges
                    .iter()
                    .map(|inner_range| {
                        json!({
                            "kind": inner_range.kind.as_str(),
                            "line1": inner_range.line1,
                            "line2": inner_range.line2,
                            "vcsLine1": inner_range.vcs_line1,
                            "vcsLine2": inner_range.vcs_line2,
                        })
                    })
                    .collect();
            }
            entry
        })
        .collect();
    serde_json::Value::Array(entries)
}

fn run_replay(baseline: &Path, current: &Path, config: Option<&Path>) -> Result<ExitCode, String> {
    let settings = resolve_settings(config, false);
    let baseline_text = read(baseline)?;
    let target = TextDocument::new(read(current)?);

    let tracker = LineStatusTracker::new(NoopHighlighter, settings.clone());
    let ui = tracker.ui().map_err(|err| err.to_string())?;
    let mut document = TrackedDocument::new(TextDocument::new(baseline_text.clone()), &ui);
    ui.set_baseline(document.get(), baseline_text);

    let differ = SimilarLineDiff::from_settings(&settings);
    let baseline_lines = document.get().lines(0, document.get().line_count());
    let target_lines = target.lines(0, target.line_count());
    let changes = differ
        .diff(&as_strs(&baseline_lines), &as_strs(&target_lines))
        .map_err(|err| err.to_string())?;

    // Bottom-up, so earlier blocks keep their line numbers.
    for change in changes.iter().rev() {
        apply_modification(
            &mut document,
            change.before_start,
            change.before_end(),
            &target,
            change.after_start,
            change.after_end(),
        )
        .map_err(|err| err.to_string())?;
        ui.flush(document.get());
    }

    let document = document.into_inner();
    if document.text() != target.text() {
        return Err("Replayed text does not match the current file".to_string());
    }
    if tracker.is_too_big_to_diff() {
        eprintln!("{}", TOO_BIG_MESSAGE);
        return Ok(ExitCode::from(2));
    }

    let incremental = tracker.ranges().map_err(|err| err.to_string())?;
    let full = RangeBuilder::new(&differ, settings.refine_inner_ranges)
        .build_full(&document, &*tracker.baseline().unwrap_or_default())
        .map_err(|err| err.to_string())?;

    println!("edits: {}", changes.len());
    println!("incremental: {} ranges", incremental.len());
    println!("full: {} ranges", full.len());

    if incremental != full {
        for range in &incremental {
            eprintln!("incremental {}", render_range(range));
        }
        for range in &full {
            eprintln!("full        {}", render_range(range));
        }
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_config_init() -> Result<ExitCode, String> {
    let rendered = toml::to_string_pretty(&default_config()).map_err(|err| err.to_string())?;
    print!("{}", rendered);
    Ok(ExitCode::SUCCESS)
}
