//! vagus-bench: CLI tool for stitching tracing datasets and inspecting
//! the results.
//!
//! Discovers every segment below a tracing directory, stitches each one
//! with configurable parameters, and prints per-segment diagnostics.
//! Useful for:
//!
//! - Tuning the stitching tolerance for a new dataset
//! - Comparing generation strategies (`two-tier` vs `dependency-graph`)
//! - Finding orphaned branches and the parent they were compared against
//! - Exporting stitched trees and line meshes as JSON
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin vagus-bench -- [OPTIONS] <TRACING_DIR>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use vagus_io::{IoError, SegmentFiles, SegmentOutput};
use vagus_stitch::morphology::{TrunkRadius, assign_trunk_radius};
use vagus_stitch::{
    GenerationStrategy, MeshOptions, OrientationTable, StitchConfig, StitchDiagnostics, Stitcher,
    TreeTopology,
};

/// Stitch traced vagus nerve segments and report diagnostics.
///
/// Each sub-directory of the tracing directory is one segment. Traces
/// are classified, ordered, and attached to their parents; the result
/// is summarised per segment and optionally written out as JSON.
#[derive(Parser)]
#[command(name = "vagus-bench", version)]
struct Cli {
    /// Directory holding one sub-directory of CSV traces per segment.
    tracing_dir: PathBuf,

    /// Squared distance below which a branch attaches to its parent.
    #[arg(long, default_value_t = StitchConfig::DEFAULT_STITCHING_TOLERANCE)]
    tolerance: f64,

    /// How branches are ordered so parents are stitched first.
    #[arg(long, value_enum, default_value_t = Generation::TwoTier)]
    generation: Generation,

    /// Only process segments whose name contains this text.
    #[arg(long)]
    segment: Option<String>,

    /// JSON file mapping branch names to orientation keywords.
    #[arg(long)]
    orientations: Option<PathBuf>,

    /// JSON file mapping branch names to annotation term ids.
    #[arg(long)]
    terms: Option<PathBuf>,

    /// Directory holding nerve morphology CSV files.
    #[arg(long)]
    morphology: Option<PathBuf>,

    /// Write one JSON document per segment into this directory.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output diagnostics as JSON instead of human-readable reports.
    #[arg(long)]
    json: bool,

    /// Full stitch config as a JSON string.
    ///
    /// When provided, `--tolerance` and `--generation` are ignored.
    /// The JSON must be a valid `StitchConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Log every match decision.
    #[arg(short, long)]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Generation strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Generation {
    /// First-level branches, then nested branches.
    TwoTier,
    /// Topological order over suggested parents.
    DependencyGraph,
}

/// Build a [`StitchConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<StitchConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(StitchConfig {
        stitching_tolerance: cli.tolerance,
        generation_strategy: match cli.generation {
            Generation::TwoTier => GenerationStrategy::TwoTier,
            Generation::DependencyGraph => GenerationStrategy::DependencyGraph,
        },
        ..StitchConfig::default()
    })
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

/// Side files shared by every segment.
#[derive(Default)]
struct SideInputs {
    orientations: BTreeMap<String, String>,
    terms: BTreeMap<String, String>,
}

impl SideInputs {
    fn load(cli: &Cli) -> Result<Self, IoError> {
        let mut inputs = Self::default();
        if let Some(path) = &cli.orientations {
            inputs.orientations = vagus_io::read_name_map(path)?;
        }
        if let Some(path) = &cli.terms {
            inputs.terms = vagus_io::read_name_map(path)?;
        }
        Ok(inputs)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let stitcher = match Stitcher::new(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let config = stitcher.config();

    let inputs = match SideInputs::load(&cli) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("Error reading side file: {e}");
            return ExitCode::FAILURE;
        }
    };

    let segments = match vagus_io::find_tracing_csv_files(&cli.tracing_dir) {
        Ok(segments) => segments,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let segments: Vec<SegmentFiles> = segments
        .into_iter()
        .filter(|s| cli.segment.as_ref().is_none_or(|f| s.name.contains(f.as_str())))
        .collect();

    eprintln!(
        "Tracing directory: {} ({} segments)",
        cli.tracing_dir.display(),
        segments.len(),
    );
    eprintln!(
        "Config: tolerance={} generation={:?}",
        config.stitching_tolerance, config.generation_strategy,
    );
    eprintln!();

    let table = OrientationTable::from_vocabulary(&config.vocabulary);
    let mut all_diagnostics: Vec<(String, StitchDiagnostics)> = Vec::with_capacity(segments.len());
    let mut failed = false;

    for files in &segments {
        match run_segment(&cli, &stitcher, &table, &inputs, files) {
            Ok(diagnostics) => {
                if !cli.json {
                    println!("{}: {}", files.name, diagnostics.report());
                    println!();
                }
                all_diagnostics.push((files.name.clone(), diagnostics));
            }
            Err(e) => {
                eprintln!("Error in segment {}: {e}", files.name);
                failed = true;
            }
        }
    }

    if cli.json {
        let by_name: BTreeMap<&str, &StitchDiagnostics> = all_diagnostics
            .iter()
            .map(|(name, d)| (name.as_str(), d))
            .collect();
        match serde_json::to_string_pretty(&by_name) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else if all_diagnostics.len() > 1 {
        print_summary(&all_diagnostics);
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Load, stitch, and optionally export one segment.
fn run_segment(
    cli: &Cli,
    stitcher: &Stitcher,
    table: &OrientationTable,
    inputs: &SideInputs,
    files: &SegmentFiles,
) -> Result<StitchDiagnostics, IoError> {
    let data = vagus_io::load_segment(files)?;
    let mut segment = stitcher.stitch(data.side, data.traces);

    let radius = match (&cli.morphology, segment.trunk.as_ref()) {
        (Some(dir), Some(trunk)) => trunk_radius(dir, &files.name, trunk)?,
        _ => None,
    };

    let orientations = vagus_stitch::assign_orientations(table, &segment, &inputs.orientations);
    let terms = vagus_stitch::annotations::segment_terms(&segment, &inputs.terms);

    let topology = TreeTopology::from_segment(&segment);
    let mesh = vagus_stitch::build_line_mesh(
        &segment,
        &topology,
        &MeshOptions {
            trunk_radius: radius.as_ref(),
            terms: &terms,
            orientations: Some(&orientations),
        },
    );
    segment
        .diagnostics
        .record_mesh(mesh.nodes.len(), mesh.elements.len());

    let detached = topology.detached();
    if !detached.is_empty() {
        log::info!("{}: not connected to the trunk: {detached:?}", files.name);
    }

    if let Some(dir) = &cli.output {
        let path = vagus_io::write_segment_output(
            dir,
            &SegmentOutput {
                name: &files.name,
                segment: &segment,
                markers: &data.markers,
                terms: &terms,
                orientations: &orientations,
                mesh: &mesh,
            },
        )?;
        eprintln!("Segment written to {}", path.display());
    }

    Ok(segment.diagnostics)
}

fn trunk_radius(
    dir: &Path,
    segment_name: &str,
    trunk: &vagus_stitch::Trace,
) -> Result<Option<TrunkRadius>, IoError> {
    let Some(path) = vagus_io::find_morphology_file(dir, segment_name, &trunk.name) else {
        log::warn!("{segment_name}: no morphology file for {}", trunk.name);
        return Ok(None);
    };
    let samples = vagus_io::csv::read_morphology_csv(&path)?;
    Ok(assign_trunk_radius(trunk.points.points(), &samples))
}

/// Print totals across all segments.
fn print_summary(all: &[(String, StitchDiagnostics)]) {
    let total = |f: fn(&StitchDiagnostics) -> usize| all.iter().map(|(_, d)| f(d)).sum::<usize>();

    println!("Summary ({} segments)\n{}", all.len(), "=".repeat(60));
    println!("{:<24} {:>8}", "Branches", total(|d| d.branch_count));
    println!("{:<24} {:>8}", "Matched", total(|d| d.matched_count));
    println!("{:<24} {:>8}", "Reversed", total(|d| d.reversed_count));
    println!("{:<24} {:>8}", "Orphaned", total(StitchDiagnostics::orphan_count));
    println!("{:<24} {:>8}", "Non-vagal", total(|d| d.non_vagal.len()));

    let missing: Vec<&str> = all
        .iter()
        .filter(|(_, d)| !d.trunk_found)
        .map(|(name, _)| name.as_str())
        .collect();
    if !missing.is_empty() {
        println!("Segments without trunk: {}", missing.join(", "));
    }
}
