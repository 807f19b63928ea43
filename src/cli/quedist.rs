//! Compare queue-occupancy traces between a real qdisc and a network emulator.
//!
//! This is the main quedist binary; it resolves the available trace logs, computes the
//! normalized DTW distance for every series pair the cache does not already hold, and persists
//! each result as it completes.

use std::{
    collections::BTreeMap,
    path::Path,
    path::PathBuf,
    process::ExitCode,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use clap::Parser;
use colored::Colorize;
use regex::Regex;

use quedist::error;
use quedist::{
    cache::ComparisonKind,
    config::Config,
    engine,
    error::QuedistError,
    series::{self, Series, SourceKind},
};

mod common;
#[macro_use]
#[allow(unused_macros)]
mod logging;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Compare queueing traces between a real qdisc and an emulator.",
    long_about = None,
    propagate_version = true)]
struct Cli {
    /// The configuration file to use. Generate the default configuration with
    /// `quedist-generate-config`.
    #[arg(
        long_help,
        default_value = "config.toml",
        value_name = "FILE",
        help = "The configuration file to use"
    )]
    config_file: PathBuf,

    /// The kind of comparison to run, overriding the configuration
    /// (qdisc, emulator, or cross).
    #[arg(long_help, short, long, value_name = "KIND", help = "The comparison kind")]
    mode: Option<String>,

    /// The worker pool size, overriding the configuration (0 = one less than the number of
    /// processing units).
    #[arg(long_help, short, long, value_name = "N", help = "The worker pool size")]
    workers: Option<usize>,

    /// Print the full distance mapping to stdout as `i,j,distance` lines once the run completes.
    #[arg(long_help, short, long, help = "Print the distance mapping")]
    print_distances: bool,
}

/// Resolve the series of one source kind, reporting unreadable files as they are skipped.
fn resolve_kind(
    dir: &Path,
    file_pattern: &str,
    kind: SourceKind,
) -> Result<BTreeMap<u32, Series>, QuedistError> {
    let file_regex = Regex::new(file_pattern)
        .map_err(|err| error!("invalid file pattern '{}': {}.", file_pattern, err))?;
    let resolved = series::resolve_series(dir, &file_regex, kind)?;

    for (file, err) in &resolved.skipped_files {
        println_warning!("skipping unreadable trace log '{}': {}", file.display(), err);
    }

    let empty_series = resolved.series.values().filter(|s| s.is_empty()).count();
    println_info!(
        "Loaded {} {} series from '{}' ({} empty).",
        resolved.series.len(),
        kind,
        dir.display(),
        empty_series
    );

    Ok(resolved.series)
}

/// Run the comparison driver.
fn run(
    config_file: &Path,
    mode: Option<String>,
    workers: Option<usize>,
    print_distances: bool,
) -> Result<(), QuedistError> {
    let config = Config::load(config_file)?;
    let mode = mode
        .as_deref()
        .map(ComparisonKind::from_str)
        .transpose()?
        .unwrap_or(config.mode);
    let workers = workers.unwrap_or(config.workers);

    let (left_kind, right_kind) = mode.source_kinds();
    let needs_kind = |kind| left_kind == kind || right_kind == kind;

    let qdisc_series = match needs_kind(SourceKind::Qdisc) {
        true => resolve_kind(&config.qdisc_dir, &config.qdisc_file_regex, SourceKind::Qdisc)?,
        false => BTreeMap::new(),
    };
    let emulator_series = match needs_kind(SourceKind::Emulator) {
        true => resolve_kind(
            &config.emulator_dir,
            &config.emulator_file_regex,
            SourceKind::Emulator,
        )?,
        false => BTreeMap::new(),
    };

    // Set up a "global" stop flag, and create a Ctrl-C handler that just sets it. In-flight
    // jobs finish, queued ones are abandoned, and everything already appended stays cached.
    let should_stop = Arc::new(AtomicBool::new(false));
    let stop_flag = should_stop.clone();
    ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::SeqCst);
    })
    .expect("could not set Ctrl-C handler.");

    println_info!(
        "Running {} comparison with {} workers...",
        mode,
        engine::worker_count(workers)
    );

    let summary = engine::run_comparisons(
        &qdisc_series,
        &emulator_series,
        mode,
        config.metric,
        &config.cache_dir,
        workers,
        &should_stop,
        |i, j, distance| match distance {
            Some(distance) => println_info!("DTW({}, {}) = {:.3}", i, j, distance),
            None => println_warning!("no distance for ({}, {}): empty series.", i, j),
        },
    )?;

    println_info!(
        "{} pairs compared: {} cached, {} newly computed, {} skipped.",
        summary.cached + summary.computed,
        summary.cached,
        summary.computed,
        summary.skipped
    );
    if summary.corrupt_cache_lines > 0 {
        println_warning!(
            "{} corrupt cache lines were ignored on load.",
            summary.corrupt_cache_lines
        );
    }
    if summary.unsaved > 0 {
        println_warning!(
            "{} computed distances could not be persisted and will be recomputed next run.",
            summary.unsaved
        );
    }
    if summary.interrupted {
        println_warning!("run interrupted; completed distances are cached, rerun to resume.");
    }

    if print_distances {
        let mut entries: Vec<((u32, u32), f64)> = summary
            .distances
            .iter()
            .map(|(&pair, &distance)| (pair, distance))
            .filter(|&((i, j), _)| !mode.is_symmetric() || i < j)
            .collect();
        entries.sort_by_key(|&(pair, _)| pair);

        for ((i, j), distance) in entries {
            println!("{},{},{:.6}", i, j, distance);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    common::reset_sigpipe();
    let cli = Cli::parse();

    match run(&cli.config_file, cli.mode, cli.workers, cli.print_distances) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            println_error!(err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }
}
