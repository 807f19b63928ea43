//! Show the distance between two trace logs.
//!
//! Sometimes it is useful to quickly know the distance between two specific traces without going
//! through directory resolution and the cache; this is what this tool is for.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    str::FromStr,
};

use clap::Parser;
use colored::Colorize;

use quedist::{
    distance_metric::DistanceMetric,
    error::QuedistError,
    series::{Series, SourceKind},
};

mod common;
#[macro_use]
#[allow(unused_macros)]
mod logging;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Calculate the distance between two trace logs.",
    long_about = None,
    propagate_version = true)]
struct Cli {
    /// The first trace log.
    #[arg(long_help, value_name = "FILE 1", help = "The first trace log")]
    file_1: PathBuf,

    /// The second trace log.
    #[arg(long_help, value_name = "FILE 2", help = "The second trace log")]
    file_2: PathBuf,

    /// The kind of the first trace log (qdisc or emulator).
    #[arg(
        long_help,
        long,
        default_value = "qdisc",
        value_name = "KIND",
        help = "The kind of the first trace log"
    )]
    kind_1: String,

    /// The kind of the second trace log (qdisc or emulator).
    #[arg(
        long_help,
        long,
        default_value = "emulator",
        value_name = "KIND",
        help = "The kind of the second trace log"
    )]
    kind_2: String,

    /// The distance metric to use.
    #[arg(
        long_help,
        short,
        long,
        default_value = "dtw",
        help = "The distance metric to use"
    )]
    distance_metric: String,
}

/// Run the distance calculation tool.
fn run(
    file_1: &Path,
    file_2: &Path,
    kind_1: &str,
    kind_2: &str,
    distance_metric: &str,
) -> Result<(), QuedistError> {
    let series_1 = Series::load(1, SourceKind::from_str(kind_1)?, file_1)?;
    let series_2 = Series::load(2, SourceKind::from_str(kind_2)?, file_2)?;

    let distance_metric = DistanceMetric::from_str(distance_metric)?;
    let distance = distance_metric.dist(&series_1.samples, &series_2.samples);

    println_info!(
        "Distance between '{}' and '{}':",
        file_1.display(),
        file_2.display()
    );
    println_info!("  Samples: {} vs {}", series_1.len(), series_2.len());
    println_info!("  {}: {:.6}", distance_metric, distance);

    Ok(())
}

fn main() -> ExitCode {
    common::reset_sigpipe();
    let cli = Cli::parse();

    match run(
        &cli.file_1,
        &cli.file_2,
        &cli.kind_1,
        &cli.kind_2,
        &cli.distance_metric,
    ) {
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
