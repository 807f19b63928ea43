//! Print the queue-occupancy series of a trace log (one sample per line).

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    str::FromStr,
};

use clap::Parser;
use colored::Colorize;

use quedist::{
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
    about = "Show the parsed series of a trace log.",
    long_about = None,
    propagate_version = true)]
struct Cli {
    /// The trace log to parse.
    #[arg(long_help, value_name = "FILE", help = "The trace log to parse")]
    file: PathBuf,

    /// The kind of the trace log (qdisc or emulator).
    #[arg(
        long_help,
        short,
        long,
        default_value = "qdisc",
        value_name = "KIND",
        help = "The kind of the trace log"
    )]
    kind: String,
}

fn run(file: &Path, kind: &str) -> Result<(), QuedistError> {
    let series = Series::load(0, SourceKind::from_str(kind)?, file)?;

    series.samples.iter().for_each(|sample| {
        println!("{}", sample);
    });
    println_info!(
        "{} samples ({} bytes total) extracted from '{}'.",
        series.len(),
        series.total_bytes(),
        file.display()
    );

    Ok(())
}

fn main() -> ExitCode {
    common::reset_sigpipe();
    let cli = Cli::parse();

    match run(&cli.file, &cli.kind) {
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
