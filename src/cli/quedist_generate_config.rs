//! Generate a default quedist configuration.
//!
//! This binary writes a configuration file with every option set to its default, as a starting
//! point for new comparison campaigns.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use colored::Colorize;

use quedist::{config::Config, error, error::QuedistError, fail};

mod common;
#[macro_use]
#[allow(unused_macros)]
mod logging;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Generate a default quedist configuration.",
    long_about = None,
    propagate_version = true)]
struct Cli {
    /// The file to write the configuration to.
    #[arg(
        long_help,
        default_value = "config.toml",
        value_name = "FILE",
        help = "The file to write the configuration to"
    )]
    config_file: PathBuf,

    /// Overwrite the configuration file if it already exists.
    #[arg(long_help, short, long, help = "Overwrite an existing file")]
    force: bool,
}

fn run(config_file: &PathBuf, force: bool) -> Result<(), QuedistError> {
    if config_file.exists() && !force {
        fail!(
            "configuration file '{}' already exists. If overwriting it is intentional, use the \
            `-f/--force` option.",
            config_file.display()
        )?;
    }

    Config::default().save(config_file)
}

fn main() -> ExitCode {
    common::reset_sigpipe();
    let cli = Cli::parse();

    match run(&cli.config_file, cli.force) {
        Ok(_) => {
            println_info!(
                "Done! The configuration is saved in '{}'.",
                cli.config_file.display()
            );
            ExitCode::SUCCESS
        }
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
