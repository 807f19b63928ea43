//! Run configuration definition & utilities.
//!
//! This module handles the engine's configuration file (mostly its parsing). The configuration
//! is an explicit struct handed to the engine's entry point; nothing in the engine reads
//! process-wide mutable state.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    cache::ComparisonKind, distance_metric::DistanceMetric, error::QuedistError,
    series::SourceKind,
};

/// A configuration for a comparison run.
#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    /// The directory containing the qdisc trace logs.
    #[serde(default = "Config::default_qdisc_dir")]
    pub qdisc_dir: PathBuf,
    /// The directory containing the emulator trace logs.
    #[serde(default = "Config::default_emulator_dir")]
    pub emulator_dir: PathBuf,
    /// The file-name pattern for qdisc trace logs; group 1 captures the series index.
    #[serde(default = "Config::default_qdisc_file_regex")]
    pub qdisc_file_regex: String,
    /// The file-name pattern for emulator trace logs; group 1 captures the series index.
    #[serde(default = "Config::default_emulator_file_regex")]
    pub emulator_file_regex: String,
    /// The directory holding the per-kind distance cache files.
    #[serde(default = "Config::default_cache_dir")]
    pub cache_dir: PathBuf,
    /// The kind of comparison to run.
    #[serde(default = "Config::default_mode")]
    pub mode: ComparisonKind,
    /// The distance metric to use.
    #[serde(default = "Config::default_metric")]
    pub metric: DistanceMetric,
    /// The worker pool size; 0 selects one less than the number of processing units.
    #[serde(default)]
    pub workers: usize,
}

impl Config {
    /// The default qdisc trace log directory.
    fn default_qdisc_dir() -> PathBuf {
        PathBuf::from("tmp")
    }
    /// The default emulator trace log directory.
    fn default_emulator_dir() -> PathBuf {
        PathBuf::from("outputs")
    }
    /// The default qdisc file-name pattern.
    fn default_qdisc_file_regex() -> String {
        SourceKind::Qdisc.default_file_regex().to_string()
    }
    /// The default emulator file-name pattern.
    fn default_emulator_file_regex() -> String {
        SourceKind::Emulator.default_file_regex().to_string()
    }
    /// The default cache directory.
    fn default_cache_dir() -> PathBuf {
        PathBuf::from(".")
    }
    /// The default comparison kind.
    const fn default_mode() -> ComparisonKind {
        ComparisonKind::Cross
    }
    /// The default distance metric.
    const fn default_metric() -> DistanceMetric {
        DistanceMetric::Dtw
    }

    /// Save a configuration to a file.
    ///
    /// # Arguments
    /// * `file` - The file to save the configuration to.
    pub fn save(&self, file: &Path) -> Result<(), QuedistError> {
        let config_toml = toml::to_string(&self).expect("failed to serialize config TOML.");

        fs::write(file, config_toml).map_err(|err| {
            error!(
                "could not save config to file {}: {}.",
                file.display(),
                err
            )
        })
    }

    /// Load a configuration from file.
    ///
    /// # Arguments
    /// * `file` - The file to load the configuration from.
    pub fn load(file: &Path) -> Result<Self, QuedistError> {
        let config_toml = fs::read_to_string(file).map_err(|err| {
            error!(
                "failed to read configuration from {}: {}.",
                file.display(),
                err
            )
        })?;

        toml::from_str(&config_toml)
            .map_err(|err| error!("failed to deserialize config TOML: {}.", err))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            qdisc_dir: Self::default_qdisc_dir(),
            emulator_dir: Self::default_emulator_dir(),
            qdisc_file_regex: Self::default_qdisc_file_regex(),
            emulator_file_regex: Self::default_emulator_file_regex(),
            cache_dir: Self::default_cache_dir(),
            mode: Self::default_mode(),
            metric: Self::default_metric(),
            workers: 0,
        }
    }
}
