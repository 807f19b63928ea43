//! Queue-occupancy series & trace log parsing.
//!
//! A series is the ordered sequence of queue-occupancy samples (in bytes) extracted from a trace
//! log. Two log formats are supported: the line-oriented dumps of the real kernel queueing
//! discipline, and the logs produced by the network emulator. Both parsers are tolerant of
//! malformed content: a line that does not match the expected shape simply contributes no sample.

use std::{
    collections::BTreeMap,
    fmt, fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    str,
};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::QuedistError;

/// A line like `------ Mon 01 Jan 00:00:00 ------`, marking the start of a qdisc stats dump.
static QDISC_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^------ .+ ------\s*$").expect("failed to compile marker regex.")
});
/// The backlog report inside a qdisc stats dump, e.g. `backlog 1514b 1p`.
static QDISC_BACKLOG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"backlog\s+(\d+)b\s+(\d+)p").expect("failed to compile backlog regex.")
});

/// The marker for queue-occupancy reports in emulator logs.
const EMULATOR_MARKER: &str = "queue size in bytes:";

/// The origin format of a trace log.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A line-oriented dump of the real kernel queueing discipline's stats.
    #[serde(rename = "qdisc")]
    Qdisc,
    /// A log produced by the network emulator.
    #[serde(rename = "emulator")]
    Emulator,
}

impl SourceKind {
    /// Get the default file-name pattern for this kind of trace log.
    ///
    /// The first capture group of the pattern is the decimal index of the series.
    pub fn default_file_regex(&self) -> &'static str {
        match self {
            Self::Qdisc => r"^qdisc_(\d+)\.log$",
            Self::Emulator => r"^output_(\d+)\.txt$",
        }
    }

    /// Extract the queue-occupancy samples from a trace log.
    ///
    /// Malformed lines are skipped; only a failure to read from the source is an error.
    pub fn extract_samples<R: BufRead>(&self, reader: R) -> Result<Vec<u64>, QuedistError> {
        match self {
            Self::Qdisc => extract_qdisc_samples(reader),
            Self::Emulator => extract_emulator_samples(reader),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Qdisc => "qdisc",
                Self::Emulator => "emulator",
            }
        )
    }
}

impl str::FromStr for SourceKind {
    type Err = QuedistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qdisc" => Ok(Self::Qdisc),
            "emulator" => Ok(Self::Emulator),
            unknown => fail!("invalid source kind '{}'.", unknown),
        }
    }
}

/// A queue-occupancy series extracted from a trace log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Series {
    /// The index identifying the series within its kind.
    pub index: u32,
    /// The kind of trace log the series was extracted from.
    pub kind: SourceKind,
    /// The occupancy samples, in bytes, in log order.
    pub samples: Vec<u64>,
}

impl Series {
    /// Load a series from a trace log file.
    ///
    /// # Arguments
    /// * `index` - The index to identify the series by.
    /// * `kind` - The kind of trace log to parse the file as.
    /// * `file` - The trace log file.
    pub fn load(index: u32, kind: SourceKind, file: &Path) -> Result<Self, QuedistError> {
        let reader = fs::File::open(file)
            .map(BufReader::new)
            .map_err(|err| error!("could not open trace log '{}': {}.", file.display(), err))?;
        let samples = kind
            .extract_samples(reader)
            .map_err(|err| error!("could not read trace log '{}': {}.", file.display(), err))?;

        Ok(Series {
            index,
            kind,
            samples,
        })
    }

    /// Get the number of samples in the series.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the series contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get the total occupancy mass of the series, in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.samples.iter().sum()
    }
}

/// The series found in a directory of trace logs.
#[derive(Debug)]
pub struct ResolvedSeries {
    /// The series, keyed by index.
    pub series: BTreeMap<u32, Series>,
    /// The files that matched the pattern but could not be read.
    pub skipped_files: Vec<(PathBuf, QuedistError)>,
}

/// Extract samples from a qdisc stats dump.
///
/// A marker line arms the parser; while armed, the next backlog report yields its byte count and
/// disarms it. Anything in between is ignored, as is anything outside an armed window.
fn extract_qdisc_samples<R: BufRead>(reader: R) -> Result<Vec<u64>, QuedistError> {
    let mut samples = Vec::new();
    let mut pending = false;

    for line in reader.lines() {
        let line = line.map_err(|err| error!("{}", err))?;

        if QDISC_MARKER.is_match(&line) {
            pending = true;
            continue;
        }

        if pending {
            if let Some(captures) = QDISC_BACKLOG.captures(&line) {
                // The capture is all digits, so a parse failure can only be an overflow; such a
                // line is treated like any other malformed line.
                if let Ok(bytes) = captures[1].parse::<u64>() {
                    samples.push(bytes);
                    pending = false;
                }
            }
        }
    }

    Ok(samples)
}

/// Extract samples from an emulator log.
///
/// Every line containing the queue-size marker contributes the integer after its last colon;
/// lines where that token does not parse are skipped.
fn extract_emulator_samples<R: BufRead>(reader: R) -> Result<Vec<u64>, QuedistError> {
    let mut samples = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|err| error!("{}", err))?;

        if line.contains(EMULATOR_MARKER) {
            if let Some(token) = line.rsplit(':').next() {
                if let Ok(bytes) = token.trim().parse::<u64>() {
                    samples.push(bytes);
                }
            }
        }
    }

    Ok(samples)
}

/// Resolve all the series available in a directory of trace logs.
///
/// File names are matched against `file_regex`, whose first capture group must be the decimal
/// index of the series. Files are visited in sorted order, so resolution is deterministic.
/// Files that match but cannot be read are collected in
/// [skipped_files](ResolvedSeries::skipped_files) rather than failing the resolution; empty
/// series are kept in the mapping so that callers can report them.
///
/// # Arguments
/// * `dir` - The directory containing the trace logs.
/// * `file_regex` - The file-name pattern; group 1 captures the series index.
/// * `kind` - The kind of trace log to parse the files as.
pub fn resolve_series(
    dir: &Path,
    file_regex: &Regex,
    kind: SourceKind,
) -> Result<ResolvedSeries, QuedistError> {
    if file_regex.captures_len() < 2 {
        fail!(
            "file pattern '{}' has no capture group for the series index.",
            file_regex.as_str()
        )?;
    }

    let mut file_names: Vec<String> = fs::read_dir(dir)
        .map_err(|err| error!("invalid trace log directory '{}': {}.", dir.display(), err))?
        // Ignore files/dirs we cannot read.
        .filter_map(|item| item.ok())
        .filter(|item| item.path().is_file())
        .filter_map(|item| item.file_name().into_string().ok())
        .collect();

    // Make sure the file names are sorted so that we have consistency when loading.
    file_names.sort();

    let mut resolved = ResolvedSeries {
        series: BTreeMap::new(),
        skipped_files: Vec::new(),
    };

    for file_name in file_names {
        let index = match file_regex
            .captures(&file_name)
            .and_then(|captures| captures.get(1))
            .and_then(|index| index.as_str().parse::<u32>().ok())
        {
            Some(index) => index,
            None => continue,
        };

        let file = dir.join(&file_name);
        match Series::load(index, kind, &file) {
            Ok(series) => {
                resolved.series.insert(index, series);
            }
            Err(err) => resolved.skipped_files.push((file, err)),
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn qdisc_samples_follow_markers() {
        let log = "\
------ Mon 01 Jan 00:00:01 ------\n\
qdisc fq_codel 0: dev eth0 root refcnt 2 limit 10240p\n\
 backlog 1514b 1p requeues 0\n\
------ Mon 01 Jan 00:00:02 ------\n\
 Sent 4542 bytes 3 pkt (dropped 0, overlimits 0 requeues 0)\n\
 backlog 3028b 2p requeues 0\n\
 backlog 9999b 9p requeues 0\n";
        let samples = extract_qdisc_samples(Cursor::new(log)).unwrap();

        // Only the first backlog report after each marker counts.
        assert_eq!(samples, vec![1514, 3028]);
    }

    #[test]
    fn qdisc_backlog_outside_window_is_ignored() {
        let log = " backlog 1514b 1p requeues 0\n backlog 3028b 2p requeues 0\n";
        let samples = extract_qdisc_samples(Cursor::new(log)).unwrap();

        assert!(samples.is_empty());
    }

    #[test]
    fn qdisc_window_stays_armed_until_backlog() {
        let log = "\
------ Mon 01 Jan 00:00:01 ------\n\
qdisc fq_codel 0: dev eth0 root\n\
 Sent 4542 bytes 3 pkt\n\
 backlog 42b 1p requeues 0\n";
        let samples = extract_qdisc_samples(Cursor::new(log)).unwrap();

        assert_eq!(samples, vec![42]);
    }

    #[test]
    fn emulator_samples_parse_after_last_colon() {
        let log = "\
[12:00:01] queue size in bytes: 1514\n\
unrelated line\n\
queue size in bytes: not-a-number\n\
queue size in bytes: 0\n";
        let samples = extract_emulator_samples(Cursor::new(log)).unwrap();

        assert_eq!(samples, vec![1514, 0]);
    }

    #[test]
    fn resolve_series_indexes_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("qdisc_2.log"),
            "------ x ------\n backlog 10b 1p\n",
        )
        .unwrap();
        fs::write(dir.path().join("qdisc_10.log"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let file_regex = Regex::new(SourceKind::Qdisc.default_file_regex()).unwrap();
        let resolved = resolve_series(dir.path(), &file_regex, SourceKind::Qdisc).unwrap();

        assert_eq!(
            resolved.series.keys().copied().collect::<Vec<u32>>(),
            vec![2, 10]
        );
        assert_eq!(resolved.series[&2].samples, vec![10]);
        // Empty series are resolved, not silently dropped.
        assert!(resolved.series[&10].is_empty());
        assert!(resolved.skipped_files.is_empty());
    }

    #[test]
    fn resolve_series_rejects_patterns_without_index_group() {
        let dir = tempfile::tempdir().unwrap();
        let file_regex = Regex::new(r"^qdisc_\d+\.log$").unwrap();

        assert!(resolve_series(dir.path(), &file_regex, SourceKind::Qdisc).is_err());
    }
}
