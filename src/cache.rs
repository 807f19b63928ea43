//! Persistent cache of computed distances.
//!
//! Computing a DTW distance is by far the most expensive operation in the engine, so every
//! computed distance is persisted and never recomputed. The cache is an append-only text file,
//! one comma-separated `i,j,distance` record per line, with one file per comparison kind. Each
//! record is written immediately after its distance is computed, so a killed run preserves all
//! completed work.

use std::{
    collections::HashMap,
    fmt,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    str,
};

use serde::{Deserialize, Serialize};

use crate::{error::QuedistError, series::SourceKind};

/// The kind of comparison a distance entry belongs to.
///
/// Same-kind comparisons are symmetric: the entry for `(i, j)` and `(j, i)` denote the same
/// value. Cross-kind entries are not; `i` always indexes a qdisc series and `j` an emulator
/// series.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComparisonKind {
    /// Qdisc series compared among themselves.
    #[serde(rename = "qdisc")]
    Qdisc,
    /// Emulator series compared among themselves.
    #[serde(rename = "emulator")]
    Emulator,
    /// Qdisc series compared against emulator series.
    #[serde(rename = "cross")]
    Cross,
}

impl ComparisonKind {
    /// Check if entries of this kind are symmetric in their indices.
    pub fn is_symmetric(&self) -> bool {
        !matches!(self, Self::Cross)
    }

    /// Get the source kinds of the left and right sides of a comparison of this kind.
    pub fn source_kinds(&self) -> (SourceKind, SourceKind) {
        match self {
            Self::Qdisc => (SourceKind::Qdisc, SourceKind::Qdisc),
            Self::Emulator => (SourceKind::Emulator, SourceKind::Emulator),
            Self::Cross => (SourceKind::Qdisc, SourceKind::Emulator),
        }
    }

    /// Get the name of the cache file backing this kind of comparison.
    pub fn cache_file_name(&self) -> &'static str {
        match self {
            Self::Qdisc => "dtw_cache_qdisc.txt",
            Self::Emulator => "dtw_cache_emulator.txt",
            Self::Cross => "dtw_cache_cross.txt",
        }
    }
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Qdisc => "qdisc",
                Self::Emulator => "emulator",
                Self::Cross => "cross",
            }
        )
    }
}

impl str::FromStr for ComparisonKind {
    type Err = QuedistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qdisc" => Ok(Self::Qdisc),
            "emulator" => Ok(Self::Emulator),
            "cross" => Ok(Self::Cross),
            unknown => fail!("invalid comparison kind '{}'.", unknown),
        }
    }
}

/// The persisted distances for one comparison kind.
///
/// The in-memory mapping is a read-through projection of the on-disk file; for symmetric
/// comparison kinds every entry is resolvable under both index orders, while the file only ever
/// stores the canonical record.
#[derive(Debug)]
pub struct DistanceCache {
    file: PathBuf,
    kind: ComparisonKind,
    distances: HashMap<(u32, u32), f64>,
    corrupt_lines: usize,
}

impl DistanceCache {
    /// Load the cache for a comparison kind from a cache directory.
    ///
    /// A missing cache file simply yields an empty cache. Lines that do not split into the
    /// expected fields are counted and skipped, so a corrupt line never hides the rest of the
    /// file. If a pair somehow appears twice, the last record wins.
    pub fn load(cache_dir: &Path, kind: ComparisonKind) -> Result<Self, QuedistError> {
        let file = cache_dir.join(kind.cache_file_name());
        let mut cache = DistanceCache {
            file: file.clone(),
            kind,
            distances: HashMap::new(),
            corrupt_lines: 0,
        };

        if !file.is_file() {
            return Ok(cache);
        }

        let content = fs::read_to_string(&file)
            .map_err(|err| error!("could not read cache file '{}': {}.", file.display(), err))?;

        for line in content.lines() {
            let fields: Vec<&str> = line.trim().split(',').collect();
            let record = match fields.as_slice() {
                [i, j, distance] => i
                    .parse::<u32>()
                    .ok()
                    .zip(j.parse::<u32>().ok())
                    .zip(distance.parse::<f64>().ok())
                    .map(|((i, j), distance)| (i, j, distance)),
                _ => None,
            };

            match record {
                Some((i, j, distance)) => cache.insert(i, j, distance),
                None => cache.corrupt_lines += 1,
            }
        }

        Ok(cache)
    }

    /// Append a newly computed distance to the cache.
    ///
    /// The record is written through to disk before this function returns. A write failure
    /// leaves the in-memory mapping updated anyway, so the distance is still usable for the
    /// current run; it will simply be recomputed by the next one.
    pub fn append(&mut self, i: u32, j: u32, distance: f64) -> Result<(), QuedistError> {
        self.insert(i, j, distance);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)
            .map_err(|err| {
                error!(
                    "could not open cache file '{}' for appending: {}.",
                    self.file.display(),
                    err
                )
            })?;

        writeln!(file, "{},{},{:.6}", i, j, distance).map_err(|err| {
            error!(
                "could not append to cache file '{}': {}.",
                self.file.display(),
                err
            )
        })
    }

    /// Check if a distance is cached for a pair of series.
    ///
    /// For symmetric comparison kinds, either index order resolves.
    pub fn contains(&self, i: u32, j: u32) -> bool {
        self.distances.contains_key(&(i, j))
    }

    /// Look up the cached distance for a pair of series.
    pub fn get(&self, i: u32, j: u32) -> Option<f64> {
        self.distances.get(&(i, j)).copied()
    }

    /// Get the full mapping of cached distances.
    pub fn distances(&self) -> &HashMap<(u32, u32), f64> {
        &self.distances
    }

    /// Get the number of cached pairs (symmetric aliases are not double-counted).
    pub fn len(&self) -> usize {
        match self.kind.is_symmetric() {
            true => self
                .distances
                .keys()
                .filter(|(i, j)| i <= j)
                .count(),
            false => self.distances.len(),
        }
    }

    /// Check if the cache holds no distances.
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Get the number of lines that failed to parse when the cache was loaded.
    pub fn corrupt_lines(&self) -> usize {
        self.corrupt_lines
    }

    fn insert(&mut self, i: u32, j: u32, distance: f64) {
        self.distances.insert((i, j), distance);
        if self.kind.is_symmetric() {
            self.distances.insert((j, i), distance);
        }
    }
}
