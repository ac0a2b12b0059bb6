//! The `prf` property file: an ini-like `key<TAB>value` persisted format
//! for an index's creation-time parameters.
//!
//! Deliberately separate from [`crate::config`]: `config` is process-wide
//! ambient configuration (logging, storage defaults) loaded once at
//! startup; `prf` is per-index state that travels with the index directory
//! and is read back by `open`.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use crate::error::{Error, Result};

/// The recognised `prf` keys, as a typed property bag. Unrecognised keys
/// are preserved verbatim in `entries` so a round trip through
/// [`PropertyFile::save`]/[`PropertyFile::open`] doesn't lose them.
#[derive(Debug, Clone, Default)]
pub struct PropertyFile {
    entries: BTreeMap<String, String>,
}

impl PropertyFile {
    /// An empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, overwriting any previous value.
    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    /// Reads `key` as a `String`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Reads `key` parsed as `usize`.
    ///
    /// # Errors
    /// [`Error::Corrupt`] if the key is present but doesn't parse.
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>> {
        self.entries
            .get(key)
            .map(|v| {
                v.parse()
                    .map_err(|_| Error::Corrupt(format!("property {key} is not a usize: {v}")))
            })
            .transpose()
    }

    /// Reads `key` parsed as `i64`, for properties that can carry a
    /// negative sentinel (e.g. `EdgeSizeForSearch = -2`).
    ///
    /// # Errors
    /// [`Error::Corrupt`] if the key is present but doesn't parse.
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        self.entries
            .get(key)
            .map(|v| {
                v.parse()
                    .map_err(|_| Error::Corrupt(format!("property {key} is not an i64: {v}")))
            })
            .transpose()
    }

    /// Reads `key` parsed as `f32`.
    ///
    /// # Errors
    /// [`Error::Corrupt`] if the key is present but doesn't parse.
    pub fn get_f32(&self, key: &str) -> Result<Option<f32>> {
        self.entries
            .get(key)
            .map(|v| {
                v.parse()
                    .map_err(|_| Error::Corrupt(format!("property {key} is not an f32: {v}")))
            })
            .transpose()
    }

    /// Writes every entry as `key\tvalue\n`, sorted by key for a stable
    /// byte-for-byte diff across saves.
    ///
    /// # Errors
    /// [`Error::Io`] on a write failure.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<()> {
        for (k, v) in &self.entries {
            writeln!(writer, "{k}\t{v}")?;
        }
        Ok(())
    }

    /// Parses a property file previously written by [`Self::save`].
    ///
    /// # Errors
    /// [`Error::Corrupt`] if a line has no tab separator;
    /// [`Error::Io`] on a read failure.
    pub fn open<R: BufRead>(reader: R) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once('\t')
                .ok_or_else(|| Error::Corrupt(format!("malformed property line: {line:?}")))?;
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(Self { entries })
    }
}

/// The recognised key names, as constants to avoid typos scattered across
/// call sites.
pub mod keys {
    /// Logical vector dimension.
    pub const DIMENSION: &str = "Dimension";
    /// `ScalarKind` name.
    pub const OBJECT_TYPE: &str = "ObjectType";
    /// `Metric` name.
    pub const METRIC_TYPE: &str = "MetricType";
    /// `GraphKind` name.
    pub const GRAPH_TYPE: &str = "GraphType";
    /// `edge_size_for_creation`.
    pub const EDGE_SIZE_FOR_CREATION: &str = "EdgeSizeForCreation";
    /// `edge_size_for_search`.
    pub const EDGE_SIZE_FOR_SEARCH: &str = "EdgeSizeForSearch";
    /// `edge_size_limit_for_creation`.
    pub const EDGE_SIZE_LIMIT_FOR_CREATION: &str = "EdgeSizeLimitForCreation";
    /// `truncation_threshold`.
    pub const TRUNCATION_THRESHOLD: &str = "IncrimentalEdgeSizeLimitForTruncation";
    /// `insertion_epsilon`.
    pub const EPSILON_FOR_CREATION: &str = "EpsilonForCreation";
    /// `batch_size`.
    pub const BATCH_SIZE_FOR_CREATION: &str = "BatchSizeForCreation";
    /// Seed set size.
    pub const SEED_SIZE: &str = "SeedSize";
    /// `seed_kind`.
    pub const SEED_TYPE: &str = "SeedType";
    /// `build_time_limit_sec`.
    pub const BUILD_TIME_LIMIT: &str = "BuildTimeLimit";
    /// ONNG outgoing cap.
    pub const OUTGOING_EDGE: &str = "OutgoingEdge";
    /// ONNG incoming cap.
    pub const INCOMING_EDGE: &str = "IncomingEdge";
    /// `dynamic_edge_size_base`.
    pub const DYNAMIC_EDGE_SIZE_BASE: &str = "DynamicEdgeSizeBase";
    /// `dynamic_edge_size_rate`.
    pub const DYNAMIC_EDGE_SIZE_RATE: &str = "DynamicEdgeSizeRate";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_open_round_trips_values() {
        let mut props = PropertyFile::new();
        props.set(keys::DIMENSION, 128);
        props.set(keys::METRIC_TYPE, "L2");
        let mut buf = Vec::new();
        props.save(&mut buf).unwrap();

        let reopened = PropertyFile::open(&buf[..]).unwrap();
        assert_eq!(reopened.get_usize(keys::DIMENSION).unwrap(), Some(128));
        assert_eq!(reopened.get(keys::METRIC_TYPE), Some("L2"));
    }

    #[test]
    fn get_i64_reads_negative_sentinels() {
        let mut props = PropertyFile::new();
        props.set(keys::EDGE_SIZE_FOR_SEARCH, -2i64);
        assert_eq!(props.get_i64(keys::EDGE_SIZE_FOR_SEARCH).unwrap(), Some(-2));
    }

    #[test]
    fn malformed_line_is_corrupt() {
        let bad = b"no-tab-here\n".as_slice();
        assert!(matches!(PropertyFile::open(bad), Err(Error::Corrupt(_))));
    }
}
