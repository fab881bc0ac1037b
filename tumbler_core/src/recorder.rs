//! Measurement series and their CSV persistence.
//!
//! The timed series is rewritten in full after every sample, so the file on
//! disk always holds the complete series. The write goes through
//! `atomic::write_atomic`, so a crash mid-write leaves the previous version
//! intact.
//!
//! Timed series: headers `elapsed_ms,intensity`.
//! Manual series: headers `label,intensity`.

use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::atomic::write_atomic;
use crate::error::{DissociationError, Result};

pub const SERIES_HEADERS: [&str; 2] = ["elapsed_ms", "intensity"];
pub const LABELED_HEADERS: [&str; 2] = ["label", "intensity"];

/// One turbidity reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Milliseconds since the run started.
    pub elapsed_ms: u64,
    /// Raw sensor counts.
    pub intensity: u32,
}

/// Ordered, append-only sequence of readings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSeries {
    samples: Vec<Sample>,
}

impl SampleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }
}

impl FromIterator<Sample> for SampleSeries {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SampleSeries {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;
    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// One manual reading, labeled by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub label: String,
    pub intensity: u32,
}

pub type LabeledSeries = Vec<LabeledSample>;

/// Owns the series of a run and keeps its file in sync.
#[derive(Debug)]
pub struct DataRecorder {
    path: PathBuf,
    series: SampleSeries,
}

impl DataRecorder {
    /// Recorder for a fresh series. Nothing is written until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            series: SampleSeries::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn series(&self) -> &SampleSeries {
        &self.series
    }

    pub fn into_series(self) -> SampleSeries {
        self.series
    }

    /// Add to the in-memory series without touching the file.
    pub fn push(&mut self, sample: Sample) {
        self.series.push(sample);
    }

    /// Rewrite the file from the full in-memory series.
    pub fn persist(&self) -> Result<()> {
        write_series(&self.path, &self.series)
    }

    /// Record then persist.
    pub fn append(&mut self, sample: Sample) -> Result<()> {
        self.push(sample);
        self.persist()
    }
}

fn io_report(e: impl std::fmt::Display) -> eyre::Report {
    eyre::Report::new(DissociationError::Io(e.to_string()))
}

fn encode<T: Serialize>(headers: [&str; 2], rows: impl IntoIterator<Item = T>) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(headers).map_err(io_report)?;
    for row in rows {
        wtr.serialize(row).map_err(io_report)?;
    }
    wtr.into_inner().map_err(io_report)
}

/// Write a full timed series to `path`, replacing any previous content.
pub fn write_series(path: &Path, series: &SampleSeries) -> Result<()> {
    let bytes = encode(SERIES_HEADERS, series.iter())?;
    write_atomic(path, &bytes)
        .map_err(io_report)
        .wrap_err_with(|| format!("persist series to {}", path.display()))
}

/// Write a labeled series to `path`.
pub fn write_labeled(path: &Path, series: &[LabeledSample]) -> Result<()> {
    let bytes = encode(LABELED_HEADERS, series.iter())?;
    write_atomic(path, &bytes)
        .map_err(io_report)
        .wrap_err_with(|| format!("write labeled series to {}", path.display()))
}

fn read_rows<T: serde::de::DeserializeOwned>(path: &Path, expected: [&str; 2]) -> Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open series CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<&str> = headers.iter().collect();
    if actual != expected {
        eyre::bail!(
            "series CSV must have headers '{}', got: {}",
            expected.join(","),
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<T>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => eyre::bail!("invalid CSV row {}: {}", idx + 2, e),
        }
    }
    Ok(rows)
}

/// Parse a persisted timed series.
pub fn read_series(path: &Path) -> Result<SampleSeries> {
    read_rows::<Sample>(path, SERIES_HEADERS).map(SampleSeries::from_iter)
}

/// Parse a persisted labeled series.
pub fn read_labeled(path: &Path) -> Result<LabeledSeries> {
    read_rows(path, LABELED_HEADERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn series(n: u64) -> SampleSeries {
        (0..n)
            .map(|i| Sample {
                elapsed_ms: 8_000 + i * 306_000,
                intensity: 1_000 + (i as u32) * 17,
            })
            .collect()
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(5)]
    fn series_survives_persist_and_parse(#[case] n: u64) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        let original = series(n);
        write_series(&path, &original).unwrap();
        assert_eq!(read_series(&path).unwrap(), original);
    }

    #[test]
    fn empty_series_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        write_series(&path, &SampleSeries::new()).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "elapsed_ms,intensity\n"
        );
    }

    #[test]
    fn append_rewrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        let mut rec = DataRecorder::new(&path);
        rec.append(Sample {
            elapsed_ms: 10,
            intensity: 5,
        })
        .unwrap();
        rec.append(Sample {
            elapsed_ms: 20,
            intensity: 6,
        })
        .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "elapsed_ms,intensity\n10,5\n20,6\n");
        assert_eq!(rec.series().len(), 2);
    }

    #[test]
    fn labeled_series_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.csv");
        let rows = vec![
            LabeledSample {
                label: "blank".into(),
                intensity: 12,
            },
            LabeledSample {
                label: "tube, 3".into(),
                intensity: 40_000,
            },
        ];
        write_labeled(&path, &rows).unwrap();
        assert_eq!(read_labeled(&path).unwrap(), rows);
    }

    #[test]
    fn rejects_wrong_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "time,value\n1,2\n").unwrap();
        let err = read_series(&path).expect_err("bad headers");
        assert!(format!("{err}").contains("must have headers"));
    }

    #[test]
    fn persist_into_missing_directory_fails_as_io() {
        let dir = tempfile::tempdir().unwrap();
        let rec = DataRecorder::new(dir.path().join("nope").join("run.csv"));
        let err = rec.persist().expect_err("missing parent dir");
        assert!(matches!(
            err.downcast_ref::<DissociationError>(),
            Some(DissociationError::Io(_))
        ));
    }
}
