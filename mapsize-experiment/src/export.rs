use std::fs;
use std::path::{Path, PathBuf};

use mapsize_core::TrialRecord;
use tracing::info;

use crate::error::ExportError;

pub const CSV_HEADER: [&str; 5] = [
    "Experiment Count",
    "Guess",
    "Time Taken (s)",
    "Image Size",
    "Percent Difference",
];

/// Receives the finished session's records.
pub trait Exporter {
    fn export(&mut self, records: &[TrialRecord]) -> Result<(), ExportError>;
}

/// Header plus one comma-joined row per record, rows separated by `\n`.
pub fn to_csv(records: &[TrialRecord]) -> String {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(CSV_HEADER.join(","));
    for r in records {
        rows.push(format!(
            "{},{},{},{},{}",
            r.trial_index, r.response, r.reaction_time_s, r.presented_size_px, r.percent_difference
        ));
    }
    rows.join("\n")
}

/// Writes [`to_csv`] output to `<output_dir>/<file_name>`.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
    file_name: String,
    written: Option<PathBuf>,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_name: file_name.into(),
            written: None,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }

    /// Path of the file once an export has succeeded.
    pub fn written(&self) -> Option<&Path> {
        self.written.as_deref()
    }
}

impl Exporter for CsvExporter {
    fn export(&mut self, records: &[TrialRecord]) -> Result<(), ExportError> {
        let path = self.path();
        fs::create_dir_all(&self.output_dir).map_err(|source| ExportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;
        fs::write(&path, to_csv(records)).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), records = records.len(), "results exported");
        self.written = Some(path);
        Ok(())
    }
}
