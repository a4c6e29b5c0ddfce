use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::FileRecord;
use crate::error::PrepError;

/// One line of a GDC Data Transfer Tool manifest. Field order is the
/// manifest column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub filename: String,
    pub md5: String,
    pub size: u64,
    pub state: String,
}

impl From<&FileRecord> for ManifestEntry {
    fn from(file: &FileRecord) -> Self {
        Self {
            id: file.file_id.clone(),
            filename: file.file_name.clone(),
            md5: file.checksum.clone(),
            size: file.size,
            state: file.state.clone(),
        }
    }
}

pub fn manifest_entries(files: &[FileRecord]) -> Vec<ManifestEntry> {
    files.iter().map(ManifestEntry::from).collect()
}

/// Write the manifest as tab-separated text with a header, one line per
/// input row. No filtering, no validation.
pub fn write_manifest(path: &Path, files: &[FileRecord]) -> Result<(), PrepError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|err| PrepError::Delimited(err.to_string()))?;
    for entry in manifest_entries(files) {
        writer
            .serialize(entry)
            .map_err(|err| PrepError::Delimited(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| PrepError::Filesystem(err.to_string()))?;
    Ok(())
}
