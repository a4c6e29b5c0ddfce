use std::path::Path;

use serde::Deserialize;

use crate::domain::{TextReport, case_id_from_filename};
use crate::error::PrepError;

#[derive(Debug, Deserialize)]
struct ReportRow {
    patient_filename: String,
    text: String,
}

/// Read the free-text report table. Rows keep their file order; `case_id`
/// is derived from the patient filename.
pub fn read_reports(path: &Path) -> Result<Vec<TextReport>, PrepError> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| PrepError::ReportsRead {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let mut reports = Vec::new();
    for row in reader.deserialize() {
        let row: ReportRow = row.map_err(|err| PrepError::ReportsRead {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let case_id = case_id_from_filename(&row.patient_filename);
        reports.push(TextReport {
            patient_filename: row.patient_filename,
            case_id,
            text: row.text,
        });
    }
    tracing::info!(rows = reports.len(), "read text reports");
    Ok(reports)
}
