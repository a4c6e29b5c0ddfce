use std::path::Path;

use serde_json::Value;

use crate::domain::{ClinicalRecord, NOT_REPORTED, RawClinicalRecord};
use crate::error::PrepError;

/// Reduce repeated follow-up observations to the latest one. Only integer
/// observations count; anything else is ignored. No valid observation
/// means no follow-up.
pub fn last_follow_up(observations: &[Value]) -> Option<i64> {
    observations.iter().filter_map(Value::as_i64).max()
}

/// Survival-data validity as a decision table over (vital status is
/// "Dead", days_to_death present, follow-up present). Contradictory
/// dead/days-to-death pairings are dropped, as are records carrying no
/// outcome signal at all. The alive-with-follow-up row is retained while
/// alive-with-days-to-death rows are not; that asymmetry is deliberate
/// and must not be changed without domain confirmation.
pub fn keep_record(dead: bool, has_days_to_death: bool, has_follow_up: bool) -> bool {
    match (dead, has_days_to_death, has_follow_up) {
        (true, true, true) => true,
        (true, true, false) => true,
        (true, false, true) => false,
        (true, false, false) => false,
        (false, true, true) => false,
        (false, true, false) => false,
        (false, false, true) => true,
        (false, false, false) => false,
    }
}

/// Missing categorical values become the sentinel. Idempotent.
pub fn fill_not_reported(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_REPORTED.to_string())
}

/// Apply the validity filter: reduce follow-ups, drop invalid or unusable
/// records, fill missing categorical fields, and order the survivors by
/// (`project`, `case_id`).
pub fn filter_clinical(raw: Vec<RawClinicalRecord>) -> Vec<ClinicalRecord> {
    let total = raw.len();
    let mut records = Vec::new();
    for record in raw {
        let days_to_last_follow_up = last_follow_up(&record.follow_ups);
        let dead = record.vital_status.as_deref() == Some("Dead");
        if !keep_record(
            dead,
            record.days_to_death.is_some(),
            days_to_last_follow_up.is_some(),
        ) {
            continue;
        }
        records.push(ClinicalRecord {
            case_id: record.case_id,
            project: record.project,
            sex: fill_not_reported(record.sex),
            race: fill_not_reported(record.race),
            ethnicity: fill_not_reported(record.ethnicity),
            vital_status: record.vital_status,
            days_to_death: record.days_to_death,
            days_to_last_follow_up,
        });
    }
    records.sort_by(|a, b| (&a.project, &a.case_id).cmp(&(&b.project, &b.case_id)));
    tracing::info!(
        kept = records.len(),
        dropped = total - records.len(),
        "filtered clinical records"
    );
    records
}

/// Write retained clinical records as comma-separated text with a header.
pub fn write_clinical(path: &Path, records: &[ClinicalRecord]) -> Result<(), PrepError> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|err| PrepError::Delimited(err.to_string()))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|err| PrepError::Delimited(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| PrepError::Filesystem(err.to_string()))?;
    Ok(())
}
