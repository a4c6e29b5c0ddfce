use serde::{Deserialize, Serialize};

/// Length of the patient barcode prefix shared by case identifiers and
/// report filenames (e.g. `TCGA-A1-A0SB`).
pub const PATIENT_BARCODE_LEN: usize = 12;

/// Sentinel stored in place of missing categorical clinical fields.
pub const NOT_REPORTED: &str = "not reported";

/// Rows that can be restricted to a shared case set.
pub trait HasCaseId {
    fn case_id(&self) -> &str;
}

/// One file known to the registry, expression or histology alike.
/// `experimental_strategy` is only used to split a combined query result
/// into the two variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: String,
    pub file_name: String,
    pub case_id: String,
    pub project: String,
    pub size: u64,
    pub checksum: String,
    pub state: String,
    pub experimental_strategy: String,
}

impl HasCaseId for FileRecord {
    fn case_id(&self) -> &str {
        &self.case_id
    }
}

/// Per-case demographics and outcome fields as returned by the registry,
/// before the validity filter. Follow-up observations stay untyped here:
/// only integer observations count, and that decision belongs to the
/// filter, not the client.
#[derive(Debug, Clone)]
pub struct RawClinicalRecord {
    pub case_id: String,
    pub project: String,
    pub sex: Option<String>,
    pub race: Option<String>,
    pub ethnicity: Option<String>,
    pub vital_status: Option<String>,
    pub days_to_death: Option<i64>,
    pub follow_ups: Vec<serde_json::Value>,
}

/// A clinical record that survived the validity filter. Categorical fields
/// are never missing; `vital_status` may be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    pub case_id: String,
    pub project: String,
    pub sex: String,
    pub race: String,
    pub ethnicity: String,
    pub vital_status: Option<String>,
    pub days_to_death: Option<i64>,
    pub days_to_last_follow_up: Option<i64>,
}

impl HasCaseId for ClinicalRecord {
    fn case_id(&self) -> &str {
        &self.case_id
    }
}

/// One free-text pathology report. `case_id` is derived from the report
/// filename, not carried by the source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextReport {
    pub patient_filename: String,
    pub case_id: String,
    pub text: String,
}

impl HasCaseId for TextReport {
    fn case_id(&self) -> &str {
        &self.case_id
    }
}

/// Derive the case identifier from a report filename: the patient barcode
/// prefix, or the whole name when shorter.
pub fn case_id_from_filename(patient_filename: &str) -> String {
    patient_filename.chars().take(PATIENT_BARCODE_LEN).collect()
}
