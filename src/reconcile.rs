use std::collections::HashSet;

use crate::domain::{ClinicalRecord, FileRecord, HasCaseId, TextReport};

/// All four modality tables restricted to their shared cases.
#[derive(Debug, Clone)]
pub struct ReconciledMetadata {
    pub clinical: Vec<ClinicalRecord>,
    pub expression: Vec<FileRecord>,
    pub histology: Vec<FileRecord>,
    pub reports: Vec<TextReport>,
}

pub fn case_set<T: HasCaseId>(rows: &[T]) -> HashSet<String> {
    rows.iter().map(|row| row.case_id().to_string()).collect()
}

/// Keep only rows whose case is in the given set, preserving row order.
/// Tables are not deduplicated: every row of a shared case survives.
pub fn retain_cases<T: HasCaseId>(rows: Vec<T>, cases: &HashSet<String>) -> Vec<T> {
    rows.into_iter()
        .filter(|row| cases.contains(row.case_id()))
        .collect()
}

/// Restrict all four tables to the intersection of their case sets. An
/// empty intersection is valid and yields four empty tables.
pub fn reconcile(
    clinical: Vec<ClinicalRecord>,
    expression: Vec<FileRecord>,
    histology: Vec<FileRecord>,
    reports: Vec<TextReport>,
) -> ReconciledMetadata {
    let mut cases = case_set(&clinical);
    for other in [
        case_set(&expression),
        case_set(&histology),
        case_set(&reports),
    ] {
        cases.retain(|case| other.contains(case));
    }
    tracing::info!(cases = cases.len(), "using cases present in all modalities");

    ReconciledMetadata {
        clinical: retain_cases(clinical, &cases),
        expression: retain_cases(expression, &cases),
        histology: retain_cases(histology, &cases),
        reports: retain_cases(reports, &cases),
    }
}
