use std::fs;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::clinical::{filter_clinical, write_clinical};
use crate::config::QueryConfig;
use crate::error::PrepError;
use crate::gdc::{GdcClient, split_by_strategy};
use crate::manifest::write_manifest;
use crate::organize::{Modality, OrganizePlan, organize_files, write_not_found};
use crate::reconcile::{ReconciledMetadata, reconcile};
use crate::reports::read_reports;

#[derive(Debug, Clone)]
pub struct PrepareOutputs {
    pub clinical_data: Utf8PathBuf,
    pub expr_manifest: Utf8PathBuf,
    pub hist_manifest: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrepareResult {
    pub cases: usize,
    pub clinical_rows: usize,
    pub expression_rows: usize,
    pub histology_rows: usize,
    pub report_rows: usize,
    pub clinical_data: String,
    pub expr_manifest: String,
    pub hist_manifest: Option<String>,
    pub provenance: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizeResult {
    pub items: Vec<OrganizeItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizeItem {
    pub modality: String,
    pub moved: usize,
    pub missing: usize,
    pub not_found_report: Option<String>,
}

#[derive(Debug, Serialize)]
struct Provenance {
    tool: String,
    generated_at: String,
    cases: usize,
    clinical_rows: usize,
    expression_rows: usize,
    histology_rows: usize,
    report_rows: usize,
}

#[derive(Clone)]
pub struct App<G: GdcClient> {
    gdc: G,
    config: QueryConfig,
}

impl<G: GdcClient> App<G> {
    pub fn new(gdc: G, config: QueryConfig) -> Self {
        Self { gdc, config }
    }

    /// Fetch all four modality tables and restrict them to their shared
    /// cases.
    pub fn merged_metadata(&self, reports_path: &Path) -> Result<ReconciledMetadata, PrepError> {
        let files = self.gdc.fetch_files(&self.config)?;
        let (expression, histology) = split_by_strategy(files, &self.config);
        let clinical = filter_clinical(self.gdc.fetch_cases(&self.config)?);
        let reports = read_reports(reports_path)?;
        Ok(reconcile(clinical, expression, histology, reports))
    }

    /// Download-preparation path: clinical CSV, transfer manifests, and a
    /// provenance sidecar.
    pub fn prepare(
        &self,
        reports_path: &Path,
        outputs: &PrepareOutputs,
    ) -> Result<PrepareResult, PrepError> {
        let merged = self.merged_metadata(reports_path)?;

        write_clinical(outputs.clinical_data.as_std_path(), &merged.clinical)?;
        write_manifest(outputs.expr_manifest.as_std_path(), &merged.expression)?;
        if let Some(hist_manifest) = &outputs.hist_manifest {
            write_manifest(hist_manifest.as_std_path(), &merged.histology)?;
        }

        let provenance_path =
            Utf8PathBuf::from(format!("{}.provenance.json", outputs.clinical_data));
        let provenance = Provenance {
            tool: format!("gdc-prep/{}", env!("CARGO_PKG_VERSION")),
            generated_at: iso_timestamp(),
            cases: merged.clinical.len(),
            clinical_rows: merged.clinical.len(),
            expression_rows: merged.expression.len(),
            histology_rows: merged.histology.len(),
            report_rows: merged.reports.len(),
        };
        write_json_atomic(&provenance_path, &provenance)?;

        Ok(PrepareResult {
            cases: merged.clinical.len(),
            clinical_rows: merged.clinical.len(),
            expression_rows: merged.expression.len(),
            histology_rows: merged.histology.len(),
            report_rows: merged.reports.len(),
            clinical_data: outputs.clinical_data.to_string(),
            expr_manifest: outputs.expr_manifest.to_string(),
            hist_manifest: outputs.hist_manifest.as_ref().map(|path| path.to_string()),
            provenance: provenance_path.to_string(),
        })
    }

    /// Post-download path: relocate downloaded files into the canonical
    /// per-case layout, one plan per modality. Not-found reports land in
    /// `report_dir`, only for plans with unmet expectations.
    pub fn organize(
        &self,
        reports_path: &Path,
        plans: &[OrganizePlan],
        report_dir: &Utf8Path,
    ) -> Result<OrganizeResult, PrepError> {
        let merged = self.merged_metadata(reports_path)?;
        let mut items = Vec::new();
        for plan in plans {
            let table = match plan.modality {
                Modality::Expression => &merged.expression,
                Modality::Histology => &merged.histology,
            };
            tracing::info!(
                modality = plan.modality.label(),
                source = %plan.source,
                destination = %plan.destination,
                "organizing downloaded files"
            );
            let report = organize_files(table, &plan.source, &plan.destination, plan.rewrite.as_ref())?;
            let not_found_report = if report.not_found.is_empty() {
                None
            } else {
                let path = report_dir.join(format!("{}-not-found.csv", plan.modality.label()));
                write_not_found(path.as_std_path(), &report.not_found)?;
                Some(path.to_string())
            };
            items.push(OrganizeItem {
                modality: plan.modality.label().to_string(),
                moved: report.moved,
                missing: report.not_found.len(),
                not_found_report,
            });
        }
        Ok(OrganizeResult { items })
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn write_json_atomic<T: Serialize>(path: &Utf8Path, value: &T) -> Result<(), PrepError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    fs::create_dir_all(dir.as_std_path())
        .map_err(|err| PrepError::Filesystem(err.to_string()))?;
    let content =
        serde_json::to_vec_pretty(value).map_err(|err| PrepError::Filesystem(err.to_string()))?;
    let temp = tempfile::Builder::new()
        .prefix(".provenance")
        .tempfile_in(dir.as_std_path())
        .map_err(|err| PrepError::Filesystem(err.to_string()))?;
    fs::write(temp.path(), &content).map_err(|err| PrepError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| PrepError::Filesystem(err.to_string()))?;
    Ok(())
}
