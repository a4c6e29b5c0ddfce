use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::{ModalityFilter, QueryConfig};
use crate::domain::{FileRecord, RawClinicalRecord};
use crate::error::PrepError;

const FILE_FIELDS: &[&str] = &[
    "file_name",
    "cases.project.project_id",
    "cases.submitter_id",
    "experimental_strategy",
    "file_size",
    "md5sum",
    "state",
];

const CASE_FIELDS: &[&str] = &[
    "project.project_id",
    "submitter_id",
    "demographic.days_to_death",
    "demographic.vital_status",
    "follow_ups.days_to_follow_up",
    "demographic.ethnicity",
    "demographic.gender",
    "demographic.race",
];

pub trait GdcClient: Send + Sync {
    /// Combined expression + histology file metadata, sorted by
    /// (`project`, `case_id`).
    fn fetch_files(&self, config: &QueryConfig) -> Result<Vec<FileRecord>, PrepError>;

    /// Per-case demographics and outcome fields, unfiltered.
    fn fetch_cases(&self, config: &QueryConfig) -> Result<Vec<RawClinicalRecord>, PrepError>;
}

#[derive(Clone)]
pub struct GdcHttpClient {
    client: Client,
}

impl GdcHttpClient {
    pub fn new() -> Result<Self, PrepError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("gdc-prep/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PrepError::GdcHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| PrepError::GdcHttp(err.to_string()))?;
        Ok(Self { client })
    }

    fn get_text(&self, url: &str, params: &[(&str, String)]) -> Result<String, PrepError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .map_err(|err| PrepError::GdcHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "GDC request failed".to_string());
            return Err(PrepError::GdcStatus { status, message });
        }
        response.text().map_err(|err| PrepError::GdcHttp(err.to_string()))
    }
}

impl GdcClient for GdcHttpClient {
    fn fetch_files(&self, config: &QueryConfig) -> Result<Vec<FileRecord>, PrepError> {
        let url = format!("{}/files", config.base_url);
        let params = [
            ("filters", files_filter(config).to_string()),
            ("fields", FILE_FIELDS.join(",")),
            ("format", "TSV".to_string()),
            ("size", config.max_query_size.to_string()),
        ];
        let body = self.get_text(&url, &params)?;
        let mut files = parse_files_tsv(&body)?;
        files.sort_by(|a, b| (&a.project, &a.case_id).cmp(&(&b.project, &b.case_id)));
        check_result_ceiling(files.len(), config.max_query_size, "files");
        tracing::info!(rows = files.len(), "retrieved file metadata");
        Ok(files)
    }

    fn fetch_cases(&self, config: &QueryConfig) -> Result<Vec<RawClinicalRecord>, PrepError> {
        let url = format!("{}/cases", config.base_url);
        let params = [
            ("filters", cases_filter(config).to_string()),
            ("fields", CASE_FIELDS.join(",")),
            ("format", "JSON".to_string()),
            ("size", config.max_query_size.to_string()),
        ];
        let body = self.get_text(&url, &params)?;
        let cases = parse_cases_json(&body)?;
        check_result_ceiling(cases.len(), config.max_query_size, "cases");
        tracing::info!(rows = cases.len(), "retrieved clinical metadata");
        Ok(cases)
    }
}

/// A result set exactly at the query ceiling may have been silently
/// truncated by the registry.
pub fn check_result_ceiling(rows: usize, max_query_size: usize, endpoint: &str) {
    if rows == max_query_size {
        tracing::warn!(
            rows,
            max_query_size,
            endpoint,
            "retrieved entries equal to the query ceiling, rows may be missing; \
             consider increasing the limit"
        );
    }
}

fn in_clause(field: &str, values: &[String]) -> Value {
    json!({ "op": "in", "content": { "field": field, "value": values } })
}

pub fn modality_filter(filter: &ModalityFilter) -> Value {
    let mut content = vec![in_clause(
        "files.experimental_strategy",
        std::slice::from_ref(&filter.experimental_strategy),
    )];
    if !filter.data_formats.is_empty() {
        content.push(in_clause("files.data_format", &filter.data_formats));
    }
    if !filter.data_types.is_empty() {
        content.push(in_clause("files.data_type", &filter.data_types));
    }
    json!({ "op": "and", "content": content })
}

pub fn files_filter(config: &QueryConfig) -> Value {
    json!({
        "op": "and",
        "content": [
            in_clause(
                "cases.project.program.name",
                std::slice::from_ref(&config.program),
            ),
            in_clause(
                "cases.samples.tissue_type",
                std::slice::from_ref(&config.tissue_type),
            ),
            {
                "op": "or",
                "content": [
                    modality_filter(&config.histology),
                    modality_filter(&config.expression),
                ]
            },
        ]
    })
}

pub fn cases_filter(config: &QueryConfig) -> Value {
    json!({
        "op": "and",
        "content": [in_clause(
            "cases.project.program.name",
            std::slice::from_ref(&config.program),
        )]
    })
}

#[derive(Debug, Deserialize)]
struct GdcFileRow {
    id: String,
    file_name: String,
    #[serde(rename = "cases.0.project.project_id")]
    project: String,
    #[serde(rename = "cases.0.submitter_id")]
    case_id: String,
    experimental_strategy: String,
    file_size: u64,
    md5sum: String,
    state: String,
}

pub fn parse_files_tsv(body: &str) -> Result<Vec<FileRecord>, PrepError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(body.as_bytes());
    let mut files = Vec::new();
    for row in reader.deserialize() {
        let row: GdcFileRow = row.map_err(|err| PrepError::GdcParse(err.to_string()))?;
        files.push(FileRecord {
            file_id: row.id,
            file_name: row.file_name,
            case_id: row.case_id,
            project: row.project,
            size: row.file_size,
            checksum: row.md5sum,
            state: row.state,
            experimental_strategy: row.experimental_strategy,
        });
    }
    Ok(files)
}

#[derive(Debug, Deserialize)]
struct GdcCasesResponse {
    data: GdcCasesData,
}

#[derive(Debug, Deserialize)]
struct GdcCasesData {
    hits: Vec<GdcCaseHit>,
}

#[derive(Debug, Deserialize)]
struct GdcCaseHit {
    submitter_id: String,
    project: GdcProject,
    #[serde(default)]
    demographic: Option<GdcDemographic>,
    #[serde(default)]
    follow_ups: Vec<GdcFollowUp>,
}

#[derive(Debug, Deserialize)]
struct GdcProject {
    project_id: String,
}

#[derive(Debug, Deserialize)]
struct GdcDemographic {
    #[serde(default)]
    vital_status: Option<String>,
    #[serde(default)]
    days_to_death: Option<f64>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    race: Option<String>,
    #[serde(default)]
    ethnicity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GdcFollowUp {
    #[serde(default)]
    days_to_follow_up: Value,
}

pub fn parse_cases_json(body: &str) -> Result<Vec<RawClinicalRecord>, PrepError> {
    let response: GdcCasesResponse =
        serde_json::from_str(body).map_err(|err| PrepError::GdcParse(err.to_string()))?;
    let cases = response
        .data
        .hits
        .into_iter()
        .map(|hit| {
            let demographic = hit.demographic.unwrap_or_else(|| GdcDemographic {
                vital_status: None,
                days_to_death: None,
                gender: None,
                race: None,
                ethnicity: None,
            });
            RawClinicalRecord {
                case_id: hit.submitter_id,
                project: hit.project.project_id,
                sex: demographic.gender,
                race: demographic.race,
                ethnicity: demographic.ethnicity,
                vital_status: demographic.vital_status,
                days_to_death: demographic.days_to_death.map(|days| days as i64),
                follow_ups: hit
                    .follow_ups
                    .into_iter()
                    .map(|fu| fu.days_to_follow_up)
                    .collect(),
            }
        })
        .collect();
    Ok(cases)
}

/// Split a combined file table into expression and histology variants by
/// experimental strategy. Rows matching neither are dropped; order is
/// preserved within each variant.
pub fn split_by_strategy(
    files: Vec<FileRecord>,
    config: &QueryConfig,
) -> (Vec<FileRecord>, Vec<FileRecord>) {
    let mut expression = Vec::new();
    let mut histology = Vec::new();
    for file in files {
        if file.experimental_strategy == config.expression.experimental_strategy {
            expression.push(file);
        } else if file.experimental_strategy == config.histology.experimental_strategy {
            histology.push(file);
        }
    }
    (expression, histology)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(case: &str, strategy: &str) -> FileRecord {
        FileRecord {
            file_id: format!("{case}-{strategy}"),
            file_name: format!("{case}.dat"),
            case_id: case.to_string(),
            project: "TCGA-BRCA".to_string(),
            size: 1,
            checksum: "0".repeat(32),
            state: "released".to_string(),
            experimental_strategy: strategy.to_string(),
        }
    }

    #[test]
    fn files_filter_matches_default_query() {
        let filter = files_filter(&QueryConfig::default());
        assert_eq!(filter["op"], "and");
        assert_eq!(
            filter["content"][0]["content"]["field"],
            "cases.project.program.name"
        );
        assert_eq!(filter["content"][0]["content"]["value"][0], "TCGA");
        assert_eq!(
            filter["content"][1]["content"]["field"],
            "cases.samples.tissue_type"
        );
        assert_eq!(filter["content"][2]["op"], "or");
        let hist = &filter["content"][2]["content"][0];
        assert_eq!(
            hist["content"][0]["content"]["value"][0],
            "Diagnostic Slide"
        );
        assert_eq!(hist["content"][1]["content"]["value"][0], "SVS");
        let expr = &filter["content"][2]["content"][1];
        assert_eq!(expr["content"][0]["content"]["value"][0], "RNA-Seq");
        assert_eq!(
            expr["content"][2]["content"]["value"][0],
            "Gene Expression Quantification"
        );
    }

    #[test]
    fn modality_filter_skips_empty_clauses() {
        let filter = modality_filter(&QueryConfig::default().histology);
        // strategy + data_format only; histology has no data_type clause
        assert_eq!(filter["content"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn parse_files_tsv_round() {
        let body = "id\tfile_name\tcases.0.project.project_id\tcases.0.submitter_id\texperimental_strategy\tfile_size\tmd5sum\tstate\n\
                    f1\ta.tsv\tTCGA-BRCA\tTCGA-A1-A0SB\tRNA-Seq\t1234\tabc\treleased\n";
        let files = parse_files_tsv(body).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_id, "f1");
        assert_eq!(files[0].case_id, "TCGA-A1-A0SB");
        assert_eq!(files[0].size, 1234);
        assert_eq!(files[0].checksum, "abc");
    }

    #[test]
    fn parse_cases_json_round() {
        let body = r#"{"data": {"hits": [
            {"submitter_id": "TCGA-A1-A0SB",
             "project": {"project_id": "TCGA-BRCA"},
             "demographic": {"vital_status": "Dead", "days_to_death": 120.0, "gender": "female"},
             "follow_ups": [{"days_to_follow_up": 30}, {"days_to_follow_up": null}]},
            {"submitter_id": "TCGA-A1-A0SC",
             "project": {"project_id": "TCGA-BRCA"}}
        ]}}"#;
        let cases = parse_cases_json(body).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].vital_status.as_deref(), Some("Dead"));
        assert_eq!(cases[0].days_to_death, Some(120));
        assert_eq!(cases[0].sex.as_deref(), Some("female"));
        assert_eq!(cases[0].follow_ups.len(), 2);
        assert!(cases[1].vital_status.is_none());
        assert!(cases[1].follow_ups.is_empty());
    }

    #[test]
    fn split_preserves_order_and_drops_unknown() {
        let files = vec![
            record("c1", "RNA-Seq"),
            record("c2", "Diagnostic Slide"),
            record("c3", "RNA-Seq"),
            record("c4", "WXS"),
        ];
        let (expression, histology) = split_by_strategy(files, &QueryConfig::default());
        let expr_cases: Vec<_> = expression.iter().map(|f| f.case_id.as_str()).collect();
        assert_eq!(expr_cases, vec!["c1", "c3"]);
        assert_eq!(histology.len(), 1);
        assert_eq!(histology[0].case_id, "c2");
    }
}
