use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PrepError;

/// Ceiling passed as the `size` query parameter. A response with exactly
/// this many rows may have been truncated by the registry.
pub const DEFAULT_MAX_QUERY_SIZE: usize = 1_000_000;

pub const DEFAULT_BASE_URL: &str = "https://api.gdc.cancer.gov";

/// File-query clauses for one modality. Empty value lists are omitted from
/// the filter expression.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModalityFilter {
    pub experimental_strategy: String,
    #[serde(default)]
    pub data_formats: Vec<String>,
    #[serde(default)]
    pub data_types: Vec<String>,
}

/// Immutable registry-query configuration. Loaded from a JSON file when
/// one is given, otherwise the built-in TCGA defaults apply.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryConfig {
    pub base_url: String,
    pub program: String,
    pub tissue_type: String,
    pub max_query_size: usize,
    pub expression: ModalityFilter,
    pub histology: ModalityFilter,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            program: "TCGA".to_string(),
            tissue_type: "Tumor".to_string(),
            max_query_size: DEFAULT_MAX_QUERY_SIZE,
            expression: ModalityFilter {
                experimental_strategy: "RNA-Seq".to_string(),
                data_formats: vec!["TSV".to_string()],
                data_types: vec!["Gene Expression Quantification".to_string()],
            },
            histology: ModalityFilter {
                experimental_strategy: "Diagnostic Slide".to_string(),
                data_formats: vec!["SVS".to_string()],
                data_types: Vec::new(),
            },
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<QueryConfig, PrepError> {
        let Some(path) = path else {
            return Ok(QueryConfig::default());
        };
        let config_path = PathBuf::from(path);
        let content = fs::read_to_string(&config_path)
            .map_err(|_| PrepError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| PrepError::ConfigParse(err.to_string()))
    }
}
