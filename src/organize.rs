use std::collections::HashMap;
use std::fs;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::domain::FileRecord;
use crate::error::PrepError;
use crate::fs_util;

/// Deterministic rename applied before matching, for files that arrive as
/// precomputed derivatives of the nominal file (e.g. `.svs` slides
/// downloaded as `.h5` tile embeddings).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtensionRewrite {
    pub from: String,
    pub to: String,
}

impl ExtensionRewrite {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn apply(&self, file_name: &str) -> String {
        match file_name.strip_suffix(&self.from) {
            Some(stem) => format!("{stem}{}", self.to),
            None => file_name.to_string(),
        }
    }
}

/// File modality an organize job works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Expression,
    Histology,
}

impl Modality {
    pub fn label(&self) -> &'static str {
        match self {
            Modality::Expression => "Expr",
            Modality::Histology => "Hist",
        }
    }
}

/// One modality's organize job.
#[derive(Debug, Clone)]
pub struct OrganizePlan {
    pub modality: Modality,
    pub source: Utf8PathBuf,
    pub destination: Utf8PathBuf,
    pub rewrite: Option<ExtensionRewrite>,
}

/// An expectation that no walked file satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotFoundEntry {
    pub file_name: String,
    pub dst_path: String,
}

#[derive(Debug, Clone)]
pub struct OrganizeReport {
    pub moved: usize,
    pub not_found: Vec<NotFoundEntry>,
}

/// Reconcile a downloaded tree against the expected files and relocate
/// matches into `destination/<case_id>/<file_name>`.
///
/// Matching is by basename. Expected filenames must be globally unique
/// across cases; when two expectations share a name the later row's
/// destination wins and only one walked file can satisfy it. The first
/// walked file with a pending name is moved and that expectation retired;
/// files matching no pending expectation are left untouched. Expectations
/// still pending after the walk are returned sorted by `file_name` --
/// absence is reported data, not an error.
pub fn organize_files(
    files: &[FileRecord],
    source: &Utf8Path,
    destination: &Utf8Path,
    rewrite: Option<&ExtensionRewrite>,
) -> Result<OrganizeReport, PrepError> {
    let mut pending: HashMap<String, Utf8PathBuf> = HashMap::new();
    for file in files {
        let file_name = match rewrite {
            Some(rewrite) => rewrite.apply(&file.file_name),
            None => file.file_name.clone(),
        };
        let case_dir = destination.join(&file.case_id);
        fs::create_dir_all(case_dir.as_std_path())
            .map_err(|err| PrepError::Filesystem(format!("create dir {case_dir}: {err}")))?;
        let dst_path = case_dir.join(&file_name);
        pending.insert(file_name, dst_path);
    }

    let mut moved = 0usize;
    for path in fs_util::walk_files(source.as_std_path())? {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if let Some(dst_path) = pending.remove(name) {
            fs_util::move_file(&path, dst_path.as_std_path())?;
            moved += 1;
        }
    }

    let mut not_found: Vec<NotFoundEntry> = pending
        .into_iter()
        .map(|(file_name, dst_path)| NotFoundEntry {
            file_name,
            dst_path: dst_path.to_string(),
        })
        .collect();
    not_found.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    tracing::info!(moved, missing = not_found.len(), "organized files");
    Ok(OrganizeReport { moved, not_found })
}

/// Two-column report of unmet expectations, comma-separated with a header.
pub fn write_not_found(path: &Path, entries: &[NotFoundEntry]) -> Result<(), PrepError> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|err| PrepError::Delimited(err.to_string()))?;
    for entry in entries {
        writer
            .serialize(entry)
            .map_err(|err| PrepError::Delimited(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| PrepError::Filesystem(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_applies_to_suffix_only() {
        let rewrite = ExtensionRewrite::new(".svs", ".h5");
        assert_eq!(rewrite.apply("slide-01.svs"), "slide-01.h5");
        assert_eq!(rewrite.apply("notes.txt"), "notes.txt");
    }
}
