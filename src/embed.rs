use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::error::PrepError;
use crate::fs_util;
use crate::store::EmbeddingStore;

/// One unit of embedding work: a preprocessed per-case input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingUnit {
    pub case_id: String,
    pub file_id: String,
    pub input_path: Utf8PathBuf,
}

/// The numerical model behind an embedding workflow. Model loading and
/// inference live with the caller; this crate only drives the resume loop.
pub trait Embedder {
    fn embed(&self, unit: &EmbeddingUnit) -> Result<Vec<f32>, PrepError>;
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EmbedSummary {
    pub computed: usize,
    pub skipped: usize,
}

/// Run the producer over the given units. A unit whose key is already in
/// the store is skipped without invoking the embedder, so an interrupted
/// run can be restarted against the same store with no duplicate work.
pub fn run_embedding<E: Embedder>(
    store: &EmbeddingStore,
    units: &[EmbeddingUnit],
    embedder: &E,
) -> Result<EmbedSummary, PrepError> {
    let mut computed = 0usize;
    let mut skipped = 0usize;
    for unit in units {
        if store.exists(&unit.case_id, &unit.file_id) {
            tracing::info!(
                case_id = %unit.case_id,
                file_id = %unit.file_id,
                "already stored, skipping"
            );
            skipped += 1;
            continue;
        }
        let vector = embedder.embed(unit)?;
        store.put(&unit.case_id, &unit.file_id, &vector)?;
        computed += 1;
    }
    tracing::info!(computed, skipped, "embedding run finished");
    Ok(EmbedSummary { computed, skipped })
}

/// Enumerate embedding units from an organized `root/<case_id>/<file>`
/// tree: every file with the given extension yields a unit keyed by its
/// case directory and filename stem. Sorted by (`case_id`, `file_id`).
pub fn discover_units(root: &Utf8Path, extension: &str) -> Result<Vec<EmbeddingUnit>, PrepError> {
    let mut units = Vec::new();
    for path in fs_util::walk_files(root.as_std_path())? {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(stem) = name.strip_suffix(extension) else {
            continue;
        };
        let case_id = path
            .parent()
            .and_then(|dir| dir.file_name())
            .and_then(|name| name.to_str())
            .ok_or_else(|| PrepError::Filesystem(format!("no case directory for {name}")))?
            .to_string();
        let file_id = stem.to_string();
        let input_path = Utf8PathBuf::from_path_buf(path)
            .map_err(|_| PrepError::Filesystem("non-utf8 path in dataset".to_string()))?;
        units.push(EmbeddingUnit {
            case_id,
            file_id,
            input_path,
        });
    }
    units.sort_by(|a, b| (&a.case_id, &a.file_id).cmp(&(&b.case_id, &b.file_id)));
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_units_by_extension() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("TCGA-A1-A0SB")).unwrap();
        fs::create_dir_all(temp.path().join("TCGA-A1-A0SC")).unwrap();
        fs::write(temp.path().join("TCGA-A1-A0SB/slide-2.h5"), b"x").unwrap();
        fs::write(temp.path().join("TCGA-A1-A0SB/slide-1.h5"), b"x").unwrap();
        fs::write(temp.path().join("TCGA-A1-A0SC/notes.txt"), b"x").unwrap();

        let root = Utf8Path::from_path(temp.path()).unwrap();
        let units = discover_units(root, ".h5").unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].case_id, "TCGA-A1-A0SB");
        assert_eq!(units[0].file_id, "slide-1");
        assert_eq!(units[1].file_id, "slide-2");
    }
}
