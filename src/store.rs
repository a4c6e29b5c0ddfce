use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::PrepError;

/// Persistent two-level embedding store: `root/<case_id>/<file_id>.json`,
/// each entry a JSON number array. The layout is a stable contract for
/// downstream modeling code.
///
/// Entries are append-only. The store on disk is the single source of
/// truth for completed work; producers check `exists` before computing and
/// `put` never replaces a value. Single-writer: concurrent processes
/// appending to the same root must be serialized externally.
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    root: Utf8PathBuf,
}

impl EmbeddingStore {
    /// Open a store, creating the root if absent. Existing entries are
    /// kept untouched.
    pub fn open(root: impl Into<Utf8PathBuf>) -> Result<Self, PrepError> {
        let root = root.into();
        fs::create_dir_all(root.as_std_path())
            .map_err(|err| PrepError::Filesystem(format!("create store root {root}: {err}")))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn entry_path(&self, case_id: &str, file_id: &str) -> Utf8PathBuf {
        self.root.join(case_id).join(format!("{file_id}.json"))
    }

    pub fn exists(&self, case_id: &str, file_id: &str) -> bool {
        self.entry_path(case_id, file_id).as_std_path().is_file()
    }

    /// Write a vector under `(case_id, file_id)`. A present key is left
    /// untouched. The entry lands atomically: it is staged in a temp file
    /// in the case directory and persisted without clobbering, so a crash
    /// mid-write never yields an entry that satisfies `exists`, and a
    /// concurrent external retry cannot replace a finished one.
    pub fn put(&self, case_id: &str, file_id: &str, vector: &[f32]) -> Result<(), PrepError> {
        let path = self.entry_path(case_id, file_id);
        if path.as_std_path().is_file() {
            return Ok(());
        }
        let case_dir = self.root.join(case_id);
        fs::create_dir_all(case_dir.as_std_path())
            .map_err(|err| PrepError::Filesystem(format!("create group {case_dir}: {err}")))?;

        let mut temp = tempfile::Builder::new()
            .prefix(".entry")
            .tempfile_in(case_dir.as_std_path())
            .map_err(|err| PrepError::Filesystem(err.to_string()))?;
        let payload =
            serde_json::to_vec(vector).map_err(|err| PrepError::Filesystem(err.to_string()))?;
        temp.write_all(&payload)
            .map_err(|err| PrepError::Filesystem(err.to_string()))?;

        match temp.persist_noclobber(path.as_std_path()) {
            Ok(_) => Ok(()),
            Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(err) => Err(PrepError::Filesystem(err.to_string())),
        }
    }

    pub fn get(&self, case_id: &str, file_id: &str) -> Result<Option<Vec<f32>>, PrepError> {
        let path = self.entry_path(case_id, file_id);
        if !path.as_std_path().is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| PrepError::Filesystem(err.to_string()))?;
        let vector =
            serde_json::from_str(&content).map_err(|err| PrepError::Filesystem(err.to_string()))?;
        Ok(Some(vector))
    }
}
