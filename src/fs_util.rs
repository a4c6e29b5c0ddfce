use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PrepError;

/// Collect every file under `root`, depth-first. Entries are visited in
/// name order within each directory, so the result is deterministic for a
/// given tree.
pub fn walk_files(root: &Path) -> Result<Vec<PathBuf>, PrepError> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = fs::read_dir(&dir)
            .map_err(|err| PrepError::Filesystem(format!("read dir {}: {err}", dir.display())))?;
        let mut entries = entries
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| PrepError::Filesystem(err.to_string()))?;
        entries.sort_by_key(|entry| entry.file_name());
        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }
    Ok(files)
}

/// Move a file, falling back to copy-and-remove when the destination is on
/// another filesystem.
pub fn move_file(src: &Path, dst: &Path) -> Result<(), PrepError> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    fs::copy(src, dst)
        .map_err(|err| PrepError::Filesystem(format!("copy {}: {err}", src.display())))?;
    fs::remove_file(src).map_err(|err| PrepError::Filesystem(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_finds_nested_files() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("top.txt"), b"x").unwrap();
        fs::write(temp.path().join("a/b/deep.txt"), b"y").unwrap();

        let files = walk_files(temp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(files.len(), 2);
        assert!(names.contains(&"top.txt".to_string()));
        assert!(names.contains(&"deep.txt".to_string()));
    }
}
