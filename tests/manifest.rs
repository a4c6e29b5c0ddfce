use gdc_cohort_prep::domain::FileRecord;
use gdc_cohort_prep::manifest::write_manifest;

fn file(case: &str, file_id: &str, state: &str) -> FileRecord {
    FileRecord {
        file_id: file_id.to_string(),
        file_name: format!("{file_id}.tsv"),
        case_id: case.to_string(),
        project: "TCGA-BRCA".to_string(),
        size: 2048,
        checksum: format!("{file_id}-md5"),
        state: state.to_string(),
        experimental_strategy: "RNA-Seq".to_string(),
    }
}

#[test]
fn manifest_row_per_input_row() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("manifest.txt");

    // duplicates and every state included verbatim, no filtering
    let files = vec![
        file("A", "f1", "released"),
        file("A", "f2", "released"),
        file("B", "f3", "submitted"),
    ];
    write_manifest(&path, &files).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), files.len() + 1);
    assert_eq!(lines[0], "id\tfilename\tmd5\tsize\tstate");
    assert_eq!(lines[1], "f1\tf1.tsv\tf1-md5\t2048\treleased");
    assert_eq!(lines[3], "f3\tf3.tsv\tf3-md5\t2048\tsubmitted");
}

#[test]
fn empty_table_yields_header_only() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("manifest.txt");
    write_manifest(&path, &[]).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
}
