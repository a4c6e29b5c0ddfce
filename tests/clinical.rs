use gdc_cohort_prep::domain::RawClinicalRecord;
use gdc_cohort_prep::clinical::{filter_clinical, write_clinical};
use serde_json::json;

fn raw(
    case: &str,
    vital_status: Option<&str>,
    days_to_death: Option<i64>,
    follow_ups: Vec<serde_json::Value>,
) -> RawClinicalRecord {
    RawClinicalRecord {
        case_id: case.to_string(),
        project: "TCGA-BRCA".to_string(),
        sex: Some("female".to_string()),
        race: None,
        ethnicity: None,
        vital_status: vital_status.map(str::to_string),
        days_to_death,
        follow_ups,
    }
}

#[test]
fn truth_table_keep_and_drop() {
    let records = vec![
        raw("TTT", Some("Dead"), Some(10), vec![json!(30)]),
        raw("TTF", Some("Dead"), Some(10), vec![]),
        raw("TFT", Some("Dead"), None, vec![json!(30)]),
        raw("TFF", Some("Dead"), None, vec![]),
        raw("FTT", Some("Alive"), Some(10), vec![json!(30)]),
        raw("FTF", Some("Alive"), Some(10), vec![]),
        raw("FFT", Some("Alive"), None, vec![json!(30)]),
        raw("FFF", Some("Alive"), None, vec![]),
    ];

    let kept = filter_clinical(records);
    let cases: Vec<_> = kept.iter().map(|r| r.case_id.as_str()).collect();
    assert_eq!(cases, vec!["FFT", "TTF", "TTT"]);
}

#[test]
fn missing_vital_status_counts_as_not_dead() {
    let kept = filter_clinical(vec![
        raw("NO-STATUS-FU", None, None, vec![json!(45)]),
        raw("NO-STATUS-D2D", None, Some(45), vec![]),
    ]);
    let cases: Vec<_> = kept.iter().map(|r| r.case_id.as_str()).collect();
    assert_eq!(cases, vec!["NO-STATUS-FU"]);
}

#[test]
fn follow_up_reduction_feeds_the_filter() {
    // only the non-integer observation exists, so the record is unusable
    let kept = filter_clinical(vec![raw(
        "BAD-FU",
        Some("Alive"),
        None,
        vec![json!("soon"), json!(null)],
    )]);
    assert!(kept.is_empty());

    let kept = filter_clinical(vec![raw(
        "MAX-FU",
        Some("Alive"),
        None,
        vec![json!(12), json!(700), json!(365)],
    )]);
    assert_eq!(kept[0].days_to_last_follow_up, Some(700));
}

#[test]
fn categoricals_filled_after_filtering() {
    let kept = filter_clinical(vec![raw("A", Some("Dead"), Some(5), vec![])]);
    assert_eq!(kept[0].sex, "female");
    assert_eq!(kept[0].race, "not reported");
    assert_eq!(kept[0].ethnicity, "not reported");
}

#[test]
fn output_sorted_by_project_then_case() {
    let mut records = vec![
        raw("TCGA-Z9-0001", Some("Dead"), Some(5), vec![]),
        raw("TCGA-A1-0002", Some("Dead"), Some(5), vec![]),
    ];
    records[0].project = "TCGA-LUAD".to_string();
    records[1].project = "TCGA-BRCA".to_string();
    let mut more = vec![raw("TCGA-A1-0001", Some("Dead"), Some(5), vec![])];
    more[0].project = "TCGA-LUAD".to_string();
    records.extend(more);

    let kept = filter_clinical(records);
    let order: Vec<_> = kept
        .iter()
        .map(|r| (r.project.as_str(), r.case_id.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("TCGA-BRCA", "TCGA-A1-0002"),
            ("TCGA-LUAD", "TCGA-A1-0001"),
            ("TCGA-LUAD", "TCGA-Z9-0001"),
        ]
    );
}

#[test]
fn clinical_csv_has_header_and_empty_optionals() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("clinical.csv");

    let kept = filter_clinical(vec![raw("TCGA-A1-0001", Some("Alive"), None, vec![json!(9)])]);
    write_clinical(&path, &kept).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "case_id,project,sex,race,ethnicity,vital_status,days_to_death,days_to_last_follow_up"
    );
    assert_eq!(
        lines.next().unwrap(),
        "TCGA-A1-0001,TCGA-BRCA,female,not reported,not reported,Alive,,9"
    );
    assert_eq!(lines.next(), None);
}
