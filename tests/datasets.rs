use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;
use weighted_bisect::bisect::{analyse_file, analyse_files, dataset_files};
use weighted_bisect::model::{load_case_stats, save_json, CommitRecord};
use weighted_bisect::{CommitSummary, Dataset, Measure, WeightFunction};

/// Twenty-one commits where commit `i` changes `i` lines. `c3` reverts `c7`
/// (base `c12`); `c0` reverts `c9` with `c9` as its own base, which is invalid.
fn sample_dataset() -> Dataset {
    let order: Vec<String> = (0..21).map(|i| format!("c{i}")).collect();
    let mut dict: BTreeMap<String, CommitRecord> = order
        .iter()
        .enumerate()
        .map(|(i, sha)| {
            let record = CommitRecord {
                position: i,
                summary: CommitSummary {
                    lines_added: i as u64,
                    ..Default::default()
                },
                ..Default::default()
            };
            (sha.clone(), record)
        })
        .collect();

    let revert = dict.get_mut("c3").unwrap();
    revert.reverts = Some("c7".into());
    revert.base = Some("c12".into());
    let revert = dict.get_mut("c0").unwrap();
    revert.reverts = Some("c9".into());
    revert.base = Some("c9".into());

    Dataset {
        name: Some("sample".into()),
        order,
        dict,
        reverts: vec!["c0".into(), "c3".into()],
        ..Default::default()
    }
}

#[test]
fn test_dataset_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.json");
    let dataset = sample_dataset();
    dataset.save(&path).unwrap();

    assert_eq!(Dataset::load(&path).unwrap(), dataset);
}

#[test]
fn test_analyse_with_commit_metric() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.json");
    sample_dataset().save(&path).unwrap();

    let analysis = analyse_file(&path, &WeightFunction::constant()).unwrap();
    assert_eq!(analysis.name, "sample");
    assert_eq!(analysis.inconsistent, 1);
    assert_eq!(analysis.missing, 0);
    assert_eq!(analysis.cases.len(), 1);

    let case = analysis.cases[0];
    assert_eq!(case.steps, 1);
    assert_eq!(case.distance, 9.0);
    assert_eq!(case.target_distance, 4.0);
    assert_eq!(case.commits, 9);
}

#[test]
fn test_analyse_with_lines_metric() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.json");
    sample_dataset().save(&path).unwrap();

    let analysis = analyse_file(&path, &WeightFunction::Measured(Measure::Lines)).unwrap();
    let case = analysis.cases[0];
    assert_eq!(case.steps, 2);
    assert_eq!(case.distance, 63.0);
    assert_eq!(case.target_distance, 18.0);
    assert_eq!(case.commits, 9);
}

#[test]
fn test_directory_listing_and_bad_files() {
    let dir = tempdir().unwrap();
    sample_dataset().save(&dir.path().join("b.json")).unwrap();
    sample_dataset().save(&dir.path().join("a.json")).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a dataset").unwrap();
    fs::write(dir.path().join("c.json"), "{ broken").unwrap();

    let files = dataset_files(dir.path()).unwrap();
    let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_owned()).collect();
    assert_eq!(names, ["a.json", "b.json", "c.json"]);

    let analyses = analyse_files(&files, &WeightFunction::constant());
    assert_eq!(analyses.len(), 2);
    assert!(analyses.iter().all(|a| a.cases.len() == 1));
}

#[test]
fn test_results_round_trip() {
    let dir = tempdir().unwrap();
    let dataset = dir.path().join("sample.json");
    sample_dataset().save(&dataset).unwrap();
    let analysis = analyse_file(&dataset, &WeightFunction::Measured(Measure::Lines)).unwrap();

    let results = dir.path().join("results.json");
    save_json(&results, &analysis.cases).unwrap();
    assert_eq!(load_case_stats(&results).unwrap(), analysis.cases);

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&results).unwrap()).unwrap();
    assert_eq!(raw[0]["target"], 18.0);
}
