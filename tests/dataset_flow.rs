use std::path::{Path, PathBuf};

use lintext::dataset::{evaluate_file, load_examples, train_epochs, train_file};
use lintext::ml::online::{Algorithm, NbsvmOptions, Predictor, build_classifier, read_model};

const TRAIN: &str = "\
spam win:1 cash:2 now:1
ham meeting:1 lunch:1
spam cash:1 prize:1
ham lunch:1 notes:1 meeting:1
spam win:1:2 cash:1

spam prize:1 win:1
";

const TEST: &str = "\
spam cash:1 win:1
ham notes:1 lunch:1
ham meeting:1 unknown:5
";

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn train_save_and_evaluate_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = write(dir.path(), "train.txt", TRAIN);
    let test_path = write(dir.path(), "test.txt", TEST);
    let model_path = dir.path().join("out").join("model.tsv");

    let mut classifier = build_classifier(Algorithm::Nbsvm, &NbsvmOptions::default());
    for _ in 0..5 {
        let summary = train_file(classifier.as_mut(), &train_path).unwrap();
        assert_eq!(summary.examples, 5);
        assert_eq!(summary.skipped, 1);
    }
    assert_eq!(classifier.steps(), 25);
    classifier.save(&model_path).unwrap();

    let entries = read_model(&model_path).unwrap();
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|entry| entry.weight != 0.0));

    let predictor = Predictor::load(&model_path).unwrap();
    let evaluation = evaluate_file(&test_path, |features| predictor.predict(features)).unwrap();
    assert_eq!(evaluation.total(), 3);
    assert_eq!(evaluation.correct(), 3);
    let report = evaluation.report();
    assert_eq!(report.accuracy, 1.0);
    let labels: Vec<&str> = report.per_label.iter().map(|m| m.label.as_str()).collect();
    assert_eq!(labels, vec!["ham", "spam"]);
}

#[test]
fn shuffled_training_from_files_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = write(dir.path(), "train.txt", TRAIN);
    let (corpus, summary) = load_examples(&train_path).unwrap();
    assert_eq!(corpus.len(), 5);
    assert_eq!(summary.skipped, 1);

    let run = |seed| {
        let mut classifier = build_classifier(Algorithm::Svm, &NbsvmOptions::default());
        train_epochs(classifier.as_mut(), &corpus, 4, Some(seed));
        classifier.export()
    };
    assert_eq!(run(11), run(11));
}

#[test]
fn json_report_uses_plain_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let test_path = write(dir.path(), "test.txt", TEST);
    let evaluation = evaluate_file(&test_path, |_| Some(("ham".to_string(), 0.0))).unwrap();
    let value = serde_json::to_value(evaluation.report()).unwrap();
    assert_eq!(value["correct"], 2);
    assert_eq!(value["total"], 3);
    let spam = value["per_label"]
        .as_array()
        .unwrap()
        .iter()
        .find(|metric| metric["label"] == "spam")
        .unwrap();
    assert_eq!(spam["fn"], 1);
    assert_eq!(spam["recall"], 0.0);
}
