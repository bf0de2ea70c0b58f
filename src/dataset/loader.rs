//! Streaming reader for training-pair files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{info, warn};

use super::pairs::{Example, parse_line};
use crate::ml::metrics::Evaluation;
use crate::ml::online::Classifier;
use crate::ml::sparse::NamedFeature;

const READ_BUFFER_BYTES: usize = 256 * 1024;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Line counts from one pass over a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    /// Lines parsed into examples.
    pub examples: u64,
    /// Lines dropped because they failed to parse.
    pub skipped: u64,
}

/// Stream every parsable example in `path` to `f`, in file order.
///
/// Malformed lines are logged and skipped; blank lines are ignored.
pub fn for_each_example<F>(path: &Path, mut f: F) -> Result<ReadSummary, DatasetError>
where
    F: FnMut(Example),
{
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::with_capacity(READ_BUFFER_BYTES, file);
    let mut summary = ReadSummary::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        match parse_line(&line) {
            Ok(Some(example)) => {
                summary.examples += 1;
                f(example);
            }
            Ok(None) => {}
            Err(err) => {
                summary.skipped += 1;
                warn!("{}:{}: skipping line: {err}", path.display(), idx + 1);
            }
        }
    }
    Ok(summary)
}

/// Run one training pass over `path`.
pub fn train_file(
    classifier: &mut dyn Classifier,
    path: &Path,
) -> Result<ReadSummary, DatasetError> {
    let summary = for_each_example(path, |example| {
        classifier.train_one(&example.label, &example.features);
    })?;
    info!(
        "Trained on {}: {} examples, {} skipped, {} total steps",
        path.display(),
        summary.examples,
        summary.skipped,
        classifier.steps()
    );
    Ok(summary)
}

/// Train on each file in turn, running all `iterations` passes over one
/// file before moving to the next.
pub fn train_files(
    classifier: &mut dyn Classifier,
    paths: &[PathBuf],
    iterations: usize,
) -> Result<ReadSummary, DatasetError> {
    let mut totals = ReadSummary::default();
    for path in paths {
        for pass in 0..iterations {
            let summary = train_file(classifier, path)?;
            if pass == 0 {
                totals.examples += summary.examples;
                totals.skipped += summary.skipped;
            }
            info!("{}: pass {}/{} done", path.display(), pass + 1, iterations);
        }
    }
    Ok(totals)
}

/// Read a whole file into memory for repeated or shuffled passes.
pub fn load_examples(path: &Path) -> Result<(Vec<Example>, ReadSummary), DatasetError> {
    let mut examples = Vec::new();
    let summary = for_each_example(path, |example| examples.push(example))?;
    Ok((examples, summary))
}

/// Train for `iterations` passes over an in-memory corpus.
///
/// With a seed, each pass visits the examples in a fresh shuffled order drawn
/// from one seeded generator; otherwise corpus order is kept.
pub fn train_epochs(
    classifier: &mut dyn Classifier,
    corpus: &[Example],
    iterations: usize,
    shuffle_seed: Option<u64>,
) {
    let mut rng = shuffle_seed.map(StdRng::seed_from_u64);
    let mut order: Vec<usize> = (0..corpus.len()).collect();
    for epoch in 0..iterations {
        if let Some(rng) = rng.as_mut() {
            order.shuffle(rng);
        }
        for &idx in &order {
            let example = &corpus[idx];
            classifier.train_one(&example.label, &example.features);
        }
        info!(
            "Epoch {}/{} done ({} total steps)",
            epoch + 1,
            iterations,
            classifier.steps()
        );
    }
}

/// Score every example in `path` with `predict` and tally the results.
pub fn evaluate_file<F>(path: &Path, mut predict: F) -> Result<Evaluation, DatasetError>
where
    F: FnMut(&[NamedFeature]) -> Option<(String, f64)>,
{
    let mut evaluation = Evaluation::new();
    let summary = for_each_example(path, |example| {
        let predicted = predict(&example.features);
        evaluation.add(&example.label, predicted.as_ref().map(|(label, _)| label.as_str()));
    })?;
    if summary.skipped > 0 {
        warn!(
            "{} lines of {} were skipped during evaluation",
            summary.skipped,
            path.display()
        );
    }
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::online::{Algorithm, NbsvmOptions, build_classifier};
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn malformed_lines_are_counted_and_skipped() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "train.txt", "a x:1\nb y:1:2\n\nc z:1\n");
        let mut labels = Vec::new();
        let summary = for_each_example(&path, |example| labels.push(example.label)).unwrap();
        assert_eq!(labels, vec!["a", "c"]);
        assert_eq!(
            summary,
            ReadSummary {
                examples: 2,
                skipped: 1
            }
        );
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempdir().unwrap();
        let err = for_each_example(&dir.path().join("nope.txt"), |_| {}).unwrap_err();
        assert!(matches!(err, DatasetError::Open { .. }));
    }

    #[test]
    fn skipped_lines_do_not_train() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "train.txt", "a x:1\nb y::1\n");
        let mut classifier = build_classifier(Algorithm::Nbsvm, &NbsvmOptions::default());
        let summary = train_file(classifier.as_mut(), &path).unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(classifier.steps(), 1);
        assert_eq!(classifier.lexicon().labels.names(), &["a"]);
    }

    #[test]
    fn multi_file_training_finishes_each_file_first() {
        let dir = tempdir().unwrap();
        let first = write(dir.path(), "a.txt", "a x:1\nb y:1\n");
        let second = write(dir.path(), "b.txt", "b x:1 z:1\nc z:1\n");
        let paths = vec![first.clone(), second.clone()];

        let mut classifier = build_classifier(Algorithm::Nbsvm, &NbsvmOptions::default());
        let totals = train_files(classifier.as_mut(), &paths, 3).unwrap();
        assert_eq!(totals.examples, 4);
        assert_eq!(classifier.steps(), 12);

        let mut expected = build_classifier(Algorithm::Nbsvm, &NbsvmOptions::default());
        for path in [&first, &first, &first, &second, &second, &second] {
            train_file(expected.as_mut(), path).unwrap();
        }
        assert_eq!(classifier.export(), expected.export());
        assert_eq!(classifier.lexicon().labels.names(), &["a", "b", "c"]);
    }

    #[test]
    fn shuffled_epochs_are_reproducible() {
        let corpus: Vec<Example> = (0..20)
            .map(|i| Example {
                label: format!("l{}", i % 3),
                features: vec![NamedFeature::new(format!("f{i}"), 1.0)],
            })
            .collect();
        let run = |seed| {
            let mut classifier = build_classifier(Algorithm::Nbsvm, &NbsvmOptions::default());
            train_epochs(classifier.as_mut(), &corpus, 3, seed);
            assert_eq!(classifier.steps(), 60);
            classifier.export()
        };
        assert_eq!(run(Some(9)), run(Some(9)));
        assert_eq!(run(None), run(None));
    }

    #[test]
    fn evaluation_counts_each_parsed_line() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "test.txt", "a x:1\nb x:1\nb x:1:1\n");
        let evaluation = evaluate_file(&path, |_| Some(("a".to_string(), 1.0))).unwrap();
        assert_eq!(evaluation.total(), 2);
        assert_eq!(evaluation.correct(), 1);
    }
}
