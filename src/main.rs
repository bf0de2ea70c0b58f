//! Command-line front end: train, evaluate and apply online text classifiers.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use lintext::config::{self, TrainSettings};
use lintext::dataset::{self, Example, ReadSummary};
use lintext::logging;
use lintext::ml::metrics::EvalReport;
use lintext::ml::online::{Algorithm, Predictor, build_classifier};
use tracing::{info, warn};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let command = parse_args(std::env::args().skip(1).collect())?;
    if matches!(command, Command::Help) {
        println!("{}", help_text());
        return Ok(());
    }
    if let Err(err) = logging::init("info") {
        eprintln!("Logging disabled: {err}");
    }
    match command {
        Command::Train(args) => train(args),
        Command::Test(args) => test(args),
        Command::Predict(args) => predict(args),
        Command::Help => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Train(TrainArgs),
    Test(TestArgs),
    Predict(PredictArgs),
    Help,
}

/// Explicit `train` flags; `None` keeps the config file value.
#[derive(Debug, Clone, Default, PartialEq)]
struct TrainArgs {
    config: Option<PathBuf>,
    algorithm: Option<Algorithm>,
    iterations: Option<usize>,
    alpha: Option<f64>,
    eta: Option<f64>,
    lambda: Option<f64>,
    no_adagrad: bool,
    shuffle_seed: Option<u64>,
    model: PathBuf,
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
struct TestArgs {
    model: PathBuf,
    input: PathBuf,
    json: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct PredictArgs {
    model: PathBuf,
    /// `None` reads standard input.
    input: Option<PathBuf>,
}

impl TrainArgs {
    fn apply(&self, settings: &mut TrainSettings) {
        if let Some(algorithm) = self.algorithm {
            settings.algorithm = algorithm;
        }
        if let Some(iterations) = self.iterations {
            settings.iterations = iterations;
        }
        if let Some(alpha) = self.alpha {
            settings.alpha = alpha;
        }
        if let Some(eta) = self.eta {
            settings.eta = eta;
        }
        if let Some(lambda) = self.lambda {
            settings.lambda = lambda;
        }
        if self.no_adagrad {
            settings.adagrad = false;
        }
        if self.shuffle_seed.is_some() {
            settings.shuffle_seed = self.shuffle_seed;
        }
    }
}

fn train(args: TrainArgs) -> Result<(), String> {
    let mut settings = match &args.config {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    args.apply(&mut settings);
    settings.validate().map_err(|err| err.to_string())?;
    info!(
        "Training {} for {} iterations (alpha={}, eta={}, lambda={}, adagrad={})",
        settings.algorithm,
        settings.iterations,
        settings.alpha,
        settings.eta,
        settings.lambda,
        settings.adagrad
    );

    let mut classifier = build_classifier(settings.algorithm, &settings.to_options());
    if let Some(seed) = settings.shuffle_seed {
        let mut corpus: Vec<Example> = Vec::new();
        let mut totals = ReadSummary::default();
        for path in &args.inputs {
            let (examples, summary) =
                dataset::load_examples(path).map_err(|err| err.to_string())?;
            corpus.extend(examples);
            totals.examples += summary.examples;
            totals.skipped += summary.skipped;
        }
        info!(
            "Loaded {} examples ({} skipped), shuffling with seed {seed}",
            totals.examples, totals.skipped
        );
        dataset::train_epochs(classifier.as_mut(), &corpus, settings.iterations, Some(seed));
    } else {
        dataset::train_files(classifier.as_mut(), &args.inputs, settings.iterations)
            .map_err(|err| err.to_string())?;
    }

    if classifier.lexicon().labels.is_empty() {
        warn!("No training examples were read; the model will be empty");
    }
    classifier.save(&args.model).map_err(|err| err.to_string())?;
    info!(
        "Saved model to {} after {} steps",
        args.model.display(),
        classifier.steps()
    );
    Ok(())
}

fn test(args: TestArgs) -> Result<(), String> {
    let predictor = Predictor::load(&args.model).map_err(|err| err.to_string())?;
    let evaluation = dataset::evaluate_file(&args.input, |features| predictor.predict(features))
        .map_err(|err| err.to_string())?;
    let report = evaluation.report();
    if args.json {
        let text = serde_json::to_string_pretty(&report).map_err(|err| err.to_string())?;
        println!("{text}");
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &EvalReport) {
    for metric in &report.per_label {
        println!(
            "{:<16}  precision={:.4}  recall={:.4}  f1={:.4}  support={}",
            metric.label, metric.precision, metric.recall, metric.f1, metric.support
        );
    }
    println!(
        "accuracy: {:.4} ({}/{})",
        report.accuracy, report.correct, report.total
    );
}

fn predict(args: PredictArgs) -> Result<(), String> {
    let predictor = Predictor::load(&args.model).map_err(|err| err.to_string())?;
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| format!("Failed to open {}: {err}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };
    let mut out = BufWriter::new(io::stdout().lock());
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| format!("Failed to read input: {err}"))?;
        let features = match dataset::parse_features(&line) {
            Ok(features) => features,
            Err(err) => {
                warn!("line {}: skipping: {err}", idx + 1);
                continue;
            }
        };
        let Some((label, score)) = predictor.predict(&features) else {
            return Err("Model has no labels".to_string());
        };
        writeln!(out, "{label}\t{score}").map_err(|err| err.to_string())?;
    }
    out.flush().map_err(|err| err.to_string())
}

fn parse_args(args: Vec<String>) -> Result<Command, String> {
    let Some((command, rest)) = args.split_first() else {
        return Err(help_text());
    };
    match command.as_str() {
        "train" => parse_train(rest).map(|args| args.map_or(Command::Help, Command::Train)),
        "test" => parse_test(rest).map(|args| args.map_or(Command::Help, Command::Test)),
        "predict" => {
            parse_predict(rest).map(|args| args.map_or(Command::Help, Command::Predict))
        }
        "help" | "-h" | "--help" => Ok(Command::Help),
        unknown => Err(format!("Unknown command: {unknown}\n\n{}", help_text())),
    }
}

fn value<'a>(args: &'a [String], idx: &mut usize, flag: &str) -> Result<&'a str, String> {
    *idx += 1;
    args.get(*idx)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parsed<T: std::str::FromStr>(args: &[String], idx: &mut usize, flag: &str) -> Result<T, String> {
    let raw = value(args, idx, flag)?;
    raw.parse::<T>().map_err(|_| format!("Invalid {flag} value: {raw}"))
}

/// `Ok(None)` when help was requested.
fn parse_train(args: &[String]) -> Result<Option<TrainArgs>, String> {
    let mut parsed_args = TrainArgs::default();
    let mut model: Option<PathBuf> = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Ok(None),
            "--config" => {
                parsed_args.config = Some(PathBuf::from(value(args, &mut idx, "--config")?));
            }
            "-a" | "--algorithm" => {
                parsed_args.algorithm = Some(parsed(args, &mut idx, "--algorithm")?);
            }
            "-i" | "--iterations" => {
                parsed_args.iterations = Some(parsed(args, &mut idx, "--iterations")?);
            }
            "--alpha" => parsed_args.alpha = Some(parsed(args, &mut idx, "--alpha")?),
            "--eta" => parsed_args.eta = Some(parsed(args, &mut idx, "--eta")?),
            "--lambda" => parsed_args.lambda = Some(parsed(args, &mut idx, "--lambda")?),
            "--no-adagrad" => parsed_args.no_adagrad = true,
            "--shuffle" => parsed_args.shuffle_seed = Some(parsed(args, &mut idx, "--shuffle")?),
            "-m" | "--model" => model = Some(PathBuf::from(value(args, &mut idx, "--model")?)),
            flag if flag.starts_with('-') && flag != "-" => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            input => parsed_args.inputs.push(PathBuf::from(input)),
        }
        idx += 1;
    }
    parsed_args.model = model.ok_or_else(|| "train requires --model <path>".to_string())?;
    if parsed_args.inputs.is_empty() {
        return Err("train requires at least one training file".to_string());
    }
    Ok(Some(parsed_args))
}

fn parse_test(args: &[String]) -> Result<Option<TestArgs>, String> {
    let mut model: Option<PathBuf> = None;
    let mut input: Option<PathBuf> = None;
    let mut json = false;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Ok(None),
            "-m" | "--model" => model = Some(PathBuf::from(value(args, &mut idx, "--model")?)),
            "--json" => json = true,
            flag if flag.starts_with('-') => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            path if input.is_none() => input = Some(PathBuf::from(path)),
            extra => return Err(format!("Unexpected argument: {extra}")),
        }
        idx += 1;
    }
    Ok(Some(TestArgs {
        model: model.ok_or_else(|| "test requires --model <path>".to_string())?,
        input: input.ok_or_else(|| "test requires a test file".to_string())?,
        json,
    }))
}

fn parse_predict(args: &[String]) -> Result<Option<PredictArgs>, String> {
    let mut model: Option<PathBuf> = None;
    let mut input: Option<PathBuf> = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Ok(None),
            "-m" | "--model" => model = Some(PathBuf::from(value(args, &mut idx, "--model")?)),
            "-" => input = None,
            flag if flag.starts_with('-') => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            path => input = Some(PathBuf::from(path)),
        }
        idx += 1;
    }
    Ok(Some(PredictArgs {
        model: model.ok_or_else(|| "predict requires --model <path>".to_string())?,
        input,
    }))
}

fn help_text() -> String {
    [
        "lintext: online multiclass linear text classifiers",
        "",
        "Usage:",
        "  lintext train [options] -m <model.tsv> <train.txt>...",
        "  lintext test -m <model.tsv> [--json] <test.txt>",
        "  lintext predict -m <model.tsv> [<features.txt> | -]",
        "",
        "Input lines look like `LABEL feature:value feature:value ...`;",
        "predict reads lines without the label.",
        "",
        "Train options:",
        "  --config <path>         TOML settings (default: <config dir>/.lintext/config.toml)",
        "  -a, --algorithm <name>  nbsvm (default), nbsvm-basic, svm, perceptron",
        "  -i, --iterations <n>    Passes over each training file (default: 10)",
        "  --alpha <x>             Naive-Bayes smoothing (default: 0.01)",
        "  --eta <x>               Base learning rate (default: 0.1)",
        "  --lambda <x>            L1 strength per step (default: 1e-8)",
        "  --no-adagrad            Use a uniform per-weight rate",
        "  --shuffle <seed>        Load files into memory and shuffle each pass",
        "",
        "Logging follows RUST_LOG (default: info).",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn parses_train_flags() {
        let command = parse_args(args(&[
            "train", "-a", "svm", "-i", "3", "--eta", "0.5", "--no-adagrad", "--shuffle", "7",
            "-m", "out.tsv", "a.txt", "b.txt",
        ]))
        .unwrap();
        let Command::Train(train) = command else {
            panic!("expected train command");
        };
        assert_eq!(train.algorithm, Some(Algorithm::Svm));
        assert_eq!(train.iterations, Some(3));
        assert_eq!(train.eta, Some(0.5));
        assert!(train.no_adagrad);
        assert_eq!(train.shuffle_seed, Some(7));
        assert_eq!(train.model, PathBuf::from("out.tsv"));
        assert_eq!(train.inputs, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
    }

    #[test]
    fn cli_flags_override_settings() {
        let mut settings = TrainSettings {
            iterations: 4,
            eta: 0.3,
            ..TrainSettings::default()
        };
        let train = TrainArgs {
            eta: Some(0.9),
            no_adagrad: true,
            ..TrainArgs::default()
        };
        train.apply(&mut settings);
        assert_eq!(settings.iterations, 4);
        assert_eq!(settings.eta, 0.9);
        assert!(!settings.adagrad);
    }

    #[test]
    fn train_requires_model_and_input() {
        assert!(parse_args(args(&["train", "a.txt"])).is_err());
        assert!(parse_args(args(&["train", "-m", "out.tsv"])).is_err());
        assert!(parse_args(args(&["train", "-a", "forest", "-m", "o", "a"])).is_err());
    }

    #[test]
    fn parses_test_and_predict() {
        assert_eq!(
            parse_args(args(&["test", "--json", "-m", "m.tsv", "t.txt"])).unwrap(),
            Command::Test(TestArgs {
                model: PathBuf::from("m.tsv"),
                input: PathBuf::from("t.txt"),
                json: true,
            })
        );
        assert_eq!(
            parse_args(args(&["predict", "-m", "m.tsv", "-"])).unwrap(),
            Command::Predict(PredictArgs {
                model: PathBuf::from("m.tsv"),
                input: None,
            })
        );
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(parse_args(args(&["fit"])).is_err());
        assert!(parse_args(Vec::new()).is_err());
        assert_eq!(parse_args(args(&["help"])).unwrap(), Command::Help);
    }

    #[test]
    fn subcommand_help_is_not_an_error() {
        for command in ["train", "test", "predict"] {
            for flag in ["-h", "--help"] {
                assert_eq!(parse_args(args(&[command, flag])).unwrap(), Command::Help);
            }
        }
        assert_eq!(
            parse_args(args(&["train", "-m", "out.tsv", "--help"])).unwrap(),
            Command::Help
        );
    }
}
