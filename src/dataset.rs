//! Training-pair files: `LABEL feature:value feature:value ...` per line.
//!
//! Lines are parsed independently, so a malformed line is logged and skipped
//! without stopping the rest of the file.

mod loader;
mod pairs;

pub use loader::{
    DatasetError, ReadSummary, evaluate_file, for_each_example, load_examples, train_epochs,
    train_file, train_files,
};
pub use pairs::{Example, ParseError, parse_features, parse_line};
