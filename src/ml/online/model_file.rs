//! Tab-separated model files: one `LABEL\tFEATURE\tWEIGHT` line per weight.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// One exported weight, with any feature reweighting already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    pub label: String,
    pub feature: String,
    pub weight: f64,
}

/// Errors raised while writing or loading a model file.
#[derive(Debug, Error)]
pub enum ModelFileError {
    #[error("Failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write model {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed model line {line} in {path}: expected 3 tab-separated fields, got {fields}")]
    Malformed {
        path: PathBuf,
        line: usize,
        fields: usize,
    },
    #[error("Invalid weight {value:?} on model line {line} in {path}")]
    InvalidWeight {
        path: PathBuf,
        line: usize,
        value: String,
    },
}

/// Write entries in order, creating parent directories as needed.
pub fn write_model(path: &Path, entries: &[ModelEntry]) -> Result<(), ModelFileError> {
    let write_err = |source| ModelFileError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    for entry in entries {
        writeln!(writer, "{}\t{}\t{}", entry.label, entry.feature, entry.weight)
            .map_err(write_err)?;
    }
    writer.flush().map_err(write_err)
}

/// Load every entry of a model file.
///
/// Any line without exactly three fields, or with an unparsable weight,
/// fails the whole load.
pub fn read_model(path: &Path) -> Result<Vec<ModelEntry>, ModelFileError> {
    let read_err = |source| ModelFileError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_err)?;
    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(read_err)?;
        entries.push(parse_model_line(path, idx + 1, &line)?);
    }
    Ok(entries)
}

fn parse_model_line(path: &Path, line_no: usize, line: &str) -> Result<ModelEntry, ModelFileError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = line.split('\t').collect();
    let [label, feature, weight] = fields.as_slice() else {
        return Err(ModelFileError::Malformed {
            path: path.to_path_buf(),
            line: line_no,
            fields: fields.len(),
        });
    };
    let weight = weight
        .parse::<f64>()
        .map_err(|_| ModelFileError::InvalidWeight {
            path: path.to_path_buf(),
            line: line_no,
            value: weight.to_string(),
        })?;
    Ok(ModelEntry {
        label: label.to_string(),
        feature: feature.to_string(),
        weight,
    })
}
