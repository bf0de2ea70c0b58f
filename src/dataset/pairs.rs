use thiserror::Error;

use crate::ml::sparse::NamedFeature;

/// One labelled training or test line.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub label: String,
    pub features: Vec<NamedFeature>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("token {token:?} has more than one ':'")]
    TooManyColons { token: String },
}

/// Parse a training line; blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Example>, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }
    let (label, rest) = line.split_once(' ').unwrap_or((line, ""));
    Ok(Some(Example {
        label: label.to_string(),
        features: parse_features(rest)?,
    }))
}

/// Parse space-separated `feature:value` tokens.
///
/// Tokens without a colon are skipped. Values that do not parse as numbers
/// count as 0.0.
pub fn parse_features(text: &str) -> Result<Vec<NamedFeature>, ParseError> {
    let text = text.trim_end_matches(['\r', '\n']);
    let mut features = Vec::new();
    for token in text.split(' ') {
        let mut parts = token.split(':');
        let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        if parts.next().is_some() {
            return Err(ParseError::TooManyColons {
                token: token.to_string(),
            });
        }
        features.push(NamedFeature::new(name, value.parse().unwrap_or(0.0)));
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_label_and_features() {
        let example = parse_line("pos cat:1 dog:0.5\r\n").unwrap().unwrap();
        assert_eq!(example.label, "pos");
        assert_eq!(
            example.features,
            vec![NamedFeature::new("cat", 1.0), NamedFeature::new("dog", 0.5)]
        );
    }

    #[test]
    fn tokens_without_colon_are_skipped() {
        let example = parse_line("pos hello  cat:2").unwrap().unwrap();
        assert_eq!(example.features, vec![NamedFeature::new("cat", 2.0)]);
    }

    #[test]
    fn extra_colons_fail_the_line() {
        let err = parse_line("pos a:b:1 cat:1").unwrap_err();
        assert_eq!(
            err,
            ParseError::TooManyColons {
                token: "a:b:1".to_string()
            }
        );
    }

    #[test]
    fn malformed_numbers_become_zero() {
        let example = parse_line("pos cat:abc dog:").unwrap().unwrap();
        assert_eq!(
            example.features,
            vec![NamedFeature::new("cat", 0.0), NamedFeature::new("dog", 0.0)]
        );
    }

    #[test]
    fn blank_lines_and_bare_labels() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("  \r\n").unwrap(), None);
        let example = parse_line("lonely").unwrap().unwrap();
        assert_eq!(example.label, "lonely");
        assert!(example.features.is_empty());
    }
}
