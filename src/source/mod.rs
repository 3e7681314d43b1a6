//! Unit source: turns raw input into the ordered sequence of text units
//!
//! The whole input is read into memory before any partitioning happens.

use std::borrow::Cow;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

lazy_static! {
    /// A sentence is a run of non-terminators closed by `.`, `!` or `?`
    static ref SENTENCE: Regex = Regex::new(r"[^.!?]+[.!?]").unwrap();
}

/// One immutable item of input text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextUnit(String);

impl TextUnit {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TextUnit {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextUnit {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// How raw text is cut into units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// One unit per line
    #[default]
    Lines,
    /// One unit per sentence terminated by `.`, `!` or `?`
    Sentences,
}

/// Unit source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub split: SplitMode,
    /// Drop units that are empty after trimming
    pub skip_blank: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            split: SplitMode::Lines,
            skip_blank: true,
        }
    }
}

/// Where the raw input comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPath {
    File(PathBuf),
    Stdin,
}

impl InputPath {
    /// `-` selects stdin, anything else is a file path
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            InputPath::Stdin
        } else {
            InputPath::File(PathBuf::from(arg))
        }
    }
}

impl fmt::Display for InputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputPath::File(path) => write!(f, "{}", path.display()),
            InputPath::Stdin => f.write_str("<stdin>"),
        }
    }
}

/// Split raw text into units according to `config`
pub fn split_units(text: &str, config: &SourceConfig) -> Vec<TextUnit> {
    let pieces: Box<dyn Iterator<Item = &str> + '_> = match config.split {
        // `lines()` strips `\r\n` and yields nothing after a final newline
        SplitMode::Lines => Box::new(text.lines()),
        SplitMode::Sentences => Box::new(SENTENCE.find_iter(text).map(|m| m.as_str().trim())),
    };

    pieces
        .filter(|piece| !config.skip_blank || !piece.trim().is_empty())
        .map(TextUnit::new)
        .collect()
}

/// Read the whole input and split it into units
pub fn read_units(input: &InputPath, config: &SourceConfig) -> Result<Vec<TextUnit>, PipelineError> {
    let unavailable = |source| PipelineError::SourceUnavailable {
        input: input.to_string(),
        source,
    };

    let bytes = match input {
        InputPath::File(path) => std::fs::read(path).map_err(unavailable)?,
        InputPath::Stdin => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .map_err(unavailable)?;
            buffer
        }
    };

    // Invalid sequences become U+FFFD; one bad byte must not cost the whole input
    let text = String::from_utf8_lossy(&bytes);
    if let Cow::Owned(_) = text {
        tracing::debug!("{} is not valid UTF-8, invalid bytes replaced", input);
    }

    let units = split_units(&text, config);
    tracing::debug!(
        "Read {} bytes from {}, {} units ({:?} split)",
        text.len(),
        input,
        units.len(),
        config.split
    );
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn texts(units: &[TextUnit]) -> Vec<&str> {
        units.iter().map(TextUnit::as_str).collect()
    }

    #[test]
    fn test_lines_skip_blank() {
        let units = split_units("good\n\nbad\r\n  \nneutral\n", &SourceConfig::default());
        assert_eq!(texts(&units), vec!["good", "bad", "neutral"]);
    }

    #[test]
    fn test_lines_keep_blank() {
        let config = SourceConfig {
            skip_blank: false,
            ..SourceConfig::default()
        };
        let units = split_units("good\n\nbad\n", &config);
        assert_eq!(texts(&units), vec!["good", "", "bad"]);
    }

    #[test]
    fn test_sentences() {
        let config = SourceConfig {
            split: SplitMode::Sentences,
            ..SourceConfig::default()
        };
        let units = split_units("It was great! Was it? No.\nThe end. trailing", &config);
        assert_eq!(texts(&units), vec!["It was great!", "Was it?", "No.", "The end."]);
    }

    #[test]
    fn test_empty_input_has_no_units() {
        assert!(split_units("", &SourceConfig::default()).is_empty());
    }

    #[test]
    fn test_read_units_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first line").unwrap();
        writeln!(file, "second line").unwrap();

        let input = InputPath::File(file.path().to_path_buf());
        let units = read_units(&input, &SourceConfig::default()).unwrap();
        assert_eq!(texts(&units), vec!["first line", "second line"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"good\ncaf\xe9 is great\nbad\n").unwrap();

        let input = InputPath::File(file.path().to_path_buf());
        let units = read_units(&input, &SourceConfig::default()).unwrap();
        assert_eq!(texts(&units), vec!["good", "caf\u{FFFD} is great", "bad"]);
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let input = InputPath::parse("/definitely/not/here.txt");
        let err = read_units(&input, &SourceConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }

    #[test]
    fn test_dash_means_stdin() {
        assert_eq!(InputPath::parse("-"), InputPath::Stdin);
        assert_eq!(InputPath::Stdin.to_string(), "<stdin>");
    }
}
