use std::collections::{HashMap, HashSet};
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use super::{ScoreValue, Scorer};
use crate::error::{PipelineError, ScoreError};

// Embed the default model at compile time
const BUNDLED_MODEL: &str = include_str!("../../data/default-model.json");

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"[\p{L}\p{N}']+").unwrap();
}

const NEGATIVE: ScoreValue = ScoreValue(0);
const POSITIVE: ScoreValue = ScoreValue(1);

/// On-disk model document
#[derive(Debug, Deserialize)]
struct ModelFile {
    name: String,
    #[serde(default)]
    threshold: f64,
    words: HashMap<String, f64>,
    #[serde(default)]
    negations: Vec<String>,
    #[serde(default)]
    intensifiers: HashMap<String, f64>,
}

/// Weighted-lexicon binary sentiment classifier
///
/// Each token contributes its weight; a negation flips the sign of the next
/// weighted token and an intensifier scales it. The unit is labelled positive
/// when the total exceeds the threshold.
#[derive(Debug, Clone)]
pub struct LexiconModel {
    name: String,
    threshold: f64,
    words: HashMap<String, f64>,
    negations: HashSet<String>,
    intensifiers: HashMap<String, f64>,
}

impl LexiconModel {
    /// The model shipped inside the binary
    pub fn bundled() -> Result<Self, PipelineError> {
        Self::from_json("<bundled>", BUNDLED_MODEL)
    }

    /// Load a model document from disk
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let label = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| PipelineError::scorer_init(&label, e))?;
        Self::from_json(&label, &content)
    }

    pub fn from_json(label: &str, content: &str) -> Result<Self, PipelineError> {
        let file: ModelFile =
            serde_json::from_str(content).map_err(|e| PipelineError::scorer_init(label, e))?;

        if file.words.is_empty() {
            return Err(PipelineError::scorer_init(label, "model has no words"));
        }
        if !file.threshold.is_finite() {
            return Err(PipelineError::scorer_init(label, "threshold must be finite"));
        }
        if let Some((word, _)) = file.words.iter().find(|(_, w)| !w.is_finite()) {
            return Err(PipelineError::scorer_init(
                label,
                format!("weight for '{word}' is not finite"),
            ));
        }
        if let Some((word, _)) = file.intensifiers.iter().find(|(_, m)| !m.is_finite()) {
            return Err(PipelineError::scorer_init(
                label,
                format!("multiplier for '{word}' is not finite"),
            ));
        }

        Ok(Self {
            name: file.name,
            threshold: file.threshold,
            words: lowercase_keys(file.words),
            negations: file.negations.into_iter().map(|w| w.to_lowercase()).collect(),
            intensifiers: lowercase_keys(file.intensifiers),
        })
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, PipelineError> {
        if !threshold.is_finite() {
            return Err(PipelineError::scorer_init(&self.name, "threshold must be finite"));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn vocabulary_size(&self) -> usize {
        self.words.len()
    }

    /// Raw polarity of `text`; text without known words is neutral (0.0)
    pub fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let mut total = 0.0;
        let mut negate = false;
        let mut multiplier = 1.0;

        for token in TOKEN.find_iter(&lowered) {
            let token = token.as_str().trim_matches('\'');
            if self.negations.contains(token) {
                negate = !negate;
            } else if let Some(factor) = self.intensifiers.get(token) {
                multiplier *= factor;
            } else if let Some(weight) = self.words.get(token) {
                let signed = if negate { -weight } else { *weight };
                total += signed * multiplier;
                negate = false;
                multiplier = 1.0;
            }
        }

        total
    }
}

impl Scorer for LexiconModel {
    fn score(&self, text: &str) -> Result<ScoreValue, ScoreError> {
        let polarity = self.polarity(text);
        // Stacked intensifiers on extreme weights can overflow
        if !polarity.is_finite() {
            return Err(ScoreError::Rejected(format!("polarity {polarity} is not finite")));
        }
        Ok(if polarity > self.threshold {
            POSITIVE
        } else {
            NEGATIVE
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn lowercase_keys(map: HashMap<String, f64>) -> HashMap<String, f64> {
    map.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LexiconModel {
        LexiconModel::bundled().expect("bundled model must parse")
    }

    #[test]
    fn test_bundled_model_loads() {
        let model = model();
        assert!(model.vocabulary_size() > 50);
        assert_eq!(model.threshold(), 0.0);
    }

    #[test]
    fn test_basic_polarity() {
        let model = model();
        assert_eq!(model.score("This is good").unwrap(), POSITIVE);
        assert_eq!(model.score("This is bad").unwrap(), NEGATIVE);
        assert_eq!(model.score("GREAT movie!").unwrap(), POSITIVE);
    }

    #[test]
    fn test_unknown_words_are_negative() {
        // Zero does not exceed the threshold
        assert_eq!(model().score("the table has four legs").unwrap(), NEGATIVE);
    }

    #[test]
    fn test_negation_flips_next_word() {
        let model = model();
        assert_eq!(model.score("not good").unwrap(), NEGATIVE);
        assert_eq!(model.score("not bad").unwrap(), POSITIVE);
        assert_eq!(model.score("I don't hate it").unwrap(), POSITIVE);
    }

    #[test]
    fn test_intensifier_scales_next_word() {
        let model = model();
        let plain = model.polarity("good");
        let boosted = model.polarity("very good");
        assert!(boosted > plain);
    }

    #[test]
    fn test_text_without_words_is_negative() {
        let model = model();
        for text in ["", "   ", "-- ... !!", "---", ":)"] {
            assert_eq!(model.polarity(text), 0.0);
            assert_eq!(model.score(text).unwrap(), NEGATIVE);
        }
    }

    #[test]
    fn test_overflowing_polarity_is_rejected() {
        let json = r#"{"name":"huge","words":{"big":1e300},"intensifiers":{"very":1e300}}"#;
        let model = LexiconModel::from_json("huge", json).unwrap();
        assert_eq!(model.score("big").unwrap(), POSITIVE);
        assert!(matches!(model.score("very big"), Err(ScoreError::Rejected(_))));
    }

    #[test]
    fn test_rejects_empty_vocabulary() {
        let err = LexiconModel::from_json("test", r#"{"name":"empty","words":{}}"#).unwrap_err();
        assert!(err.to_string().contains("no words"));
    }

    #[test]
    fn test_rejects_malformed_document() {
        let err = LexiconModel::from_json("test", "{not json").unwrap_err();
        assert!(matches!(err, PipelineError::ScorerInit { .. }));
    }

    #[test]
    fn test_custom_model_is_case_insensitive() {
        let json = r#"{"name":"tiny","words":{"Yes":1.0,"No":-1.0},"negations":["NOT"]}"#;
        let model = LexiconModel::from_json("tiny", json).unwrap();
        assert_eq!(model.name(), "tiny");
        assert_eq!(model.score("yes").unwrap(), POSITIVE);
        assert_eq!(model.score("not YES").unwrap(), NEGATIVE);
    }
}
