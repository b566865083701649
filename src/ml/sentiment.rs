//! Lexicon-based polarity scoring for short English review text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+(?:'[a-z]+)?|[.!?;,]").unwrap());

/// Polarity of a negated sentiment word is multiplied by this
const NEGATION_FACTOR: f64 = -0.5;

const POLARITY: &[(&str, f64)] = &[
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("beautiful", 0.85),
    ("best", 1.0),
    ("better", 0.5),
    ("comfortable", 0.4),
    ("convenient", 0.4),
    ("decent", 0.17),
    ("delighted", 0.7),
    ("durable", 0.4),
    ("easy", 0.43),
    ("effective", 0.6),
    ("excellent", 1.0),
    ("fantastic", 0.4),
    ("fast", 0.2),
    ("fine", 0.42),
    ("good", 0.7),
    ("great", 0.8),
    ("happy", 0.8),
    ("impressive", 1.0),
    ("love", 0.5),
    ("loved", 0.7),
    ("nice", 0.6),
    ("perfect", 1.0),
    ("pleased", 0.5),
    ("recommend", 0.3),
    ("reliable", 0.5),
    ("satisfied", 0.5),
    ("smooth", 0.4),
    ("solid", 0.3),
    ("sturdy", 0.4),
    ("superb", 1.0),
    ("useful", 0.3),
    ("value", 0.2),
    ("well", 0.3),
    ("wonderful", 1.0),
    ("worth", 0.3),
    ("annoying", -0.8),
    ("awful", -1.0),
    ("bad", -0.7),
    ("broke", -0.6),
    ("broken", -0.4),
    ("cheap", -0.2),
    ("defective", -0.7),
    ("difficult", -0.5),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("expensive", -0.5),
    ("fake", -0.5),
    ("faulty", -0.6),
    ("flimsy", -0.5),
    ("hate", -0.8),
    ("horrible", -1.0),
    ("issue", -0.2),
    ("issues", -0.2),
    ("noisy", -0.3),
    ("overpriced", -0.6),
    ("poor", -0.4),
    ("problem", -0.3),
    ("problems", -0.3),
    ("slow", -0.3),
    ("terrible", -1.0),
    ("uncomfortable", -0.5),
    ("useless", -0.5),
    ("waste", -0.6),
    ("weak", -0.4),
    ("worse", -0.4),
    ("worst", -1.0),
    ("wrong", -0.5),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.5),
    ("extremely", 1.5),
    ("highly", 1.3),
    ("incredibly", 1.5),
    ("quite", 1.1),
    ("really", 1.3),
    ("so", 1.2),
    ("super", 1.3),
    ("too", 1.2),
    ("very", 1.3),
    ("fairly", 0.8),
    ("slightly", 0.5),
    ("somewhat", 0.7),
];

const NEGATORS: &[&str] = &["no", "not", "never", "nothing", "hardly", "barely", "without"];

/// Averages word polarities over the sentiment-bearing words of a text.
///
/// A negator flips and damps the next sentiment word, an intensifier scales
/// it. Sentence punctuation clears any pending modifier. The result lies in
/// [-1, 1]; text without sentiment words scores 0.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    polarity: HashMap<&'static str, f64>,
    intensifiers: HashMap<&'static str, f64>,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self {
            polarity: POLARITY.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_negator(token: &str) -> bool {
        NEGATORS.contains(&token) || token.ends_with("n't")
    }

    pub fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let mut scores = Vec::new();
        let mut negated = false;
        let mut intensity = 1.0;

        for token in TOKEN.find_iter(&lowered).map(|m| m.as_str()) {
            if matches!(token, "." | "!" | "?" | ";" | ",") {
                negated = false;
                intensity = 1.0;
            } else if Self::is_negator(token) {
                negated = !negated;
            } else if let Some(factor) = self.intensifiers.get(token) {
                intensity *= factor;
            } else if let Some(&base) = self.polarity.get(token) {
                let mut score = (base * intensity).clamp(-1.0, 1.0);
                if negated {
                    score *= NEGATION_FACTOR;
                }
                scores.push(score);
                negated = false;
                intensity = 1.0;
            }
        }

        if scores.is_empty() {
            return 0.0;
        }
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        mean.clamp(-1.0, 1.0)
    }

    /// Polarity of optional text; absent text is neutral
    pub fn polarity_of(&self, text: Option<&str>) -> f64 {
        text.map(|t| self.polarity(t)).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", 0.0 ; "empty")]
    #[test_case("The box arrived on Tuesday", 0.0 ; "no sentiment words")]
    #[test_case("good", 0.7 ; "single word")]
    #[test_case("not good", -0.35 ; "negation flips and damps")]
    #[test_case("great but noisy", 0.25 ; "mean of words")]
    fn scores_text(text: &str, expected: f64) {
        let analyzer = SentimentAnalyzer::new();
        assert!((analyzer.polarity(text) - expected).abs() < 1e-9);
    }

    #[test]
    fn intensifiers_scale_and_clamp() {
        let analyzer = SentimentAnalyzer::new();
        assert!(analyzer.polarity("very good") > analyzer.polarity("good"));
        assert_eq!(analyzer.polarity("absolutely excellent"), 1.0);
        assert_eq!(analyzer.polarity("extremely terrible"), -1.0);
    }

    #[test]
    fn contractions_negate() {
        let analyzer = SentimentAnalyzer::new();
        assert!(analyzer.polarity("It doesn't work well") < 0.0);
    }

    #[test]
    fn punctuation_ends_negation() {
        let analyzer = SentimentAnalyzer::new();
        assert!(analyzer.polarity("Not cheap. Good quality") > 0.0);
    }

    #[test]
    fn absent_text_is_neutral() {
        assert_eq!(SentimentAnalyzer::new().polarity_of(None), 0.0);
    }
}
