use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::analyze::round4;

/// word → (polarity, subjectivity)
static LEXICON: Lazy<HashMap<String, (f64, f64)>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, (f64, f64)>>(raw).expect("valid sentiment lexicon")
});

/// Labels are derived from polarity with a ±0.1 dead zone.
const LABEL_BAND: f64 = 0.1;

/// Black-box sentiment collaborator: text → (polarity in [-1,1],
/// subjectivity in [0,1]). Never called with empty text.
pub trait SentimentModel: Send + Sync {
    fn polarity_subjectivity(&self, text: &str) -> (f64, f64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > LABEL_BAND {
            SentimentLabel::Positive
        } else if polarity < -LABEL_BAND {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub polarity: f64,
    pub subjectivity: f64,
    pub label: SentimentLabel,
}

impl Sentiment {
    pub const NEUTRAL: Sentiment = Sentiment {
        polarity: 0.0,
        subjectivity: 0.0,
        label: SentimentLabel::Neutral,
    };
}

/// Run the model on `text`, rounding both scores to 4 decimals.
/// Blank text short-circuits to `Sentiment::NEUTRAL` without touching the model.
pub fn analyze_sentiment(model: &dyn SentimentModel, text: &str) -> Sentiment {
    if text.trim().is_empty() {
        return Sentiment::NEUTRAL;
    }
    let (p, s) = model.polarity_subjectivity(text);
    let polarity = round4(p);
    Sentiment {
        polarity,
        subjectivity: round4(s),
        label: SentimentLabel::from_polarity(polarity),
    }
}

/// Bundled lexicon model: mean of word scores, with intensifiers and
/// a 3-token negation window (negated words flip and halve).
#[derive(Debug, Clone, Default)]
pub struct LexiconSentiment;

impl LexiconSentiment {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_score(&self, w: &str) -> Option<(f64, f64)> {
        LEXICON.get(w).copied()
    }
}

impl SentimentModel for LexiconSentiment {
    fn polarity_subjectivity(&self, text: &str) -> (f64, f64) {
        // Index backwards for negation, so collect first.
        let tokens: Vec<String> = tokenize(text).collect();
        let mut pol_sum = 0.0;
        let mut subj_sum = 0.0;
        let mut hits = 0usize;

        for i in 0..tokens.len() {
            let Some((mut pol, subj)) = self.word_score(tokens[i].as_str()) else {
                continue;
            };
            if i >= 1 {
                pol *= intensity(tokens[i - 1].as_str());
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            if negated {
                pol *= -0.5;
            }
            pol_sum += pol;
            subj_sum += subj;
            hits += 1;
        }

        if hits == 0 {
            return (0.0, 0.0);
        }
        let n = hits as f64;
        ((pol_sum / n).clamp(-1.0, 1.0), (subj_sum / n).clamp(0.0, 1.0))
    }
}

/// Word tokens (apostrophes kept), lower-case.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    static RE_WORD: OnceCell<Regex> = OnceCell::new();
    let re = RE_WORD.get_or_init(|| Regex::new(r"(?u)[\w']+").expect("word regex"));
    re.find_iter(s).map(|m| m.as_str().to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not" | "no" | "never" | "isn't" | "wasn't" | "aren't" | "won't" | "can't" | "cannot"
            | "without"
    )
}

fn intensity(tok: &str) -> f64 {
    match tok {
        "very" | "extremely" | "highly" | "deeply" => 1.3,
        "really" | "so" | "too" => 1.2,
        "slightly" | "somewhat" | "mildly" => 0.7,
        _ => 1.0,
    }
}
