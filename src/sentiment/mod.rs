//! Lexicon-based sentiment scoring
//!
//! Computes a polarity score in [-1, 1] as the mean score of lexicon words
//! found in the text, then maps it to a coarse label with fixed thresholds:
//! score > 0.1 is positive, score < -0.1 is negative, anything in between
//! is neutral. Text with no scoreable word yields `Unknown`.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::db::Sentiment;

/// Threshold on either side of zero; strictly exceeded to leave neutral.
const POLARITY_THRESHOLD: f64 = 0.1;

// Word polarities, roughly in [-1, 1]. Biased toward the vocabulary of
// crypto/market news headlines and bodies.
const LEXICON: &[(&str, f64)] = &[
    // positive
    ("surge", 0.6),
    ("surges", 0.6),
    ("surged", 0.6),
    ("surging", 0.6),
    ("rally", 0.5),
    ("rallies", 0.5),
    ("rallied", 0.5),
    ("soar", 0.7),
    ("soars", 0.7),
    ("soared", 0.7),
    ("gain", 0.4),
    ("gains", 0.4),
    ("gained", 0.4),
    ("rise", 0.3),
    ("rises", 0.3),
    ("rose", 0.3),
    ("rising", 0.3),
    ("jump", 0.4),
    ("jumps", 0.4),
    ("jumped", 0.4),
    ("climb", 0.35),
    ("climbs", 0.35),
    ("climbed", 0.35),
    ("boom", 0.6),
    ("booming", 0.6),
    ("bullish", 0.7),
    ("bull", 0.4),
    ("breakout", 0.5),
    ("record", 0.3),
    ("high", 0.2),
    ("highs", 0.2),
    ("strong", 0.4),
    ("strength", 0.4),
    ("growth", 0.4),
    ("growing", 0.35),
    ("profit", 0.5),
    ("profits", 0.5),
    ("profitable", 0.55),
    ("win", 0.5),
    ("wins", 0.5),
    ("winning", 0.5),
    ("success", 0.6),
    ("successful", 0.6),
    ("optimism", 0.5),
    ("optimistic", 0.5),
    ("positive", 0.5),
    ("good", 0.5),
    ("great", 0.8),
    ("excellent", 0.9),
    ("amazing", 0.8),
    ("impressive", 0.6),
    ("promising", 0.5),
    ("momentum", 0.25),
    ("adoption", 0.3),
    ("approval", 0.4),
    ("approved", 0.4),
    ("milestone", 0.4),
    ("recovery", 0.35),
    ("recovered", 0.35),
    ("rebound", 0.4),
    ("rebounds", 0.4),
    ("upside", 0.4),
    ("outperform", 0.5),
    ("confidence", 0.35),
    // negative
    ("crash", -0.8),
    ("crashes", -0.8),
    ("crashed", -0.8),
    ("plunge", -0.7),
    ("plunges", -0.7),
    ("plunged", -0.7),
    ("plummet", -0.7),
    ("plummets", -0.7),
    ("plummeted", -0.7),
    ("drop", -0.4),
    ("drops", -0.4),
    ("dropped", -0.4),
    ("fall", -0.4),
    ("falls", -0.4),
    ("fell", -0.4),
    ("falling", -0.4),
    ("slump", -0.5),
    ("slumps", -0.5),
    ("decline", -0.4),
    ("declines", -0.4),
    ("declined", -0.4),
    ("loss", -0.5),
    ("losses", -0.5),
    ("lose", -0.5),
    ("loses", -0.5),
    ("losing", -0.5),
    ("bearish", -0.7),
    ("bear", -0.4),
    ("selloff", -0.6),
    ("dump", -0.5),
    ("dumped", -0.5),
    ("fear", -0.6),
    ("fears", -0.6),
    ("panic", -0.7),
    ("risk", -0.3),
    ("risky", -0.4),
    ("warning", -0.4),
    ("warns", -0.4),
    ("warned", -0.4),
    ("fraud", -0.8),
    ("scam", -0.9),
    ("hack", -0.7),
    ("hacked", -0.7),
    ("exploit", -0.6),
    ("ban", -0.5),
    ("banned", -0.5),
    ("lawsuit", -0.5),
    ("crackdown", -0.5),
    ("weak", -0.4),
    ("weakness", -0.4),
    ("bad", -0.5),
    ("worse", -0.6),
    ("worst", -0.8),
    ("terrible", -0.8),
    ("negative", -0.5),
    ("bubble", -0.4),
    ("collapse", -0.8),
    ("collapsed", -0.8),
    ("liquidation", -0.5),
    ("liquidations", -0.5),
    ("low", -0.2),
    ("lows", -0.2),
    ("uncertainty", -0.4),
    ("volatile", -0.3),
    ("volatility", -0.3),
    ("concern", -0.4),
    ("concerns", -0.4),
];

fn lexicon() -> &'static HashMap<&'static str, f64> {
    static INDEX: OnceLock<HashMap<&'static str, f64>> = OnceLock::new();
    INDEX.get_or_init(|| LEXICON.iter().copied().collect())
}

/// Polarity score in [-1, 1], or `None` when no lexicon word matches.
pub fn polarity(text: &str) -> Option<f64> {
    let mut sum = 0.0;
    let mut matched = 0usize;

    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        if let Some(score) = lexicon().get(token.to_lowercase().as_str()) {
            sum += score;
            matched += 1;
        }
    }

    (matched > 0).then(|| sum / matched as f64)
}

/// Map a polarity score to its label.
pub fn label_for_polarity(score: f64) -> Sentiment {
    if score > POLARITY_THRESHOLD {
        Sentiment::Positive
    } else if score < -POLARITY_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Label for a body of text; unscoreable text yields `Unknown`.
pub fn label(text: &str) -> Sentiment {
    match polarity(text) {
        Some(score) => label_for_polarity(score),
        None => Sentiment::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(label_for_polarity(0.1), Sentiment::Neutral);
        assert_eq!(label_for_polarity(0.1001), Sentiment::Positive);
        assert_eq!(label_for_polarity(-0.1), Sentiment::Neutral);
        assert_eq!(label_for_polarity(-0.1001), Sentiment::Negative);
        assert_eq!(label_for_polarity(0.0), Sentiment::Neutral);
    }

    #[test]
    fn test_empty_or_unscoreable_text_is_unknown() {
        assert_eq!(label(""), Sentiment::Unknown);
        assert_eq!(label("the of and a"), Sentiment::Unknown);
        assert_eq!(label("12345 !!!"), Sentiment::Unknown);
    }

    #[test]
    fn test_positive_text() {
        assert_eq!(
            label("Bitcoin surges to a new record as the rally gains strength"),
            Sentiment::Positive
        );
    }

    #[test]
    fn test_negative_text() {
        assert_eq!(
            label("Bitcoin crashes amid panic selling and fears of a crackdown"),
            Sentiment::Negative
        );
    }

    #[test]
    fn test_mixed_text_lands_near_neutral() {
        // one +0.2 and one -0.2 word average to 0.0
        assert_eq!(label("price swung between high and low"), Sentiment::Neutral);
    }

    #[test]
    fn test_polarity_stays_in_range() {
        let score = polarity("excellent amazing great surge rally soar").unwrap();
        assert!(score > 0.1 && score <= 1.0);

        let score = polarity("scam fraud crash collapse worst terrible").unwrap();
        assert!(score < -0.1 && score >= -1.0);
    }

    #[test]
    fn test_tokenization_ignores_punctuation_and_case() {
        assert_eq!(label("SURGES! Rally, gains..."), Sentiment::Positive);
    }
}
