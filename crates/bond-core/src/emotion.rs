//! Keyword-based emotion classification
//!
//! Maps free text onto one of a small set of labels. Rules are checked in
//! order and the first match wins.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse emotional label attached to the bond and to each history entry.
///
/// Labels this version does not know (written by a newer one) decode as
/// `Neutral` rather than rejecting the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Joy,
    Sadness,
    Anger,
    Love,
    #[default]
    #[serde(other)]
    Neutral,
}

/// Ordered keyword rules, first match wins
const RULES: &[(&str, EmotionLabel)] = &[
    ("love", EmotionLabel::Love),
    ("hate", EmotionLabel::Anger),
    ("sad", EmotionLabel::Sadness),
];

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 5] = [
        Self::Neutral,
        Self::Joy,
        Self::Sadness,
        Self::Anger,
        Self::Love,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Joy => "joy",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Love => "love",
        }
    }

    /// Affect dimensions associated with this label
    pub fn profile(self) -> &'static [(&'static str, f32)] {
        match self {
            Self::Neutral => &[("calm", 0.5), ("focus", 0.5)],
            Self::Joy => &[("energy", 0.9), ("warmth", 0.9)],
            Self::Sadness => &[("low_energy", 0.3), ("withdrawal", 0.4)],
            Self::Anger => &[("high_energy", 0.8), ("aggression", 0.7)],
            Self::Love => &[("warmth", 1.0), ("bond", 1.0)],
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify text by case-insensitive substring match.
///
/// Total and pure: text matching no rule is `Neutral`.
pub fn classify(text: &str) -> EmotionLabel {
    let lowered = text.to_lowercase();

    RULES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, label)| *label)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(classify("I love you"), EmotionLabel::Love);
        assert_eq!(classify("I hate this"), EmotionLabel::Anger);
        assert_eq!(classify("feeling sad today"), EmotionLabel::Sadness);
        assert_eq!(classify("what's the weather"), EmotionLabel::Neutral);
        assert_eq!(classify(""), EmotionLabel::Neutral);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("LOVE"), EmotionLabel::Love);
        assert_eq!(classify("HaTe"), EmotionLabel::Anger);
        assert_eq!(classify("So SAD"), EmotionLabel::Sadness);
    }

    #[test]
    fn test_rule_precedence() {
        assert_eq!(classify("I love but also hate you"), EmotionLabel::Love);
        assert_eq!(classify("I hate being sad"), EmotionLabel::Anger);
        assert_eq!(classify("sad that I love it"), EmotionLabel::Love);
    }

    #[test]
    fn test_substring_match() {
        // Substrings count, not whole words
        assert_eq!(classify("lovely day"), EmotionLabel::Love);
        assert_eq!(classify("a saddle"), EmotionLabel::Sadness);
    }

    #[test]
    fn test_deterministic() {
        let input = "I hate Mondays";
        assert_eq!(classify(input), classify(input));
    }

    #[test]
    fn test_label_serde() {
        let json = serde_json::to_string(&EmotionLabel::Sadness).unwrap();
        assert_eq!(json, "\"sadness\"");

        for label in EmotionLabel::ALL {
            let encoded = serde_json::to_string(&label).unwrap();
            assert_eq!(encoded, format!("\"{}\"", label));
        }
    }

    #[test]
    fn test_unknown_label_decodes_as_neutral() {
        let label: EmotionLabel = serde_json::from_str("\"fear\"").unwrap();
        assert_eq!(label, EmotionLabel::Neutral);

        let label: EmotionLabel = serde_json::from_str("\"neutral\"").unwrap();
        assert_eq!(label, EmotionLabel::Neutral);
    }

    #[test]
    fn test_every_label_has_profile() {
        for label in EmotionLabel::ALL {
            assert_eq!(label.profile().len(), 2);
        }
    }
}
