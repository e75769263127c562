//! Expression labels derived from reply text
//!
//! The robot's face shows one of a fixed set of expressions. Labels are picked
//! by a keyword table; the first matching rule wins, otherwise `neutral`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coarse emotional category of an assistant reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    Neutral,
    Happy,
    Sad,
    Surprised,
    Angry,
    Thinking,
    Excited,
    Sleepy,
}

impl Expression {
    /// Every label, in the order clients enumerate them
    pub const ALL: [Self; 8] = [
        Self::Neutral,
        Self::Happy,
        Self::Sad,
        Self::Surprised,
        Self::Angry,
        Self::Thinking,
        Self::Excited,
        Self::Sleepy,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Surprised => "surprised",
            Self::Angry => "angry",
            Self::Thinking => "thinking",
            Self::Excited => "excited",
            Self::Sleepy => "sleepy",
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Ordered: stronger emotions are checked before milder ones.
static RULES: LazyLock<Vec<(Expression, Regex)>> = LazyLock::new(|| {
    [
        (
            Expression::Excited,
            r"(?i)ワクワク|わくわく|楽しみ|最高|[!！]{2,}|amazing|awesome|can't wait|so excited",
        ),
        (
            Expression::Surprised,
            r"(?i)びっくり|驚|えっ|まさか|なんと|\bwow\b|\breally\?|surpris",
        ),
        (
            Expression::Angry,
            r"(?i)怒|ぷんぷん|許さない|ムカ|\bangry\b|furious|annoy",
        ),
        (
            Expression::Sad,
            r"(?i)悲し|かなし|残念|ごめん|しょんぼり|寂し|エラー|\bsad\b|\bsorry\b|unfortunately|error",
        ),
        (
            Expression::Sleepy,
            r"(?i)眠|ねむ|おやすみ|zzz|sleepy|tired|good night",
        ),
        (
            Expression::Thinking,
            r"(?i)うーん|考え|かなぁ|\bhmm+\b|let me think|i wonder|[?？]\s*$",
        ),
        (
            Expression::Happy,
            r"(?i)嬉し|うれし|楽し|好き|ありがと|やった|\bhappy\b|\bglad\b|thank|\bgreat\b|\bfun\b",
        ),
    ]
    .into_iter()
    .map(|(label, pattern)| (label, Regex::new(pattern).expect("valid regex")))
    .collect()
});

/// Classify reply text into an expression label
#[must_use]
pub fn classify(text: &str) -> Expression {
    RULES
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map_or(Expression::Neutral, |(label, _)| *label)
}
