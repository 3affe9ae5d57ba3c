//! Opener surprisal scoring.
//!
//! Scoring sits behind [`SurprisalScorer`] so a language-model backed scorer
//! can replace the default heuristic without touching table construction.

use std::collections::HashSet;

/// Scores how surprising an opening line is. Higher is more surprising.
pub trait SurprisalScorer: Send + Sync {
    /// Returns `None` when the opener cannot be scored.
    fn score(&self, opener: &str) -> Option<f64>;
}

/// Deterministic text heuristic over punctuation, length and vocabulary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicSurprisal {
    /// Starting score before multipliers.
    pub base: f64,
}

impl Default for HeuristicSurprisal {
    fn default() -> Self {
        Self { base: 10.0 }
    }
}

impl SurprisalScorer for HeuristicSurprisal {
    #[allow(clippy::cast_precision_loss)]
    fn score(&self, opener: &str) -> Option<f64> {
        let text = opener.trim();
        if text.is_empty() {
            return None;
        }
        let lower = text.to_lowercase();
        let char_count = text.chars().count();
        let mut score = self.base;

        if text.contains('"') && ["poem", "by", "verse"].iter().any(|w| lower.contains(w)) {
            score *= 8.0;
        }
        if text.starts_with('"') && char_count > 100 {
            score *= 6.0;
        }
        score *= 0.5f64.mul_add(text.matches(';').count() as f64, 1.0);
        score *= 0.3f64.mul_add(text.matches(':').count() as f64, 1.0);
        if char_count > 200 {
            score *= 2.0;
        }
        if lower.starts_with("i ") || lower.contains(" i ") {
            score *= 0.7;
        }
        if text.contains('?') {
            score *= 1.2;
        }

        let words: Vec<&str> = lower.split_whitespace().collect();
        let unique: HashSet<&str> = words.iter().copied().collect();
        let uniqueness = unique.len() as f64 / words.len().max(1) as f64;
        score *= uniqueness.mul_add(0.4, 0.8);

        Some(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(left: f64, right: f64) {
        assert!((left - right).abs() < 1e-9, "{left} != {right}");
    }

    #[test]
    fn plain_unique_statement_scores_base_times_uniqueness() {
        let scorer = HeuristicSurprisal::default();
        approx(scorer.score("Good morning everyone.").unwrap_or_default(), 12.0);
    }

    #[test]
    fn first_person_and_questions_adjust_score() {
        let scorer = HeuristicSurprisal::default();
        approx(scorer.score("I wonder why").unwrap_or_default(), 10.0 * 0.7 * 1.2);
        approx(scorer.score("Why not").unwrap_or_default(), 12.0);
        approx(scorer.score("Why not?").unwrap_or_default(), 10.0 * 1.2 * 1.2);
    }

    #[test]
    fn quoted_poem_lines_score_high() {
        let scorer = HeuristicSurprisal::default();
        let quoted = scorer.score("\"Hope is the thing,\" a poem").unwrap_or_default();
        let plain = scorer.score("Hope is the thing, a note").unwrap_or_default();
        assert!(quoted > plain * 7.0);
    }

    #[test]
    fn punctuation_and_repetition() {
        let scorer = HeuristicSurprisal::default();
        approx(scorer.score("one; two: three").unwrap_or_default(), 10.0 * 1.5 * 1.3 * 1.2);
        approx(scorer.score("no no no no").unwrap_or_default(), 9.0);
    }

    #[test]
    fn empty_opener_is_unscored() {
        assert_eq!(HeuristicSurprisal::default().score("   "), None);
    }

    #[test]
    fn scores_are_deterministic() {
        let scorer = HeuristicSurprisal::default();
        let text = "So: what happens when we listen?";
        assert_eq!(scorer.score(text), scorer.score(text));
    }
}
