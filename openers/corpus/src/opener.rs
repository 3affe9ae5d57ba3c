//! Opening-line extraction.
//!
//! Marker detection is a case-insensitive substring check over `(...)` and
//! `[...]` annotations. It stays loose: effect sizes downstream are
//! calibrated against exactly this behaviour.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^()]*\)|\[[^\[\]]*\]").unwrap());
static TRAILING_ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\([^()]*\)|\[[^\[\]]*\])\s*$").unwrap());
static WE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bwe\b").unwrap());
static YOU: Lazy<Regex> = Lazy::new(|| Regex::new(r"\byou\b").unwrap());

const POETRY_PHRASES: [&str; 6] = [
    "this poem",
    "called \"",
    "by william",
    "by robert",
    "by emma",
    "by emily",
];
const POETRY_TRANSCRIPT_PREFIX_CHARS: usize = 500;
const QUOTE_DENSE_MIN_CHARS: usize = 100;
const CLOSING_MARKS: [char; 8] = ['"', '\'', '\u{201d}', '\u{2019}', '\u{bb}', ')', ']', '*'];
const OPENING_QUOTES: [char; 4] = ['"', '\u{201c}', '\u{ab}', '\''];

/// Features derived from a transcript's opening line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenerFeatures {
    /// The opening line, trimmed. Empty when the transcript has no content.
    pub opening_line: String,
    /// Character count of the opening line.
    pub char_count: usize,
    /// Whitespace tokens once annotations are removed.
    pub word_count: usize,
    /// A laughter annotation appears on the opening line.
    pub has_laughter: bool,
    /// An applause annotation appears on the opening line.
    pub has_applause: bool,
    /// The line ends with a question mark, ignoring closing marks and trailing annotations.
    pub is_interrogative: bool,
    /// The first word is "I" (or a contraction of it).
    pub starts_with_i: bool,
    /// The word "we" appears.
    pub has_we: bool,
    /// The word "you" appears.
    pub has_you: bool,
    /// The line opens with a double quote.
    pub starts_with_quote: bool,
    /// Low-precision guess that the talk opens with a poem reading.
    pub is_poetry: bool,
}

impl OpenerFeatures {
    /// True when no opening line was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opening_line.is_empty()
    }

    /// Exclusive opening strategy used for distribution comparisons.
    #[must_use]
    pub fn strategy(&self) -> OpeningStrategy {
        if self.is_interrogative {
            OpeningStrategy::Question
        } else if self.starts_with_i {
            OpeningStrategy::Personal
        } else if self.starts_with_quote {
            OpeningStrategy::Quote
        } else {
            OpeningStrategy::Other
        }
    }

    /// Opening line with annotations removed.
    #[must_use]
    pub fn spoken_text(&self) -> String {
        strip_annotations(&self.opening_line)
    }
}

/// How a talk opens; precedence is Question, Personal, Quote, Other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningStrategy {
    /// Ends with a question mark.
    Question,
    /// Starts with "I".
    Personal,
    /// Starts with a quotation.
    Quote,
    /// Anything else, including empty openers.
    Other,
}

impl OpeningStrategy {
    /// Every strategy in table order.
    pub const ALL: [Self; 4] = [Self::Question, Self::Personal, Self::Quote, Self::Other];

    /// Stable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Personal => "personal",
            Self::Quote => "quote",
            Self::Other => "other",
        }
    }
}

/// Derives opener features from a full transcript. Pure and total.
#[must_use]
pub fn extract(transcript: &str) -> OpenerFeatures {
    let line = opening_line(transcript);
    if strip_annotations(transcript).is_empty() {
        return OpenerFeatures::default();
    }
    let spoken = strip_annotations(line);
    let lowered = spoken.to_lowercase();
    OpenerFeatures {
        opening_line: line.to_string(),
        char_count: line.chars().count(),
        word_count: spoken.split_whitespace().count(),
        has_laughter: has_marker(line, "laugh"),
        has_applause: has_marker(line, "applau"),
        is_interrogative: is_interrogative(line),
        starts_with_i: starts_with_i(&spoken),
        has_we: WE.is_match(&lowered),
        has_you: YOU.is_match(&lowered),
        starts_with_quote: line.starts_with(['"', '\u{201c}']),
        is_poetry: is_poetry(line, transcript),
    }
}

/// First non-blank line, trimmed. A marker-only line such as `(Laughter)`
/// counts as the opener.
#[must_use]
pub fn opening_line(transcript: &str) -> &str {
    transcript
        .split(['\n', '\r'])
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

/// Removes `(...)` and `[...]` annotations and collapses the leftover whitespace.
#[must_use]
pub fn strip_annotations(line: &str) -> String {
    ANNOTATION
        .replace_all(line, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_marker(line: &str, needle: &str) -> bool {
    ANNOTATION
        .find_iter(line)
        .any(|annotation| annotation.as_str().to_lowercase().contains(needle))
}

fn is_interrogative(line: &str) -> bool {
    let mut text = line.trim_end();
    loop {
        let before = text.len();
        if let Some(found) = TRAILING_ANNOTATION.find(text) {
            text = text[..found.start()].trim_end();
        }
        text = text.trim_end_matches(CLOSING_MARKS).trim_end();
        if text.len() == before {
            break;
        }
    }
    text.ends_with('?')
}

fn starts_with_i(spoken: &str) -> bool {
    let Some(first) = spoken.trim_start_matches(OPENING_QUOTES).split_whitespace().next() else {
        return false;
    };
    let word: String = first
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '\'' | '\u{2019}'))
        .flat_map(char::to_lowercase)
        .collect();
    word == "i" || word.starts_with("i'") || word.starts_with("i\u{2019}")
}

fn is_poetry(line: &str, transcript: &str) -> bool {
    let lowered = line.to_lowercase();
    if POETRY_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        return true;
    }
    if lowered.matches('"').count() >= 2 && line.chars().count() > QUOTE_DENSE_MIN_CHARS {
        return true;
    }
    transcript
        .chars()
        .take(POETRY_TRANSCRIPT_PREFIX_CHARS)
        .collect::<String>()
        .to_lowercase()
        .contains("this poem")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_content_line_wins() {
        let features = extract("\n   \nHello there.\nSecond line?");
        assert_eq!(features.opening_line, "Hello there.");
        assert_eq!(features.word_count, 2);
        assert_eq!(features.char_count, 12);
        assert!(!features.is_interrogative);
    }

    #[test]
    fn empty_and_marker_only_transcripts_default() {
        assert_eq!(extract(""), OpenerFeatures::default());
        assert_eq!(extract("  \n\t\n"), OpenerFeatures::default());
        assert_eq!(extract("(Applause)\n(Music)\n[Laughter]"), OpenerFeatures::default());
    }

    #[test]
    fn marker_only_first_line_is_the_opener() {
        let features = extract("(Laughter)\nHello.");
        assert_eq!(features.opening_line, "(Laughter)");
        assert!(features.has_laughter);
        assert_eq!(features.word_count, 0);
        assert!(!features.is_empty());

        let applause = extract("  \n[Applause]\nThank you.");
        assert_eq!(applause.opening_line, "[Applause]");
        assert!(applause.has_applause);
    }

    #[test]
    fn laughter_detected_in_any_case() {
        for line in ["(Laughter) Hello.", "Hello. (LAUGHTER)", "So [laughs] yes", "(laughter)"] {
            let transcript = format!("{line} words\n");
            assert!(extract(&transcript).has_laughter, "{line}");
        }
        assert!(!extract("I laugh at nothing.").has_laughter);
    }

    #[test]
    fn markers_only_checked_on_opening_line() {
        let features = extract("Good morning.\n(Laughter) (Applause)");
        assert!(!features.has_laughter);
        assert!(!features.has_applause);
        assert!(extract("Thank you. (Applause)").has_applause);
    }

    #[test]
    fn annotations_do_not_inflate_word_count() {
        let features = extract("(Laughter) Hello. (Applause)");
        assert_eq!(features.word_count, 1);
        assert!(features.has_laughter);
        assert!(features.has_applause);
    }

    #[test]
    fn interrogative_ignores_closing_marks_and_trailing_annotations() {
        assert!(extract("Is this working?").is_interrogative);
        assert!(extract("He asked, \"Why me?\"  ").is_interrogative);
        assert!(extract("Who am I? (Laughter)").is_interrogative);
        assert!(!extract("Is this working? No.").is_interrogative);
        assert!(!extract("What a day.").is_interrogative);
    }

    #[test]
    fn pronoun_flags() {
        let personal = extract("I'm going to talk about you and we.");
        assert!(personal.starts_with_i);
        assert!(personal.has_you);
        assert!(personal.has_we);
        assert!(extract("\"I remember,\" she said.").starts_with_i);
        assert!(!extract("Imagine a world.").starts_with_i);
        assert!(!extract("Youth is wasted.").has_you);
        assert!(!extract("Wednesday came.").has_we);
    }

    #[test]
    fn strategy_precedence() {
        assert_eq!(extract("I wonder, do you?").strategy(), OpeningStrategy::Question);
        assert_eq!(extract("I was born here.").strategy(), OpeningStrategy::Personal);
        assert_eq!(extract("\"Be bold,\" they said.").strategy(), OpeningStrategy::Quote);
        assert_eq!(extract("Good morning.").strategy(), OpeningStrategy::Other);
        assert_eq!(extract("").strategy(), OpeningStrategy::Other);
    }

    #[test]
    fn poetry_heuristic() {
        assert!(extract("This poem is called \"Home.\"").is_poetry);
        assert!(extract("A sonnet by William Shakespeare.").is_poetry);
        assert!(extract("Good evening.\nI wrote this poem last spring.").is_poetry);
        let dense = format!("\"{}\" and \"{}\"", "a".repeat(60), "b".repeat(60));
        assert!(extract(&dense).is_poetry);
        assert!(!extract("\"Short\" and \"quoted\"").is_poetry);
        assert!(!extract("Good evening.").is_poetry);
    }

    #[test]
    fn extraction_is_deterministic() {
        let transcript = "(Laughter) Is it me? We'll see.\nmore";
        assert_eq!(extract(transcript), extract(transcript));
    }

    #[test]
    fn strip_annotations_collapses_space() {
        assert_eq!(strip_annotations("a (Laughter)  b [Music] c"), "a b c");
    }
}
