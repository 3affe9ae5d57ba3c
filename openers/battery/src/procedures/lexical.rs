use std::collections::{BTreeSet, HashMap, HashSet};

use once_cell::sync::Lazy;
use openers_corpus::FeatureTable;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::with_opener;
use crate::{
    config::BatteryConfig,
    finding::{Finding, ProcedureKind},
    stats::{bonferroni, spearman},
};

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// English function words excluded from the vocabulary.
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "also", "am", "an",
    "and", "any", "are", "around", "as", "at", "be", "because", "been", "before", "being",
    "below", "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing",
    "down", "during", "each", "either", "else", "even", "ever", "every", "few", "for", "from",
    "further", "get", "got", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "however", "if", "in", "into", "is", "it", "its",
    "itself", "just", "least", "less", "many", "may", "me", "might", "more", "most", "much",
    "must", "my", "myself", "neither", "no", "nor", "not", "now", "of", "off", "often", "on",
    "once", "one", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "per", "perhaps", "rather", "re", "same", "she", "should", "since", "so", "some", "still",
    "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "this", "those", "though", "through", "thus", "to", "too", "under",
    "until", "up", "upon", "us", "very", "was", "we", "well", "were", "what", "when", "where",
    "whether", "which", "while", "who", "whom", "whose", "why", "will", "with", "within",
    "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOPWORDS.iter().copied().collect());

/// One row of the word-correlation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCorrelation {
    /// Vocabulary word.
    pub word: String,
    /// Spearman rho between presence and views.
    pub rho: f64,
    /// Uncorrected two-sided p-value.
    pub p_value: f64,
    /// Openers containing the word.
    pub documents: usize,
    /// `p < alpha`.
    pub significant: bool,
    /// `p < alpha / vocabulary size`.
    pub significant_corrected: bool,
}

fn word_tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|token| !STOPWORD_SET.contains(token))
        .map(str::to_string)
        .collect()
}

/// Distinct non-stopword tokens of at least two word characters.
#[must_use]
pub fn tokenize(text: &str) -> BTreeSet<String> {
    word_tokens(text).into_iter().collect()
}

/// Most frequent words that appear in at least `min_df` openers.
///
/// Ties on frequency break alphabetically.
fn vocabulary(documents: &[Vec<String>], min_df: usize, max_words: usize) -> Vec<String> {
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    for tokens in documents {
        let mut seen = HashSet::new();
        for token in tokens {
            *frequency.entry(token.as_str()).or_insert(0) += 1;
            if seen.insert(token.as_str()) {
                *document_frequency.entry(token.as_str()).or_insert(0) += 1;
            }
        }
    }
    let mut candidates: Vec<(&str, usize)> = frequency
        .into_iter()
        .filter(|(word, _)| document_frequency.get(word).copied().unwrap_or(0) >= min_df)
        .collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    candidates
        .into_iter()
        .take(max_words)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Correlates presence of each vocabulary word with views.
///
/// Returns the summary finding and the per-word table sorted by rho
/// descending. The verdict uses the Bonferroni-adjusted smallest p-value.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn lexical_views(table: &FeatureTable, config: &BatteryConfig) -> (Finding, Vec<WordCorrelation>) {
    let settings = &config.lexical;
    let rows: Vec<_> = with_opener(table).collect();
    let documents: Vec<Vec<String>> = rows
        .iter()
        .map(|row| word_tokens(&row.opener.spoken_text()))
        .collect();
    let present: Vec<BTreeSet<&str>> = documents
        .iter()
        .map(|tokens| tokens.iter().map(String::as_str).collect())
        .collect();
    let views: Vec<f64> = rows.iter().map(|row| row.views()).collect();
    let scanned = format!(
        "scanned {} of {} talks, empty openers excluded",
        rows.len(),
        table.len()
    );
    let words = vocabulary(&documents, settings.min_document_frequency, settings.max_vocabulary);
    debug!(documents = rows.len(), vocabulary = words.len(), "lexical vocabulary selected");

    let mut finding = Finding::new(
        "lexical_views",
        ProcedureKind::Lexical,
        "Spearman correlation between word presence in the opening line and views",
    )
    .sample_size("documents", rows.len())
    .sample_size("vocabulary", words.len());
    if rows.len() < config.min_sample.max(3) {
        return (
            finding.insufficient(format!("need at least {} openers, found {}", config.min_sample.max(3), rows.len())),
            Vec::new(),
        );
    }

    let tested = words.len();
    let corrected_alpha = settings.alpha / tested.max(1) as f64;
    let mut table_rows: Vec<WordCorrelation> = words
        .into_iter()
        .filter_map(|word| {
            let presence: Vec<f64> = present
                .iter()
                .map(|tokens| if tokens.contains(word.as_str()) { 1.0 } else { 0.0 })
                .collect();
            let documents = presence.iter().filter(|&&p| p > 0.0).count();
            spearman(&presence, &views).map(|result| WordCorrelation {
                documents,
                rho: result.rho,
                p_value: result.p_value,
                significant: result.p_value < settings.alpha,
                significant_corrected: result.p_value < corrected_alpha,
                word,
            })
        })
        .collect();
    table_rows.sort_by(|a, b| b.rho.total_cmp(&a.rho).then_with(|| a.word.cmp(&b.word)));

    let Some(best) = table_rows.iter().min_by(|a, b| a.p_value.total_cmp(&b.p_value)) else {
        return (
            finding.insufficient(format!(
                "no word appears in at least {} openers with varying views; {}",
                settings.min_document_frequency, scanned
            )),
            Vec::new(),
        );
    };
    let adjusted = bonferroni(best.p_value, tested);
    finding = finding
        .statistic("vocabulary_size", tested as f64)
        .statistic("alpha", settings.alpha)
        .statistic("corrected_alpha", corrected_alpha)
        .statistic("significant_raw", table_rows.iter().filter(|w| w.significant).count() as f64)
        .statistic(
            "significant_corrected",
            table_rows.iter().filter(|w| w.significant_corrected).count() as f64,
        )
        .statistic("strongest_rho", best.rho)
        .p_value_entry("min_raw", best.p_value)
        .p_value_entry("min_bonferroni", adjusted)
        .effect(best.rho)
        .note(format!("strongest word: {}; {}", best.word, scanned))
        .decide(adjusted);
    (finding, table_rows)
}
