//! Versioned insights document consumed by presentation tooling.
//!
//! The document is a self-contained snapshot: every table downstream charts
//! need is materialised here so nothing has to re-read the corpus.

use chrono::{DateTime, Utc};
use openers_battery::{BatterySummary, Finding, WordCorrelation};
use openers_corpus::{DataQuality, EventType, OccupationCategory, OpeningStrategy};
use serde::{Deserialize, Serialize};

/// Schema version written into every document.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Document schema version.
    pub schema_version: String,
    /// When the document was generated.
    pub generated_at: DateTime<Utc>,
    /// Talks analysed.
    pub corpus_size: usize,
    /// Views needed to count as viral.
    pub viral_threshold: u64,
    /// Percentile behind the viral threshold.
    pub viral_percentile: f64,
    /// Year that talk ages are measured against.
    pub reference_year: i32,
    /// Rows that degraded to defaults.
    pub data_quality: DataQuality,
    /// Verdict tallies.
    pub battery: BatterySummary,
}

/// Headline corpus numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Talks analysed.
    pub total_talks: usize,
    /// Sum of views.
    pub total_views: u64,
    /// Earliest publication year.
    pub first_year: Option<i32>,
    /// Latest publication year.
    pub last_year: Option<i32>,
    /// Median opener length in characters, non-empty openers only.
    pub median_opener_chars: Option<f64>,
    /// Mean opener length in words, non-empty openers only.
    pub mean_opener_words: Option<f64>,
    /// Views needed to count as viral.
    pub viral_threshold: u64,
    /// Talks at or above the viral threshold.
    pub viral_talks: usize,
    /// Openers flagged as poetry.
    pub poetry_openers: usize,
    /// Openers with a laughter marker.
    pub laughter_openers: usize,
    /// Openers phrased as a question.
    pub question_openers: usize,
    /// Median surprisal when a scorer ran.
    pub median_surprisal: Option<f64>,
}

/// Views by occupation category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupationSummary {
    /// Category.
    pub category: OccupationCategory,
    /// Talks in the category.
    pub n: usize,
    /// Median views.
    pub median_views: Option<u64>,
    /// Mean views.
    pub mean_views: Option<u64>,
    /// Standard deviation of views.
    pub std_dev_views: Option<f64>,
    /// Whether the category takes part in occupation findings.
    pub in_findings: bool,
}

/// One publication year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    /// Publication year.
    pub year: i32,
    /// Talks published.
    pub talks: usize,
    /// Percentage of openers with a laughter marker.
    pub laughter_percentage: Option<f64>,
    /// Mean opener word count.
    pub mean_opener_words: Option<f64>,
    /// Mean views.
    pub mean_views: u64,
}

/// Entry in the ranked viral list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViralTalk {
    /// 1-based rank.
    pub rank: usize,
    /// Talk identifier.
    pub talk_id: u64,
    /// Title.
    pub title: String,
    /// Primary speaker.
    pub speaker: String,
    /// Views.
    pub views: u64,
    /// Truncated opening line.
    pub opener_excerpt: String,
}

/// Share of one opening strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyShare {
    /// Strategy.
    pub strategy: OpeningStrategy,
    /// Non-empty openers using it.
    pub count: usize,
    /// Fraction of non-empty openers.
    pub share: f64,
}

/// Main stage against satellite events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event class.
    pub event_type: EventType,
    /// Talks.
    pub talks: usize,
    /// Median views.
    pub median_views: Option<u64>,
    /// Mean opener word count.
    pub mean_opener_words: Option<f64>,
    /// Share of openers starting with "I".
    pub personal_share: Option<f64>,
    /// Share of openers phrased as a question.
    pub question_share: Option<f64>,
}

/// A talk shown with its opener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkExcerpt {
    /// Talk identifier.
    pub talk_id: u64,
    /// Title.
    pub title: String,
    /// Primary speaker.
    pub speaker: String,
    /// Views.
    pub views: u64,
    /// Truncated opening line.
    pub opener_excerpt: String,
    /// Opening line length in characters.
    pub opener_chars: usize,
}

/// Unusually short and long openers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extremes {
    /// Openers under 10 characters, most viewed first.
    pub shortest: Vec<TalkExcerpt>,
    /// Openers over 500 characters, longest first.
    pub longest: Vec<TalkExcerpt>,
}

/// Question openers at both ends of the views range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOpeners {
    /// Over 5 million views, most viewed first.
    pub high_views: Vec<TalkExcerpt>,
    /// Under 100 thousand views, least viewed first.
    pub low_views: Vec<TalkExcerpt>,
}

/// The persisted analysis artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsDocument {
    /// Run metadata.
    pub provenance: Provenance,
    /// Findings in hypothesis declaration order.
    pub findings: Vec<Finding>,
    /// Headline numbers.
    pub stats: CorpusStats,
    /// Views by occupation category.
    pub occupations: Vec<OccupationSummary>,
    /// Word-correlation table, rho descending.
    pub word_correlations: Vec<WordCorrelation>,
    /// Per-year aggregates, ascending.
    pub timeline: Vec<TimelinePoint>,
    /// Most viewed viral talks.
    pub viral_talks: Vec<ViralTalk>,
    /// Opening strategy distribution.
    pub strategy_breakdown: Vec<StrategyShare>,
    /// Main stage against satellite events.
    pub event_comparison: Vec<EventSummary>,
    /// Poetry openers, most viewed first.
    pub poetry_readings: Vec<TalkExcerpt>,
    /// Unusually short and long openers.
    pub extremes: Extremes,
    /// Question openers at both ends of the views range.
    pub question_openers: QuestionOpeners,
}

impl InsightsDocument {
    /// Looks up a finding by name.
    #[must_use]
    pub fn finding(&self, name: &str) -> Option<&Finding> {
        self.findings.iter().find(|finding| finding.name == name)
    }
}
