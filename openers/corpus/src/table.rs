use std::{fmt, sync::Arc};

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    occupation::{classify_all, OccupationCategory},
    opener::{extract, OpenerFeatures},
    surprisal::SurprisalScorer,
    talk::Talk,
};

fn default_reference_year() -> i32 {
    2025
}

fn default_viral_percentile() -> f64 {
    0.99
}

fn default_excerpt_chars() -> usize {
    120
}

/// Knobs for feature table construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Year that `years_since_publication` is measured against.
    #[serde(default = "default_reference_year")]
    pub reference_year: i32,
    /// Views percentile that marks a talk as viral.
    #[serde(default = "default_viral_percentile")]
    pub viral_percentile: f64,
    /// Maximum characters kept in opener excerpts.
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            reference_year: default_reference_year(),
            viral_percentile: default_viral_percentile(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

/// Corpus-relative viral cut-off, computed once per build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViralThreshold {
    /// Percentile in `[0, 1]`.
    pub percentile: f64,
    /// Views at that percentile, linearly interpolated between order statistics.
    pub views: f64,
}

impl ViralThreshold {
    /// Computes the threshold over every view count in the corpus.
    ///
    /// An empty corpus yields a zero threshold.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_views(views: &[u64], percentile: f64) -> Self {
        let percentile = percentile.clamp(0.0, 1.0);
        let mut sorted = views.to_vec();
        sorted.sort_unstable();
        let views = match sorted.len() {
            0 => 0.0,
            len => {
                let position = percentile * (len - 1) as f64;
                let lower = position.floor() as usize;
                let upper = position.ceil() as usize;
                let fraction = position - lower as f64;
                let low = sorted[lower] as f64;
                let high = sorted[upper] as f64;
                (high - low).mul_add(fraction, low)
            }
        };
        Self { percentile, views }
    }

    /// Whether a view count reaches the threshold.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_viral(&self, views: u64) -> bool {
        views as f64 >= self.views
    }
}

/// Opener length band by word count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthBucket {
    /// No words.
    Empty,
    /// 1 to 10 words.
    Short,
    /// 11 to 25 words.
    Medium,
    /// 26 to 50 words.
    Long,
    /// More than 50 words.
    VeryLong,
}

impl LengthBucket {
    /// Bucket for a word count.
    #[must_use]
    pub const fn from_words(words: usize) -> Self {
        match words {
            0 => Self::Empty,
            1..=10 => Self::Short,
            11..=25 => Self::Medium,
            26..=50 => Self::Long,
            _ => Self::VeryLong,
        }
    }
}

/// Whether a talk came from a flagship conference or an affiliated event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// `TED` or a `TED20xx` conference.
    MainStage,
    /// TEDx, TEDGlobal, TED-Ed and similar.
    Satellite,
}

impl EventType {
    /// Classifies an event name.
    #[must_use]
    pub fn from_event(event: &str) -> Self {
        let event = event.trim();
        if event == "TED" || event.contains("TED2") {
            Self::MainStage
        } else {
            Self::Satellite
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MainStage => "Main stage",
            Self::Satellite => "Satellite",
        }
    }
}

/// One talk joined with everything derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Source record, copied.
    pub talk: Talk,
    /// Opening-line features.
    pub opener: OpenerFeatures,
    /// Classified speaker occupation.
    pub occupation: OccupationCategory,
    /// Event classification.
    pub event_type: EventType,
    /// Publication year when the date parsed.
    pub publication_year: Option<i32>,
    /// Whole years between publication and the reference year, floored at zero.
    pub years_since_publication: Option<u32>,
    /// `views / max(1, years_since_publication)`; `None` for undated rows.
    pub views_per_year: Option<f64>,
    /// Opener length band.
    pub length_bucket: LengthBucket,
    /// Views reached the corpus viral threshold.
    pub is_viral: bool,
    /// Opener surprisal, when a scorer was supplied.
    pub surprisal: Option<f64>,
}

impl FeatureRow {
    /// Views as a float for statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn views(&self) -> f64 {
        self.talk.views as f64
    }

    /// Opening line truncated to `max_chars` characters, with an ellipsis when cut.
    #[must_use]
    pub fn excerpt(&self, max_chars: usize) -> String {
        let line = &self.opener.opening_line;
        if line.chars().count() <= max_chars {
            return line.clone();
        }
        let mut cut: String = line.chars().take(max_chars).collect();
        cut.truncate(cut.trim_end().len());
        cut.push_str("...");
        cut
    }
}

/// Counts of rows that degraded to defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    /// Rows in the table.
    pub rows: usize,
    /// Rows whose opener is empty.
    pub empty_openers: usize,
    /// Rows without a parseable publication date.
    pub undated_rows: usize,
    /// Rows whose occupation matched no rule.
    pub unclassified_occupations: usize,
    /// Rows missing a comment count.
    pub missing_comments: usize,
    /// Rows missing a duration.
    pub missing_duration: usize,
}

impl DataQuality {
    fn record(&mut self, row: &FeatureRow) {
        self.rows += 1;
        self.empty_openers += usize::from(row.opener.is_empty());
        self.undated_rows += usize::from(row.publication_year.is_none());
        self.unclassified_occupations += usize::from(!row.occupation.is_classified());
        self.missing_comments += usize::from(row.talk.comments.is_none());
        self.missing_duration += usize::from(row.talk.duration_secs.is_none());
    }
}

/// Immutable row-per-talk table shared by every battery procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    /// Rows in input order.
    pub rows: Vec<FeatureRow>,
    /// Viral threshold applied to every row.
    pub viral: ViralThreshold,
    /// Degradation counts.
    pub quality: DataQuality,
    /// Options the table was built with.
    pub options: BuildOptions,
}

impl FeatureTable {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates rows in input order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureRow> {
        self.rows.iter()
    }

    /// Whether rows carry surprisal scores.
    #[must_use]
    pub fn has_surprisal(&self) -> bool {
        self.rows.iter().any(|row| row.surprisal.is_some())
    }
}

/// Builds [`FeatureTable`]s from loaded talks.
#[derive(Clone, Default)]
pub struct FeatureTableBuilder {
    options: BuildOptions,
    scorer: Option<Arc<dyn SurprisalScorer>>,
}

impl fmt::Debug for FeatureTableBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureTableBuilder")
            .field("options", &self.options)
            .field("scorer", &self.scorer.is_some())
            .finish()
    }
}

impl FeatureTableBuilder {
    /// Creates a builder with the given options and no surprisal scorer.
    #[must_use]
    pub const fn new(options: BuildOptions) -> Self {
        Self {
            options,
            scorer: None,
        }
    }

    /// Injects a surprisal scorer.
    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn SurprisalScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Options in effect.
    #[must_use]
    pub const fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Builds one row per talk, preserving order. The input is only read.
    ///
    /// The viral threshold is derived from this exact talk set, so building
    /// over a subset can flip flags on every row.
    #[must_use]
    pub fn build(&self, talks: &[Talk]) -> FeatureTable {
        let views: Vec<u64> = talks.iter().map(|talk| talk.views).collect();
        let viral = ViralThreshold::from_views(&views, self.options.viral_percentile);
        debug!(
            percentile = viral.percentile,
            threshold = viral.views,
            "viral threshold computed"
        );

        let mut quality = DataQuality::default();
        let rows: Vec<FeatureRow> = talks
            .iter()
            .map(|talk| {
                let row = self.row(talk, viral);
                quality.record(&row);
                row
            })
            .collect();

        info!(
            rows = quality.rows,
            empty_openers = quality.empty_openers,
            undated = quality.undated_rows,
            unclassified = quality.unclassified_occupations,
            "feature table built"
        );
        FeatureTable {
            rows,
            viral,
            quality,
            options: self.options.clone(),
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
    fn row(&self, talk: &Talk, viral: ViralThreshold) -> FeatureRow {
        let opener = extract(&talk.transcript);
        let publication_year = talk.published_date.map(|date| date.year());
        let years_since_publication =
            publication_year.map(|year| (self.options.reference_year - year).max(0) as u32);
        let views_per_year =
            years_since_publication.map(|years| talk.views as f64 / f64::from(years.max(1)));
        let surprisal = self
            .scorer
            .as_ref()
            .filter(|_| !opener.is_empty())
            .and_then(|scorer| scorer.score(&opener.opening_line));
        FeatureRow {
            occupation: classify_all(&talk.occupations),
            event_type: EventType::from_event(&talk.event),
            publication_year,
            years_since_publication,
            views_per_year,
            length_bucket: LengthBucket::from_words(opener.word_count),
            is_viral: viral.is_viral(talk.views),
            surprisal,
            opener,
            talk: talk.clone(),
        }
    }
}
