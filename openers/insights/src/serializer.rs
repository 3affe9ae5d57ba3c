use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use openers_battery::{
    stats::{mean, median, std_dev},
    yearly_aggregates, BatteryReport,
};
use openers_corpus::{EventType, FeatureRow, FeatureTable, OccupationCategory, OpeningStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    document::{
        CorpusStats, EventSummary, Extremes, InsightsDocument, OccupationSummary, Provenance,
        QuestionOpeners, StrategyShare, TalkExcerpt, TimelinePoint, ViralTalk, SCHEMA_VERSION,
    },
    rounding::{round_finding, round_opt, round_real, round_views, round_word},
};

/// Openers shorter than this many characters are listed as extremes.
pub const SHORT_OPENER_CHARS: usize = 10;
/// Openers longer than this many characters are listed as extremes.
pub const LONG_OPENER_CHARS: usize = 500;
/// Question openers above this many views are listed as high performers.
pub const HIGH_VIEWS: u64 = 5_000_000;
/// Question openers below this many views are listed as low performers.
pub const LOW_VIEWS: u64 = 100_000;

fn default_viral_list_size() -> usize {
    41
}

fn default_extreme_list_size() -> usize {
    5
}

fn default_question_list_size() -> usize {
    10
}

fn default_poetry_list_size() -> usize {
    10
}

/// List sizes for the document's ranked tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightsOptions {
    /// Entries in the viral list.
    #[serde(default = "default_viral_list_size")]
    pub viral_list_size: usize,
    /// Entries in each extremes list.
    #[serde(default = "default_extreme_list_size")]
    pub extreme_list_size: usize,
    /// Entries in each question-opener list.
    #[serde(default = "default_question_list_size")]
    pub question_list_size: usize,
    /// Entries in the poetry list.
    #[serde(default = "default_poetry_list_size")]
    pub poetry_list_size: usize,
}

impl Default for InsightsOptions {
    fn default() -> Self {
        Self {
            viral_list_size: default_viral_list_size(),
            extreme_list_size: default_extreme_list_size(),
            question_list_size: default_question_list_size(),
            poetry_list_size: default_poetry_list_size(),
        }
    }
}

/// Aggregates a battery report and its feature table into an [`InsightsDocument`].
#[derive(Debug, Clone, Default)]
pub struct InsightsSerializer {
    options: InsightsOptions,
}

impl InsightsSerializer {
    /// Creates a serializer.
    #[must_use]
    pub const fn new(options: InsightsOptions) -> Self {
        Self { options }
    }

    /// Builds the document. Pure: the same inputs always give the same document.
    #[must_use]
    pub fn serialize(
        &self,
        report: &BatteryReport,
        table: &FeatureTable,
        generated_at: DateTime<Utc>,
    ) -> InsightsDocument {
        let excerpt_chars = table.options.excerpt_chars;
        let mut findings = report.findings.clone();
        findings.iter_mut().for_each(round_finding);
        let levels: Vec<f64> = report
            .finding("lexical_views")
            .map(|lexical| ["alpha", "corrected_alpha"].iter().filter_map(|key| lexical.stat(key)).collect())
            .unwrap_or_default();
        let mut word_correlations = report.word_correlations.clone();
        word_correlations
            .iter_mut()
            .for_each(|word| round_word(word, &levels));

        let document = InsightsDocument {
            provenance: Provenance {
                schema_version: SCHEMA_VERSION.to_string(),
                generated_at,
                corpus_size: table.len(),
                viral_threshold: round_views(table.viral.views),
                viral_percentile: round_real(table.viral.percentile),
                reference_year: table.options.reference_year,
                data_quality: table.quality,
                battery: report.summary,
            },
            findings,
            stats: corpus_stats(table),
            occupations: occupations(table),
            word_correlations,
            timeline: timeline(table),
            viral_talks: self.viral_talks(table, excerpt_chars),
            strategy_breakdown: strategy_breakdown(table),
            event_comparison: event_comparison(table),
            poetry_readings: ranked(
                openers(table).filter(|row| row.opener.is_poetry),
                |row| (Reverse(row.talk.views), row.talk.talk_id),
                self.options.poetry_list_size,
                excerpt_chars,
            ),
            extremes: Extremes {
                shortest: ranked(
                    openers(table).filter(|row| row.opener.char_count < SHORT_OPENER_CHARS),
                    |row| (Reverse(row.talk.views), row.talk.talk_id),
                    self.options.extreme_list_size,
                    excerpt_chars,
                ),
                longest: ranked(
                    openers(table).filter(|row| row.opener.char_count > LONG_OPENER_CHARS),
                    |row| (Reverse(row.opener.char_count), row.talk.talk_id),
                    self.options.extreme_list_size,
                    excerpt_chars,
                ),
            },
            question_openers: QuestionOpeners {
                high_views: ranked(
                    openers(table).filter(|row| row.opener.is_interrogative && row.talk.views > HIGH_VIEWS),
                    |row| (Reverse(row.talk.views), row.talk.talk_id),
                    self.options.question_list_size,
                    excerpt_chars,
                ),
                low_views: ranked(
                    openers(table).filter(|row| row.opener.is_interrogative && row.talk.views < LOW_VIEWS),
                    |row| (row.talk.views, row.talk.talk_id),
                    self.options.question_list_size,
                    excerpt_chars,
                ),
            },
        };
        debug!(
            findings = document.findings.len(),
            viral = document.viral_talks.len(),
            years = document.timeline.len(),
            "insights document assembled"
        );
        document
    }

    fn viral_talks(&self, table: &FeatureTable, excerpt_chars: usize) -> Vec<ViralTalk> {
        let mut viral: Vec<&FeatureRow> = table.iter().filter(|row| row.is_viral).collect();
        viral.sort_by_key(|row| (Reverse(row.talk.views), row.talk.talk_id));
        viral
            .into_iter()
            .take(self.options.viral_list_size)
            .enumerate()
            .map(|(index, row)| ViralTalk {
                rank: index + 1,
                talk_id: row.talk.talk_id,
                title: row.talk.title.clone(),
                speaker: row.talk.speaker.clone(),
                views: row.talk.views,
                opener_excerpt: row.excerpt(excerpt_chars),
            })
            .collect()
    }
}

fn openers(table: &FeatureTable) -> impl Iterator<Item = &FeatureRow> {
    table.iter().filter(|row| !row.opener.is_empty())
}

fn ranked<'a, K: Ord>(
    rows: impl Iterator<Item = &'a FeatureRow>,
    key: impl Fn(&FeatureRow) -> K,
    limit: usize,
    excerpt_chars: usize,
) -> Vec<TalkExcerpt> {
    let mut rows: Vec<&FeatureRow> = rows.collect();
    rows.sort_by_key(|row| key(*row));
    rows.into_iter()
        .take(limit)
        .map(|row| TalkExcerpt {
            talk_id: row.talk.talk_id,
            title: row.talk.title.clone(),
            speaker: row.talk.speaker.clone(),
            views: row.talk.views,
            opener_excerpt: row.excerpt(excerpt_chars),
            opener_chars: row.opener.char_count,
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn share(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| round_real(part as f64 / whole as f64))
}

#[allow(clippy::cast_precision_loss)]
fn corpus_stats(table: &FeatureTable) -> CorpusStats {
    let opener_rows: Vec<&FeatureRow> = openers(table).collect();
    let chars: Vec<f64> = opener_rows.iter().map(|row| row.opener.char_count as f64).collect();
    let words: Vec<f64> = opener_rows.iter().map(|row| row.opener.word_count as f64).collect();
    let surprisal: Vec<f64> = table.iter().filter_map(|row| row.surprisal).collect();
    let years: Vec<i32> = table.iter().filter_map(|row| row.publication_year).collect();
    CorpusStats {
        total_talks: table.len(),
        total_views: table.iter().map(|row| row.talk.views).sum(),
        first_year: years.iter().min().copied(),
        last_year: years.iter().max().copied(),
        median_opener_chars: round_opt(median(&chars)),
        mean_opener_words: round_opt(mean(&words)),
        viral_threshold: round_views(table.viral.views),
        viral_talks: table.iter().filter(|row| row.is_viral).count(),
        poetry_openers: opener_rows.iter().filter(|row| row.opener.is_poetry).count(),
        laughter_openers: opener_rows.iter().filter(|row| row.opener.has_laughter).count(),
        question_openers: opener_rows.iter().filter(|row| row.opener.is_interrogative).count(),
        median_surprisal: round_opt(median(&surprisal)),
    }
}

fn occupations(table: &FeatureTable) -> Vec<OccupationSummary> {
    OccupationCategory::ALL
        .into_iter()
        .filter_map(|category| {
            let views: Vec<f64> = table
                .iter()
                .filter(|row| row.occupation == category)
                .map(FeatureRow::views)
                .collect();
            (!views.is_empty()).then(|| OccupationSummary {
                category,
                n: views.len(),
                median_views: median(&views).map(round_views),
                mean_views: mean(&views).map(round_views),
                std_dev_views: round_opt(std_dev(&views)),
                in_findings: category.is_classified(),
            })
        })
        .collect()
}

fn timeline(table: &FeatureTable) -> Vec<TimelinePoint> {
    yearly_aggregates(table)
        .into_iter()
        .map(|year| TimelinePoint {
            year: year.year,
            talks: year.talks,
            laughter_percentage: round_opt(year.laughter_rate.map(|rate| rate * 100.0)),
            mean_opener_words: round_opt(year.mean_opener_words),
            mean_views: round_views(year.mean_views),
        })
        .collect()
}

fn strategy_breakdown(table: &FeatureTable) -> Vec<StrategyShare> {
    let strategies: Vec<OpeningStrategy> = openers(table).map(|row| row.opener.strategy()).collect();
    OpeningStrategy::ALL
        .into_iter()
        .map(|strategy| {
            let count = strategies.iter().filter(|s| **s == strategy).count();
            StrategyShare {
                strategy,
                count,
                share: share(count, strategies.len()).unwrap_or(0.0),
            }
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn event_comparison(table: &FeatureTable) -> Vec<EventSummary> {
    [EventType::MainStage, EventType::Satellite]
        .into_iter()
        .map(|event_type| {
            let rows: Vec<&FeatureRow> = table.iter().filter(|row| row.event_type == event_type).collect();
            let views: Vec<f64> = rows.iter().map(|row| row.views()).collect();
            let opener_rows: Vec<&&FeatureRow> = rows.iter().filter(|row| !row.opener.is_empty()).collect();
            let words: Vec<f64> = opener_rows.iter().map(|row| row.opener.word_count as f64).collect();
            let personal = opener_rows.iter().filter(|row| row.opener.starts_with_i).count();
            let questions = opener_rows.iter().filter(|row| row.opener.is_interrogative).count();
            EventSummary {
                event_type,
                talks: rows.len(),
                median_views: median(&views).map(round_views),
                mean_opener_words: round_opt(mean(&words)),
                personal_share: share(personal, opener_rows.len()),
                question_share: share(questions, opener_rows.len()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use openers_battery::HypothesisBattery;
    use openers_corpus::{FeatureTableBuilder, Talk};

    use super::*;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn document(talks: &[Talk], options: InsightsOptions) -> InsightsDocument {
        let table = FeatureTableBuilder::default().build(talks);
        let report = HypothesisBattery::default().run(&table);
        InsightsSerializer::new(options).serialize(&report, &table, fixed_time())
    }

    #[test]
    fn viral_list_ranks_by_views_then_id() {
        let mut talks: Vec<Talk> = (0..200).map(|id| Talk::new(id, "t", 1_000 + id, "Hello.")).collect();
        talks.push(Talk::new(500, "tie-b", 90_000_000, "Hello."));
        talks.push(Talk::new(300, "tie-a", 90_000_000, "Hello."));
        talks.push(Talk::new(400, "top", 95_000_000, "Hello."));
        let doc = document(&talks, InsightsOptions::default());
        let ids: Vec<u64> = doc.viral_talks.iter().map(|talk| talk.talk_id).collect();
        assert_eq!(&ids[..3], &[400, 300, 500]);
        assert_eq!(doc.viral_talks[0].rank, 1);
        assert!(doc.viral_talks.len() <= 41);
        assert!(doc.viral_talks.iter().all(|talk| talk.views >= doc.provenance.viral_threshold));
    }

    #[test]
    fn viral_list_respects_size() {
        let talks: Vec<Talk> = (0..10).map(|id| Talk::new(id, "t", 5, "Hello.")).collect();
        let options = InsightsOptions {
            viral_list_size: 3,
            ..InsightsOptions::default()
        };
        let doc = document(&talks, options);
        assert_eq!(doc.viral_talks.len(), 3);
        assert_eq!(
            doc.viral_talks.iter().map(|t| t.talk_id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn timeline_is_sorted_by_year() {
        let talks = vec![
            Talk::new(1, "a", 10, "(Laughter) Hi.").with_published(NaiveDate::from_ymd_opt(2019, 1, 1)),
            Talk::new(2, "b", 20, "Hello there.").with_published(NaiveDate::from_ymd_opt(2011, 1, 1)),
            Talk::new(3, "c", 30, "Hi again.").with_published(NaiveDate::from_ymd_opt(2019, 6, 1)),
        ];
        let doc = document(&talks, InsightsOptions::default());
        let years: Vec<i32> = doc.timeline.iter().map(|point| point.year).collect();
        assert_eq!(years, vec![2011, 2019]);
        assert_eq!(doc.timeline[1].laughter_percentage, Some(50.0));
        assert_eq!(doc.timeline[1].mean_views, 20);
        assert_eq!(doc.stats.first_year, Some(2011));
        assert_eq!(doc.stats.last_year, Some(2019));
    }

    #[test]
    fn occupation_table_keeps_other_out_of_findings() {
        let talks = vec![
            Talk::new(1, "a", 100, "Hi.").with_occupations(["Poet"]),
            Talk::new(2, "b", 300, "Hi.").with_occupations(["Novelist"]),
            Talk::new(3, "c", 500, "Hi.").with_occupations(["Author"]),
        ];
        let doc = document(&talks, InsightsOptions::default());
        assert_eq!(doc.occupations.len(), 2);
        let writer = &doc.occupations[0];
        assert_eq!(writer.category, OccupationCategory::Writer);
        assert_eq!(writer.median_views, Some(400));
        assert!(writer.in_findings);
        assert!(!doc.occupations[1].in_findings);
    }

    #[test]
    fn extremes_and_question_lists() {
        let long_line = format!("{} end.", "word ".repeat(120));
        let talks = vec![
            Talk::new(1, "short", 900, "Hi."),
            Talk::new(2, "short-top", 9_000, "Yo."),
            Talk::new(3, "long", 10, long_line),
            Talk::new(4, "q-high", 6_000_000, "Why do we dream?"),
            Talk::new(5, "q-low", 50_000, "What is time?"),
            Talk::new(6, "q-lower", 40_000, "Who are you?"),
        ];
        let doc = document(&talks, InsightsOptions::default());
        let shortest: Vec<u64> = doc.extremes.shortest.iter().map(|t| t.talk_id).collect();
        assert_eq!(shortest, vec![2, 1]);
        assert_eq!(doc.extremes.longest.len(), 1);
        assert!(doc.extremes.longest[0].opener_excerpt.ends_with("..."));
        assert_eq!(doc.question_openers.high_views[0].talk_id, 4);
        let low: Vec<u64> = doc.question_openers.low_views.iter().map(|t| t.talk_id).collect();
        assert_eq!(low, vec![6, 5]);
    }

    #[test]
    fn strategy_shares_cover_non_empty_openers() {
        let talks = vec![
            Talk::new(1, "a", 1, "Why?"),
            Talk::new(2, "b", 1, "I was born."),
            Talk::new(3, "c", 1, "\"Quote,\" she said."),
            Talk::new(4, "d", 1, "Hello."),
            Talk::new(5, "e", 1, ""),
        ];
        let doc = document(&talks, InsightsOptions::default());
        assert!(doc.strategy_breakdown.iter().all(|s| s.count == 1));
        assert!(doc.strategy_breakdown.iter().all(|s| (s.share - 0.25).abs() < 1e-12));
        assert_eq!(doc.provenance.data_quality.empty_openers, 1);
    }
}
