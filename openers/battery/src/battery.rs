use std::fmt;

use openers_corpus::FeatureTable;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::BatteryConfig,
    finding::Finding,
    procedures::{
        accuracy::{built_in_labels, classifier_accuracy},
        correlation::{opener_length_views, surprisal_views},
        lexical::{lexical_views, WordCorrelation},
        occupation::occupation_views,
        temporal::{laughter_trend, opener_length_trend, strategy_shift},
        two_group::{
            laughter_vs_none, main_stage_vs_satellite, poetry_vs_prose, question_vs_statement,
            viral_opener_length,
        },
    },
    verdict::Verdict,
};

/// The battery's hypotheses in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hypothesis {
    /// Poetry openers against prose.
    PoetryVsProse,
    /// Question openers against statements.
    QuestionVsStatement,
    /// Laughter in the opener against none.
    LaughterVsNone,
    /// Main-stage events against satellites.
    MainStageVsSatellite,
    /// Opener length of viral talks against the rest.
    ViralOpenerLength,
    /// Views across occupation categories.
    OccupationViews,
    /// Opener length (and surprisal) against views.
    OpenerLengthViews,
    /// Word presence against views.
    LexicalViews,
    /// Yearly trends and the early/late strategy shift.
    TemporalTrend,
    /// Occupation classifier accuracy.
    OccupationClassifierAccuracy,
}

impl Hypothesis {
    /// Every hypothesis in the order findings are reported.
    pub const ALL: [Self; 10] = [
        Self::PoetryVsProse,
        Self::QuestionVsStatement,
        Self::LaughterVsNone,
        Self::MainStageVsSatellite,
        Self::ViralOpenerLength,
        Self::OccupationViews,
        Self::OpenerLengthViews,
        Self::LexicalViews,
        Self::TemporalTrend,
        Self::OccupationClassifierAccuracy,
    ];

    /// Stable identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PoetryVsProse => "poetry_vs_prose",
            Self::QuestionVsStatement => "question_vs_statement",
            Self::LaughterVsNone => "laughter_vs_none",
            Self::MainStageVsSatellite => "main_stage_vs_satellite",
            Self::ViralOpenerLength => "viral_opener_length",
            Self::OccupationViews => "occupation_views",
            Self::OpenerLengthViews => "opener_length_views",
            Self::LexicalViews => "lexical_views",
            Self::TemporalTrend => "temporal_trend",
            Self::OccupationClassifierAccuracy => "occupation_classifier_accuracy",
        }
    }
}

impl fmt::Display for Hypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What evaluating one hypothesis produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HypothesisOutcome {
    /// One or more findings, tagged with the hypothesis name.
    pub findings: Vec<Finding>,
    /// Word table rows, only from the lexical hypothesis.
    pub word_correlations: Vec<WordCorrelation>,
}

/// Verdict tallies across a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatterySummary {
    /// Hypotheses evaluated.
    pub hypotheses: usize,
    /// Findings produced.
    pub findings: usize,
    /// Strong verdicts.
    pub strong: usize,
    /// Moderate verdicts.
    pub moderate: usize,
    /// Weak or no evidence.
    pub weak_or_none: usize,
    /// Findings not computed.
    pub insufficient_data: usize,
}

impl BatterySummary {
    fn tally(hypotheses: usize, findings: &[Finding]) -> Self {
        let count = |verdict: Verdict| findings.iter().filter(|f| f.verdict == verdict).count();
        Self {
            hypotheses,
            findings: findings.len(),
            strong: count(Verdict::Strong),
            moderate: count(Verdict::Moderate),
            weak_or_none: count(Verdict::WeakOrNone),
            insufficient_data: count(Verdict::InsufficientData),
        }
    }
}

/// Everything one battery run produced, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryReport {
    /// Findings in hypothesis declaration order.
    pub findings: Vec<Finding>,
    /// Word-correlation table, rho descending.
    pub word_correlations: Vec<WordCorrelation>,
    /// Verdict tallies.
    pub summary: BatterySummary,
}

impl BatteryReport {
    /// Looks up a finding by name.
    #[must_use]
    pub fn finding(&self, name: &str) -> Option<&Finding> {
        self.findings.iter().find(|finding| finding.name == name)
    }
}

/// Runs the fixed hypothesis set over a feature table.
///
/// Procedures only read the table. With `parallel` set they run on the rayon
/// pool; results are always merged in [`Hypothesis::ALL`] order so output is
/// identical either way.
#[derive(Debug, Clone, Default)]
pub struct HypothesisBattery {
    config: BatteryConfig,
}

impl HypothesisBattery {
    /// Creates a battery with the given configuration.
    #[must_use]
    pub const fn new(config: BatteryConfig) -> Self {
        Self { config }
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &BatteryConfig {
        &self.config
    }

    /// Evaluates every hypothesis.
    #[must_use]
    pub fn run(&self, table: &FeatureTable) -> BatteryReport {
        let outcomes: Vec<HypothesisOutcome> = if self.config.parallel {
            Hypothesis::ALL[..]
                .par_iter()
                .map(|hypothesis| self.evaluate(*hypothesis, table))
                .collect()
        } else {
            Hypothesis::ALL
                .iter()
                .map(|hypothesis| self.evaluate(*hypothesis, table))
                .collect()
        };

        let mut findings = Vec::new();
        let mut word_correlations = Vec::new();
        for outcome in outcomes {
            findings.extend(outcome.findings);
            word_correlations.extend(outcome.word_correlations);
        }
        let summary = BatterySummary::tally(Hypothesis::ALL.len(), &findings);
        info!(
            findings = summary.findings,
            strong = summary.strong,
            moderate = summary.moderate,
            insufficient = summary.insufficient_data,
            "hypothesis battery completed"
        );
        BatteryReport {
            findings,
            word_correlations,
            summary,
        }
    }

    /// Evaluates a single hypothesis.
    #[must_use]
    pub fn evaluate(&self, hypothesis: Hypothesis, table: &FeatureTable) -> HypothesisOutcome {
        let config = &self.config;
        let mut outcome = HypothesisOutcome::default();
        match hypothesis {
            Hypothesis::PoetryVsProse => outcome.findings.push(poetry_vs_prose(table, config)),
            Hypothesis::QuestionVsStatement => outcome.findings.push(question_vs_statement(table, config)),
            Hypothesis::LaughterVsNone => outcome.findings.push(laughter_vs_none(table, config)),
            Hypothesis::MainStageVsSatellite => outcome.findings.push(main_stage_vs_satellite(table, config)),
            Hypothesis::ViralOpenerLength => outcome.findings.push(viral_opener_length(table, config)),
            Hypothesis::OccupationViews => outcome.findings.push(occupation_views(table, config)),
            Hypothesis::OpenerLengthViews => {
                outcome.findings.push(opener_length_views(table, config));
                outcome.findings.push(surprisal_views(table, config));
            }
            Hypothesis::LexicalViews => {
                let (finding, words) = lexical_views(table, config);
                outcome.findings.push(finding);
                outcome.word_correlations = words;
            }
            Hypothesis::TemporalTrend => {
                outcome.findings.push(opener_length_trend(table, config));
                outcome.findings.push(laughter_trend(table, config));
                outcome.findings.push(strategy_shift(table, config));
            }
            Hypothesis::OccupationClassifierAccuracy => {
                let mut labels = built_in_labels();
                labels.extend(config.extra_labels.iter().cloned());
                outcome.findings.push(classifier_accuracy(&labels, config.min_sample));
            }
        }
        for finding in &mut outcome.findings {
            finding.hypothesis = hypothesis.name().to_string();
            debug!(
                hypothesis = hypothesis.name(),
                finding = %finding.name,
                verdict = %finding.verdict,
                "procedure finished"
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use openers_corpus::{FeatureTableBuilder, OccupationCategory, Talk};

    use super::*;
    use crate::procedures::accuracy::LabeledOccupation;

    fn corpus() -> Vec<Talk> {
        let openers = [
            "Why do we sleep?",
            "I grew up in a small town.",
            "(Laughter) So here we are.",
            "\"Hope is the thing with feathers,\" wrote Emily Dickinson.",
            "Let me tell you about data.",
            "Imagine a world without fear.",
        ];
        let occupations = ["Psychologist", "Novelist", "Biologist", "Founder", "Activist", "Painter"];
        (0..120_u64)
            .map(|id| {
                let index = usize::try_from(id).unwrap() % openers.len();
                let year = 2008 + i32::try_from(id % 14).unwrap();
                Talk::new(id, format!("Talk {id}"), 10_000 + id * 7_919 % 3_000_000, openers[index])
                    .with_occupations([occupations[(index + usize::try_from(id / 6).unwrap()) % 6]])
                    .with_event(if id % 4 == 0 { "TED2015" } else { "TEDxParis" })
                    .with_published(NaiveDate::from_ymd_opt(year, 5, 1))
            })
            .collect()
    }

    #[test]
    fn findings_follow_declaration_order() {
        let table = FeatureTableBuilder::default().build(&corpus());
        let report = HypothesisBattery::default().run(&table);
        let names: Vec<&str> = report.findings.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "poetry_vs_prose",
                "question_vs_statement",
                "laughter_vs_none",
                "main_stage_vs_satellite",
                "viral_opener_length",
                "occupation_views",
                "opener_length_views",
                "surprisal_views",
                "lexical_views",
                "opener_length_trend",
                "laughter_trend",
                "strategy_shift",
                "occupation_classifier_accuracy",
            ]
        );
        assert_eq!(report.finding("laughter_trend").unwrap().hypothesis, "temporal_trend");
        assert_eq!(report.summary.findings, 13);
        assert_eq!(report.summary.hypotheses, 10);
    }

    #[test]
    fn parallel_and_serial_runs_agree() {
        let table = FeatureTableBuilder::default().build(&corpus());
        let parallel = HypothesisBattery::default().run(&table);
        let serial = HypothesisBattery::new(BatteryConfig {
            parallel: false,
            ..BatteryConfig::default()
        })
        .run(&table);
        assert_eq!(parallel, serial);
    }

    #[test]
    fn empty_table_never_aborts() {
        let table = FeatureTableBuilder::default().build(&[]);
        let report = HypothesisBattery::default().run(&table);
        assert_eq!(report.findings.len(), 13);
        let accuracy = report.finding("occupation_classifier_accuracy").unwrap();
        assert!(!accuracy.is_insufficient());
        assert_eq!(report.summary.insufficient_data, 12);
        assert!(report.word_correlations.is_empty());
    }

    #[test]
    fn extra_labels_join_the_accuracy_sample() {
        let table = FeatureTableBuilder::default().build(&[]);
        let mut config = BatteryConfig::default();
        config.extra_labels.push(LabeledOccupation::new("Sculptor", OccupationCategory::Artist));
        let outcome = HypothesisBattery::new(config).evaluate(Hypothesis::OccupationClassifierAccuracy, &table);
        assert_eq!(outcome.findings[0].sample_sizes["labeled"], 29);
    }
}
