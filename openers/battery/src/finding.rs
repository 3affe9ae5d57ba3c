use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    stats::{mean, median, std_dev, std_err},
    verdict::{verdict_for, Verdict},
};

/// Statistical family a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureKind {
    /// Welch t plus Mann–Whitney U between two groups.
    TwoGroup,
    /// Kruskal–Wallis across categories.
    MultiGroup,
    /// Spearman rank correlation.
    Correlation,
    /// Per-word correlation with Bonferroni correction.
    Lexical,
    /// Linear regression over yearly aggregates.
    Trend,
    /// Chi-square test of independence.
    Contingency,
    /// Classifier accuracy against labeled data.
    Accuracy,
}

/// Descriptive statistics for one group of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group label.
    pub label: String,
    /// Members.
    pub n: usize,
    /// Mean, when non-empty.
    pub mean: Option<f64>,
    /// Median, when non-empty.
    pub median: Option<f64>,
    /// Sample standard deviation, when `n >= 2`.
    pub std_dev: Option<f64>,
    /// Standard error of the mean, when `n >= 2`.
    pub std_err: Option<f64>,
}

impl GroupSummary {
    /// Summarises the given values.
    #[must_use]
    pub fn from_values(label: impl Into<String>, values: &[f64]) -> Self {
        Self {
            label: label.into(),
            n: values.len(),
            mean: mean(values),
            median: median(values),
            std_dev: std_dev(values),
            std_err: std_err(values),
        }
    }
}

/// Outcome of one named test procedure.
///
/// Built by chaining setters onto [`Finding::new`] and closed with either
/// [`Finding::decide`] or [`Finding::insufficient`]. Non-finite numbers are
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Finding name, unique within a report.
    pub name: String,
    /// Hypothesis that produced it.
    pub hypothesis: String,
    /// Statistical family.
    pub procedure: ProcedureKind,
    /// What was tested.
    pub description: String,
    /// Named test statistics in insertion order.
    pub statistics: IndexMap<String, f64>,
    /// Every p-value the procedure computed, by name.
    pub p_values: IndexMap<String, f64>,
    /// The p-value the verdict was derived from.
    pub p_value: Option<f64>,
    /// Effect size, when defined for the procedure.
    pub effect_size: Option<f64>,
    /// Sample sizes by group or role.
    pub sample_sizes: IndexMap<String, usize>,
    /// Per-group descriptive statistics.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupSummary>,
    /// Policy verdict.
    pub verdict: Verdict,
    /// Reason for insufficient data, or other caveats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Finding {
    /// Starts an undecided finding.
    #[must_use]
    pub fn new(name: impl Into<String>, procedure: ProcedureKind, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hypothesis: name.clone(),
            name,
            procedure,
            description: description.into(),
            statistics: IndexMap::new(),
            p_values: IndexMap::new(),
            p_value: None,
            effect_size: None,
            sample_sizes: IndexMap::new(),
            groups: Vec::new(),
            verdict: Verdict::InsufficientData,
            note: None,
        }
    }

    /// Records a statistic if it is finite.
    #[must_use]
    pub fn statistic(mut self, key: impl Into<String>, value: f64) -> Self {
        if value.is_finite() {
            self.statistics.insert(key.into(), value);
        }
        self
    }

    /// Records a secondary p-value if it is finite.
    #[must_use]
    pub fn p_value_entry(mut self, key: impl Into<String>, value: f64) -> Self {
        if value.is_finite() {
            self.p_values.insert(key.into(), value);
        }
        self
    }

    /// Records a sample size.
    #[must_use]
    pub fn sample_size(mut self, key: impl Into<String>, n: usize) -> Self {
        self.sample_sizes.insert(key.into(), n);
        self
    }

    /// Appends a group summary.
    #[must_use]
    pub fn group(mut self, summary: GroupSummary) -> Self {
        self.groups.push(summary);
        self
    }

    /// Sets the effect size if it is finite.
    #[must_use]
    pub fn effect(mut self, value: f64) -> Self {
        if value.is_finite() {
            self.effect_size = Some(value);
        }
        self
    }

    /// Attaches a caveat.
    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Sets the verdict p-value and derives the verdict from it.
    #[must_use]
    pub fn decide(mut self, p_value: f64) -> Self {
        self.verdict = verdict_for(p_value);
        self.p_value = p_value.is_finite().then_some(p_value);
        self
    }

    /// Marks the finding as not computed, dropping any partial statistics.
    ///
    /// Sample sizes and group summaries survive so the shortfall is visible.
    #[must_use]
    pub fn insufficient(mut self, reason: impl Into<String>) -> Self {
        self.statistics.clear();
        self.p_values.clear();
        self.p_value = None;
        self.effect_size = None;
        self.verdict = Verdict::InsufficientData;
        self.note = Some(reason.into());
        self
    }

    /// Whether the procedure declined to compute a statistic.
    #[must_use]
    pub fn is_insufficient(&self) -> bool {
        self.verdict == Verdict::InsufficientData
    }

    /// Looks up a named statistic.
    #[must_use]
    pub fn stat(&self, key: &str) -> Option<f64> {
        self.statistics.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_non_finite_numbers() {
        let finding = Finding::new("demo", ProcedureKind::Correlation, "demo")
            .statistic("rho", f64::NAN)
            .statistic("n", 4.0)
            .effect(f64::INFINITY)
            .decide(0.002);
        assert_eq!(finding.stat("rho"), None);
        assert_eq!(finding.stat("n"), Some(4.0));
        assert_eq!(finding.effect_size, None);
        assert_eq!(finding.verdict, Verdict::Strong);
        assert_eq!(finding.hypothesis, "demo");
    }

    #[test]
    fn insufficient_keeps_sizes_and_drops_statistics() {
        let finding = Finding::new("demo", ProcedureKind::TwoGroup, "demo")
            .sample_size("a", 2)
            .statistic("t", 1.0)
            .decide(0.03)
            .insufficient("group a has 2 talks, need 5");
        assert!(finding.is_insufficient());
        assert!(finding.statistics.is_empty());
        assert_eq!(finding.p_value, None);
        assert_eq!(finding.sample_sizes["a"], 2);
        assert_eq!(finding.note.as_deref(), Some("group a has 2 talks, need 5"));
    }

    #[test]
    fn group_summary_handles_small_groups() {
        let single = GroupSummary::from_values("one", &[3.0]);
        assert_eq!(single.mean, Some(3.0));
        assert_eq!(single.std_dev, None);
        let empty = GroupSummary::from_values("none", &[]);
        assert_eq!(empty.n, 0);
        assert_eq!(empty.median, None);
    }
}
