use openers_corpus::{EventType, FeatureRow, FeatureTable};

use super::{split, with_opener};
use crate::{
    config::BatteryConfig,
    finding::{Finding, GroupSummary, ProcedureKind},
    stats::{mann_whitney_u, median, welch_t_test},
};

/// Compares two samples with Welch's t-test and Mann–Whitney U.
///
/// Either group below `min_group` yields an insufficient finding carrying only
/// the group sizes and descriptives. The verdict follows the Mann–Whitney
/// p-value since view counts are heavy-tailed.
#[must_use]
pub fn two_group_comparison(
    name: &str,
    description: &str,
    first: (&str, &[f64]),
    second: (&str, &[f64]),
    min_group: usize,
) -> Finding {
    let (first_label, first_values) = first;
    let (second_label, second_values) = second;
    let finding = Finding::new(name, ProcedureKind::TwoGroup, description)
        .sample_size(first_label, first_values.len())
        .sample_size(second_label, second_values.len())
        .group(GroupSummary::from_values(first_label, first_values))
        .group(GroupSummary::from_values(second_label, second_values));

    if first_values.len() < min_group || second_values.len() < min_group {
        return finding.insufficient(format!(
            "each group needs at least {min_group} talks; {first_label} has {}, {second_label} has {}",
            first_values.len(),
            second_values.len()
        ));
    }
    let Some(rank_test) = mann_whitney_u(first_values, second_values) else {
        return finding.insufficient("every value ties; groups cannot be ranked");
    };

    let mut finding = finding;
    if let Some(welch) = welch_t_test(first_values, second_values) {
        finding = finding
            .statistic("welch_t", welch.t)
            .statistic("welch_df", welch.df)
            .p_value_entry("welch_t", welch.p_value);
    }
    if let (Some(a), Some(b)) = (median(first_values), median(second_values)) {
        if b > 0.0 {
            finding = finding.statistic("median_ratio", a / b);
        }
    }
    finding
        .statistic("mann_whitney_u", rank_test.u)
        .statistic("mann_whitney_z", rank_test.z)
        .p_value_entry("mann_whitney_u", rank_test.p_value)
        .effect(rank_test.rank_biserial)
        .decide(rank_test.p_value)
}

fn views_by(
    table: &FeatureTable,
    name: &str,
    description: &str,
    labels: (&str, &str),
    predicate: impl Fn(&FeatureRow) -> bool,
    config: &BatteryConfig,
) -> Finding {
    let (matched, rest) = split(with_opener(table), predicate, FeatureRow::views);
    two_group_comparison(
        name,
        description,
        (labels.0, &matched),
        (labels.1, &rest),
        config.two_group_min,
    )
}

/// Views of poetry-reading openers against every other opener.
#[must_use]
pub fn poetry_vs_prose(table: &FeatureTable, config: &BatteryConfig) -> Finding {
    views_by(
        table,
        "poetry_vs_prose",
        "Views of talks opening with poetry versus prose openers",
        ("poetry", "prose"),
        |row| row.opener.is_poetry,
        config,
    )
}

/// Views of question openers against statements.
#[must_use]
pub fn question_vs_statement(table: &FeatureTable, config: &BatteryConfig) -> Finding {
    views_by(
        table,
        "question_vs_statement",
        "Views of talks whose opening line is a question versus a statement",
        ("question", "statement"),
        |row| row.opener.is_interrogative,
        config,
    )
}

/// Views of openers that drew laughter against those that did not.
#[must_use]
pub fn laughter_vs_none(table: &FeatureTable, config: &BatteryConfig) -> Finding {
    views_by(
        table,
        "laughter_vs_none",
        "Views of talks with a laughter marker in the opening line versus none",
        ("laughter", "no_laughter"),
        |row| row.opener.has_laughter,
        config,
    )
}

/// Views of main-stage talks against satellite events.
#[must_use]
pub fn main_stage_vs_satellite(table: &FeatureTable, config: &BatteryConfig) -> Finding {
    let (main, satellite) = split(
        table.iter(),
        |row| row.event_type == EventType::MainStage,
        FeatureRow::views,
    );
    two_group_comparison(
        "main_stage_vs_satellite",
        "Views of main-stage conference talks versus satellite events",
        ("main_stage", &main),
        ("satellite", &satellite),
        config.two_group_min,
    )
}

/// Opener word counts of viral talks against the rest.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn viral_opener_length(table: &FeatureTable, config: &BatteryConfig) -> Finding {
    let (viral, rest) = split(
        with_opener(table),
        |row| row.is_viral,
        |row| row.opener.word_count as f64,
    );
    two_group_comparison(
        "viral_opener_length",
        "Opening-line word counts of viral talks versus the rest",
        ("viral", &viral),
        ("non_viral", &rest),
        config.two_group_min,
    )
}

#[cfg(test)]
mod tests {
    use openers_corpus::{FeatureTableBuilder, Talk};

    use super::*;
    use crate::verdict::{verdict_for, Verdict};

    fn spread(centre: f64) -> Vec<f64> {
        (0..10_i32).map(|i| centre + (f64::from(i) - 4.5) * 100_000.0).collect()
    }

    #[test]
    fn computes_both_tests_for_separated_groups() {
        let high = spread(2_000_000.0);
        let low = spread(1_000_000.0);
        let finding = two_group_comparison("demo", "demo", ("high", &high), ("low", &low), 5);
        assert!(finding.stat("welch_t").is_some());
        assert!(finding.stat("mann_whitney_u").is_some());
        let p = finding.p_value.unwrap();
        assert_eq!(finding.verdict, verdict_for(p));
        assert_eq!(finding.verdict, Verdict::Strong);
        assert_eq!(finding.stat("mann_whitney_u"), Some(100.0));
        assert_eq!(finding.effect_size, Some(1.0));
        assert_eq!(finding.groups[0].mean, Some(2_000_000.0));
        assert_eq!(finding.sample_sizes["low"], 10);
    }

    #[test]
    fn small_groups_are_insufficient() {
        let four = [1.0, 2.0, 3.0, 4.0];
        let ten: Vec<f64> = (0..10_i32).map(f64::from).collect();
        let finding = two_group_comparison("demo", "demo", ("a", &four), ("b", &ten), 5);
        assert!(finding.is_insufficient());
        assert!(finding.statistics.is_empty());
        assert_eq!(finding.p_value, None);
        assert_eq!(finding.sample_sizes["a"], 4);
    }

    #[test]
    fn constant_groups_are_insufficient() {
        let same = [5.0; 6];
        let finding = two_group_comparison("demo", "demo", ("a", &same), ("b", &same), 5);
        assert!(finding.is_insufficient());
    }

    #[test]
    fn question_split_uses_non_empty_openers() {
        let mut talks: Vec<Talk> = (0..6)
            .map(|i| Talk::new(i, "q", 1_000 + i, "Why are we here?"))
            .collect();
        talks.extend((6..12).map(|i| Talk::new(i, "s", 2_000 + i, "We are here.")));
        talks.push(Talk::new(12, "empty", 9, ""));
        let table = FeatureTableBuilder::default().build(&talks);
        let finding = question_vs_statement(&table, &BatteryConfig::default());
        assert_eq!(finding.sample_sizes["question"], 6);
        assert_eq!(finding.sample_sizes["statement"], 6);
        assert_eq!(finding.effect_size, Some(-1.0));
    }
}
