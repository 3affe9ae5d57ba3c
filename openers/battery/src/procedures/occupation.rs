use openers_corpus::{FeatureTable, OccupationCategory};

use crate::{
    config::BatteryConfig,
    finding::{Finding, GroupSummary, ProcedureKind},
    stats::kruskal_wallis,
};

/// Kruskal–Wallis H of views across classified occupation categories.
///
/// Unclassified rows are excluded and counted under `excluded_unclassified`.
#[must_use]
pub fn occupation_views(table: &FeatureTable, config: &BatteryConfig) -> Finding {
    let mut finding = Finding::new(
        "occupation_views",
        ProcedureKind::MultiGroup,
        "Views across speaker occupation categories",
    );
    let mut groups: Vec<(OccupationCategory, Vec<f64>)> = Vec::new();
    for category in OccupationCategory::ALL.into_iter().filter(|c| c.is_classified()) {
        let views: Vec<f64> = table
            .iter()
            .filter(|row| row.occupation == category)
            .map(|row| row.views())
            .collect();
        if !views.is_empty() {
            finding = finding
                .sample_size(category.label(), views.len())
                .group(GroupSummary::from_values(category.label(), &views));
            groups.push((category, views));
        }
    }
    let excluded = table.iter().filter(|row| !row.occupation.is_classified()).count();
    finding = finding.sample_size("excluded_unclassified", excluded);

    let total: usize = groups.iter().map(|(_, views)| views.len()).sum();
    if groups.len() < 2 || total < config.min_sample {
        return finding.insufficient(format!(
            "need two occupation categories and {} classified talks; found {} categories, {total} talks",
            config.min_sample,
            groups.len()
        ));
    }
    let samples: Vec<&[f64]> = groups.iter().map(|(_, views)| views.as_slice()).collect();
    let Some(test) = kruskal_wallis(&samples) else {
        return finding.insufficient("every classified talk has the same views");
    };
    finding
        .statistic("h", test.h)
        .statistic("df", test.df)
        .statistic("categories", test.df + 1.0)
        .effect(test.epsilon_squared)
        .decide(test.p_value)
}
