use openers_corpus::FeatureTable;

use super::with_opener;
use crate::{
    config::BatteryConfig,
    finding::{Finding, ProcedureKind},
    stats::spearman,
};

fn rank_correlation(name: &str, description: &str, pairs: &[(f64, f64)], min_sample: usize) -> Finding {
    let finding = Finding::new(name, ProcedureKind::Correlation, description).sample_size("talks", pairs.len());
    if pairs.len() < min_sample.max(3) {
        return finding.insufficient(format!(
            "need at least {} talks, found {}",
            min_sample.max(3),
            pairs.len()
        ));
    }
    let (x, y): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
    let Some(result) = spearman(&x, &y) else {
        return finding.insufficient("one side of the correlation is constant");
    };
    finding
        .statistic("rho", result.rho)
        .effect(result.rho)
        .decide(result.p_value)
}

/// Spearman rho between opener word count and views.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn opener_length_views(table: &FeatureTable, config: &BatteryConfig) -> Finding {
    let pairs: Vec<(f64, f64)> = with_opener(table)
        .map(|row| (row.opener.word_count as f64, row.views()))
        .collect();
    rank_correlation(
        "opener_length_views",
        "Spearman correlation between opening-line word count and views",
        &pairs,
        config.min_sample,
    )
}

/// Spearman rho between opener surprisal and views.
#[must_use]
pub fn surprisal_views(table: &FeatureTable, config: &BatteryConfig) -> Finding {
    let pairs: Vec<(f64, f64)> = table
        .iter()
        .filter_map(|row| row.surprisal.map(|score| (score, row.views())))
        .collect();
    if pairs.is_empty() {
        return Finding::new(
            "surprisal_views",
            ProcedureKind::Correlation,
            "Spearman correlation between opener surprisal and views",
        )
        .sample_size("talks", 0)
        .insufficient("no surprisal scorer was configured");
    }
    rank_correlation(
        "surprisal_views",
        "Spearman correlation between opener surprisal and views",
        &pairs,
        config.min_sample,
    )
}
