use std::collections::BTreeMap;

use openers_corpus::{FeatureTable, OpeningStrategy};
use serde::{Deserialize, Serialize};

use crate::{
    config::BatteryConfig,
    finding::{Finding, ProcedureKind},
    stats::{chi_square_contingency, linear_regression},
};

/// Per-publication-year aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearAggregate {
    /// Publication year.
    pub year: i32,
    /// Talks published that year.
    pub talks: usize,
    /// Talks with a non-empty opener.
    pub openers: usize,
    /// Share of openers carrying a laughter marker.
    pub laughter_rate: Option<f64>,
    /// Mean opener word count.
    pub mean_opener_words: Option<f64>,
    /// Mean views.
    pub mean_views: f64,
}

#[derive(Default)]
struct YearBucket {
    talks: usize,
    openers: usize,
    laughter: usize,
    words: usize,
    views: f64,
}

/// Groups dated rows by publication year, ascending. Undated rows are skipped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn yearly_aggregates(table: &FeatureTable) -> Vec<YearAggregate> {
    let mut buckets: BTreeMap<i32, YearBucket> = BTreeMap::new();
    for row in table.iter() {
        let Some(year) = row.publication_year else {
            continue;
        };
        let bucket = buckets.entry(year).or_default();
        bucket.talks += 1;
        bucket.views += row.views();
        if !row.opener.is_empty() {
            bucket.openers += 1;
            bucket.words += row.opener.word_count;
            bucket.laughter += usize::from(row.opener.has_laughter);
        }
    }
    buckets
        .into_iter()
        .map(|(year, bucket)| {
            let openers = bucket.openers as f64;
            YearAggregate {
                year,
                talks: bucket.talks,
                openers: bucket.openers,
                laughter_rate: (bucket.openers > 0).then(|| bucket.laughter as f64 / openers),
                mean_opener_words: (bucket.openers > 0).then(|| bucket.words as f64 / openers),
                mean_views: bucket.views / bucket.talks as f64,
            }
        })
        .collect()
}

fn yearly_trend(
    table: &FeatureTable,
    config: &BatteryConfig,
    name: &str,
    description: &str,
    metric: impl Fn(&YearAggregate) -> Option<f64>,
) -> Finding {
    let eligible: Vec<(f64, f64)> = yearly_aggregates(table)
        .iter()
        .filter(|year| year.talks > config.min_talks_per_year)
        .filter_map(|year| metric(year).map(|value| (f64::from(year.year), value)))
        .collect();
    let finding = Finding::new(name, ProcedureKind::Trend, description).sample_size("years", eligible.len());
    if eligible.len() < config.min_sample.max(3) {
        return finding.insufficient(format!(
            "need {} years with more than {} talks, found {}",
            config.min_sample.max(3),
            config.min_talks_per_year,
            eligible.len()
        ));
    }
    let (years, values): (Vec<f64>, Vec<f64>) = eligible.into_iter().unzip();
    let Some(fit) = linear_regression(&years, &values) else {
        return finding.insufficient("yearly values do not vary");
    };
    finding
        .statistic("slope", fit.slope)
        .statistic("intercept", fit.intercept)
        .statistic("r_squared", fit.r_squared)
        .statistic("slope_std_err", fit.slope_std_err)
        .statistic("first_year", years[0])
        .statistic("last_year", years[years.len() - 1])
        .effect(fit.r_squared)
        .decide(fit.p_value)
}

/// Regression of yearly mean opener word count on publication year.
#[must_use]
pub fn opener_length_trend(table: &FeatureTable, config: &BatteryConfig) -> Finding {
    yearly_trend(
        table,
        config,
        "opener_length_trend",
        "Linear trend of mean opening-line word count by publication year",
        |year| year.mean_opener_words,
    )
}

/// Regression of yearly laughter rate on publication year.
#[must_use]
pub fn laughter_trend(table: &FeatureTable, config: &BatteryConfig) -> Finding {
    yearly_trend(
        table,
        config,
        "laughter_trend",
        "Linear trend of the share of openers drawing laughter by publication year",
        |year| year.laughter_rate,
    )
}

/// Chi-square of opening strategies before and after the period boundary.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn strategy_shift(table: &FeatureTable, config: &BatteryConfig) -> Finding {
    let boundary = config.period_boundary_year;
    let mut counts = vec![vec![0_u64; OpeningStrategy::ALL.len()]; 2];
    for row in table.iter().filter(|row| !row.opener.is_empty()) {
        let Some(year) = row.publication_year else {
            continue;
        };
        let period = usize::from(year >= boundary);
        let column = OpeningStrategy::ALL
            .iter()
            .position(|strategy| *strategy == row.opener.strategy())
            .unwrap_or(OpeningStrategy::ALL.len() - 1);
        counts[period][column] += 1;
    }
    let early: u64 = counts[0].iter().sum();
    let late: u64 = counts[1].iter().sum();
    let mut finding = Finding::new(
        "strategy_shift",
        ProcedureKind::Contingency,
        format!("Opening strategy distribution before {boundary} versus from {boundary} on"),
    )
    .sample_size("early", usize::try_from(early).unwrap_or(usize::MAX))
    .sample_size("late", usize::try_from(late).unwrap_or(usize::MAX));

    let minimum = config.min_sample as u64;
    if early < minimum || late < minimum {
        return finding.insufficient(format!(
            "each period needs at least {minimum} dated openers; early has {early}, late has {late}"
        ));
    }
    for (period, label, total) in [(0, "early", early), (1, "late", late)] {
        for (strategy, count) in OpeningStrategy::ALL.iter().zip(&counts[period]) {
            finding = finding.statistic(
                format!("{label}_share_{}", strategy.label().to_lowercase()),
                *count as f64 / total as f64,
            );
        }
    }
    let Some(test) = chi_square_contingency(&counts) else {
        return finding.insufficient("both periods use a single strategy");
    };
    finding
        .statistic("chi_square", test.statistic)
        .statistic("dof", test.dof as f64)
        .effect(test.cramers_v)
        .decide(test.p_value)
}
