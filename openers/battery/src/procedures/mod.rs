//! The battery's test procedures. Each returns complete [`Finding`]s and
//! turns data shortfalls into insufficient-data findings instead of errors.
//!
//! [`Finding`]: crate::finding::Finding

/// Classifier accuracy against labeled occupations.
pub mod accuracy;
/// Rank correlations against views.
pub mod correlation;
/// Word presence correlations with multiple-comparison correction.
pub mod lexical;
/// Kruskal–Wallis over occupation categories.
pub mod occupation;
/// Yearly trends and the early/late strategy shift.
pub mod temporal;
/// Two-group comparisons.
pub mod two_group;

use openers_corpus::{FeatureRow, FeatureTable};

/// Rows with a non-empty opening line; opener features are undefined elsewhere.
pub(crate) fn with_opener(table: &FeatureTable) -> impl Iterator<Item = &FeatureRow> {
    table.iter().filter(|row| !row.opener.is_empty())
}

/// Splits `metric` by `predicate` into (true, false) groups.
pub(crate) fn split<'a>(
    rows: impl Iterator<Item = &'a FeatureRow>,
    predicate: impl Fn(&FeatureRow) -> bool,
    metric: impl Fn(&FeatureRow) -> f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut matched = Vec::new();
    let mut rest = Vec::new();
    for row in rows {
        if predicate(row) {
            matched.push(metric(row));
        } else {
            rest.push(metric(row));
        }
    }
    (matched, rest)
}
