//! Numerical building blocks for the battery.

/// Summary statistics and ranking.
pub mod descriptive;
/// Hypothesis tests returning statistics and p-values.
pub mod inference;
/// Special functions and distribution tails.
pub mod special;

pub use descriptive::{average_ranks, mean, median, pearson, std_dev, std_err, tie_term, variance};
pub use inference::{
    bonferroni, chi_square_contingency, kruskal_wallis, linear_regression, mann_whitney_u,
    spearman, welch_t_test, ChiSquare, Correlation, KruskalWallis, MannWhitney, Regression,
    WelchTest,
};
pub use special::{binomial_upper_tail, chi2_sf, normal_sf, student_t_two_sided};
