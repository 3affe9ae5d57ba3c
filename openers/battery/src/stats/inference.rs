//! Test statistics. Every function returns `None` rather than a misleading
//! number when the inputs cannot support the test (too few values, zero
//! variance, degenerate tables).

use serde::{Deserialize, Serialize};

use super::{
    descriptive::{average_ranks, mean, pearson, tie_term, variance},
    special::{chi2_sf, normal_sf, student_t_two_sided},
};

/// Welch's unequal-variance t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelchTest {
    /// t statistic, positive when the first group's mean is larger.
    pub t: f64,
    /// Welch–Satterthwaite degrees of freedom.
    pub df: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Welch's t-test; needs two values per group and a non-zero standard error.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn welch_t_test(first: &[f64], second: &[f64]) -> Option<WelchTest> {
    let n1 = first.len() as f64;
    let n2 = second.len() as f64;
    let v1 = variance(first)? / n1;
    let v2 = variance(second)? / n2;
    let se_squared = v1 + v2;
    if se_squared <= 0.0 {
        return None;
    }
    let t = (mean(first)? - mean(second)?) / se_squared.sqrt();
    let df = se_squared.powi(2) / (v1.powi(2) / (n1 - 1.0) + v2.powi(2) / (n2 - 1.0));
    Some(WelchTest {
        t,
        df,
        p_value: student_t_two_sided(t, df),
    })
}

/// Mann–Whitney U with normal approximation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MannWhitney {
    /// U of the first group: pairs in which the first group's value is larger.
    pub u: f64,
    /// Signed z score, positive when the first group ranks higher.
    pub z: f64,
    /// Two-sided p-value with tie and continuity correction.
    pub p_value: f64,
    /// Rank-biserial correlation `2U / (n1 n2) - 1`.
    pub rank_biserial: f64,
}

/// Mann–Whitney U test; `None` when a group is empty or every value ties.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mann_whitney_u(first: &[f64], second: &[f64]) -> Option<MannWhitney> {
    if first.is_empty() || second.is_empty() {
        return None;
    }
    let n1 = first.len() as f64;
    let n2 = second.len() as f64;
    let n = n1 + n2;
    let combined: Vec<f64> = first.iter().chain(second).copied().collect();
    let ranks = average_ranks(&combined);
    let rank_sum: f64 = ranks[..first.len()].iter().sum();
    let u1 = n1.mul_add(-(n1 + 1.0) / 2.0, rank_sum);
    let u2 = n1.mul_add(n2, -u1);
    let centre = n1 * n2 / 2.0;
    let ties = tie_term(&combined);
    let sigma = (n1 * n2 / 12.0 * ((n + 1.0) - ties / (n * (n - 1.0)))).sqrt();
    if !sigma.is_finite() || sigma <= 0.0 {
        return None;
    }
    let z_abs = ((u1.max(u2) - centre - 0.5) / sigma).max(0.0);
    let z = if u1 >= centre { z_abs } else { -z_abs };
    Some(MannWhitney {
        u: u1,
        z,
        p_value: (2.0 * normal_sf(z_abs)).min(1.0),
        rank_biserial: 2.0 * u1 / (n1 * n2) - 1.0,
    })
}

/// Kruskal–Wallis H across several groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KruskalWallis {
    /// Tie-corrected H statistic.
    pub h: f64,
    /// Degrees of freedom, groups minus one.
    pub df: f64,
    /// Upper-tail chi-square p-value.
    pub p_value: f64,
    /// Epsilon-squared effect size `H / (N - 1)`.
    pub epsilon_squared: f64,
}

/// Kruskal–Wallis H test over the non-empty groups; needs two of them.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn kruskal_wallis(groups: &[&[f64]]) -> Option<KruskalWallis> {
    let groups: Vec<&[f64]> = groups.iter().copied().filter(|g| !g.is_empty()).collect();
    if groups.len() < 2 {
        return None;
    }
    let combined: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let total = combined.len() as f64;
    let ranks = average_ranks(&combined);
    let mut offset = 0;
    let mut weighted = 0.0;
    for group in &groups {
        let rank_sum: f64 = ranks[offset..offset + group.len()].iter().sum();
        weighted += rank_sum.powi(2) / group.len() as f64;
        offset += group.len();
    }
    let raw = 12.0 / (total * (total + 1.0)) * weighted - 3.0 * (total + 1.0);
    let correction = 1.0 - tie_term(&combined) / (total.powi(3) - total);
    if correction <= 0.0 {
        return None;
    }
    let h = (raw / correction).max(0.0);
    let df = (groups.len() - 1) as f64;
    Some(KruskalWallis {
        h,
        df,
        p_value: chi2_sf(h, df),
        epsilon_squared: h / (total - 1.0),
    })
}

/// Rank correlation with its significance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    /// Spearman's rho.
    pub rho: f64,
    /// Two-sided p-value from the t approximation with `n - 2` df.
    pub p_value: f64,
    /// Paired observations.
    pub n: usize,
}

/// Spearman correlation; needs three pairs and variation on both sides.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn spearman(x: &[f64], y: &[f64]) -> Option<Correlation> {
    if x.len() != y.len() || x.len() < 3 {
        return None;
    }
    let rho = pearson(&average_ranks(x), &average_ranks(y))?;
    let df = (x.len() - 2) as f64;
    let p_value = if rho.abs() >= 1.0 {
        0.0
    } else {
        student_t_two_sided(rho * (df / (1.0 - rho * rho)).sqrt(), df)
    };
    Some(Correlation {
        rho,
        p_value,
        n: x.len(),
    })
}

/// Ordinary least squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    /// Fitted slope.
    pub slope: f64,
    /// Fitted intercept.
    pub intercept: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Standard error of the slope.
    pub slope_std_err: f64,
    /// Two-sided p-value for a zero slope, `n - 2` df.
    pub p_value: f64,
    /// Points fitted.
    pub n: usize,
}

/// Linear regression; needs three points with variation in both `x` and `y`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<Regression> {
    if x.len() != y.len() || x.len() < 3 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let sxx: f64 = x.iter().map(|v| (v - mx).powi(2)).sum();
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let ss_total: f64 = y.iter().map(|v| (v - my).powi(2)).sum();
    if sxx <= 0.0 || ss_total <= 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = slope.mul_add(-mx, my);
    let ss_residual: f64 = x
        .iter()
        .zip(y)
        .map(|(a, b)| (b - slope.mul_add(*a, intercept)).powi(2))
        .sum();
    let df = (x.len() - 2) as f64;
    let slope_std_err = (ss_residual / df / sxx).sqrt();
    let p_value = if slope_std_err > 0.0 {
        student_t_two_sided(slope / slope_std_err, df)
    } else {
        0.0
    };
    Some(Regression {
        slope,
        intercept,
        r_squared: (1.0 - ss_residual / ss_total).clamp(0.0, 1.0),
        slope_std_err,
        p_value,
        n: x.len(),
    })
}

/// Pearson chi-square test of independence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquare {
    /// Chi-square statistic, Yates-corrected for one degree of freedom.
    pub statistic: f64,
    /// Degrees of freedom after dropping empty rows and columns.
    pub dof: usize,
    /// Upper-tail p-value.
    pub p_value: f64,
    /// Cramér's V.
    pub cramers_v: f64,
    /// Total observations.
    pub n: u64,
}

/// Chi-square over a contingency table of counts (`table[row][column]`).
///
/// All-zero rows and columns are dropped first; fewer than two of either
/// leaves nothing to test.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn chi_square_contingency(table: &[Vec<u64>]) -> Option<ChiSquare> {
    let width = table.iter().map(Vec::len).max()?;
    let cell = |row: &Vec<u64>, column: usize| row.get(column).copied().unwrap_or(0);
    let columns: Vec<usize> = (0..width)
        .filter(|&column| table.iter().any(|row| cell(row, column) > 0))
        .collect();
    let rows: Vec<Vec<f64>> = table
        .iter()
        .filter(|row| row.iter().any(|&count| count > 0))
        .map(|row| columns.iter().map(|&column| cell(row, column) as f64).collect())
        .collect();
    if rows.len() < 2 || columns.len() < 2 {
        return None;
    }
    let row_totals: Vec<f64> = rows.iter().map(|row| row.iter().sum()).collect();
    let column_totals: Vec<f64> = (0..columns.len())
        .map(|column| rows.iter().map(|row| row[column]).sum())
        .collect();
    let total: f64 = row_totals.iter().sum();
    let dof = (rows.len() - 1) * (columns.len() - 1);
    let yates = dof == 1;

    let mut statistic = 0.0;
    for (row, row_total) in rows.iter().zip(&row_totals) {
        for (observed, column_total) in row.iter().zip(&column_totals) {
            let expected = row_total * column_total / total;
            let mut deviation = (observed - expected).abs();
            if yates {
                deviation = (deviation - 0.5).max(0.0);
            }
            statistic += deviation.powi(2) / expected;
        }
    }
    let smaller = rows.len().min(columns.len()) as f64;
    Some(ChiSquare {
        statistic,
        dof,
        p_value: chi2_sf(statistic, dof as f64),
        cramers_v: (statistic / (total * (smaller - 1.0))).sqrt(),
        n: table.iter().flatten().sum(),
    })
}

/// Bonferroni-adjusted p-value for `tests` simultaneous comparisons.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bonferroni(p_value: f64, tests: usize) -> f64 {
    (p_value * tests.max(1) as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(left: f64, right: f64, tolerance: f64) {
        assert!((left - right).abs() < tolerance, "{left} vs {right}");
    }

    #[test]
    fn welch_matches_hand_computation() {
        let first = [1.0, 2.0, 3.0, 4.0, 5.0];
        let second = [2.0, 4.0, 6.0, 8.0, 10.0];
        let test = welch_t_test(&first, &second).unwrap();
        close(test.t, -3.0 / 2.5f64.sqrt(), 1e-12);
        close(test.df, 5.882_352_941_176_47, 1e-9);
        close(test.p_value, 0.107_531, 1e-5);
        assert_eq!(welch_t_test(&[1.0, 1.0], &[2.0, 2.0]), None);
        assert_eq!(welch_t_test(&[1.0], &[2.0, 3.0]), None);
    }

    #[test]
    fn mann_whitney_separated_groups() {
        let first = [6.0, 7.0, 8.0, 9.0, 10.0];
        let second = [1.0, 2.0, 3.0, 4.0, 5.0];
        let test = mann_whitney_u(&first, &second).unwrap();
        close(test.u, 25.0, 1e-12);
        close(test.rank_biserial, 1.0, 1e-12);
        assert!(test.z > 0.0);
        close(test.p_value, 0.012_185_8, 1e-6);
        let flipped = mann_whitney_u(&second, &first).unwrap();
        close(flipped.u, 0.0, 1e-12);
        assert!(flipped.z < 0.0);
        close(flipped.p_value, test.p_value, 1e-12);
    }

    #[test]
    fn mann_whitney_degenerate_inputs() {
        assert_eq!(mann_whitney_u(&[], &[1.0]), None);
        assert_eq!(mann_whitney_u(&[3.0, 3.0], &[3.0, 3.0]), None);
    }

    #[test]
    fn kruskal_wallis_three_groups() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let c = [7.0, 8.0, 9.0];
        let test = kruskal_wallis(&[&a, &b, &c]).unwrap();
        close(test.h, 7.2, 1e-9);
        close(test.df, 2.0, 1e-12);
        close(test.p_value, (-3.6f64).exp(), 1e-9);
        assert_eq!(kruskal_wallis(&[&a, &[]]), None);
    }

    #[test]
    fn spearman_monotone_and_constant() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [10.0, 20.0, 25.0, 100.0, 1000.0];
        let perfect = spearman(&x, &y).unwrap();
        close(perfect.rho, 1.0, 1e-12);
        close(perfect.p_value, 0.0, 1e-12);
        assert_eq!(spearman(&x, &[1.0; 5]), None);
        assert_eq!(spearman(&[1.0, 2.0], &[2.0, 1.0]), None);

        let partial = spearman(&x, &[2.0, 1.0, 4.0, 3.0, 5.0]).unwrap();
        close(partial.rho, 0.8, 1e-12);
        close(partial.p_value, 0.104_088, 1e-5);
    }

    #[test]
    fn regression_fits_line() {
        let x = [2000.0, 2001.0, 2002.0, 2003.0];
        let y = [1.0, 3.0, 5.0, 7.5];
        let fit = linear_regression(&x, &y).unwrap();
        close(fit.slope, 2.15, 1e-9);
        assert!(fit.r_squared > 0.99);
        assert!(fit.p_value < 0.01);
        assert_eq!(linear_regression(&x, &[2.0; 4]), None);
        assert_eq!(linear_regression(&[1.0; 4], &y), None);
    }

    #[test]
    fn chi_square_applies_yates_on_two_by_two() {
        let table = vec![vec![10, 20], vec![20, 10]];
        let test = chi_square_contingency(&table).unwrap();
        assert_eq!(test.dof, 1);
        close(test.statistic, 5.4, 1e-9);
        assert_eq!(test.n, 60);
        close(test.p_value, 0.020_137, 1e-5);
    }

    #[test]
    fn chi_square_drops_empty_rows_and_columns() {
        let table = vec![vec![5, 0, 5, 3], vec![0, 0, 0, 0], vec![3, 0, 6, 9]];
        let test = chi_square_contingency(&table).unwrap();
        assert_eq!(test.dof, 2);
        assert_eq!(chi_square_contingency(&[vec![1, 2], vec![0, 0]]), None);
        assert_eq!(chi_square_contingency(&[]), None);
    }

    #[test]
    fn bonferroni_caps_at_one() {
        close(bonferroni(0.01, 10), 0.1, 1e-12);
        close(bonferroni(0.2, 10), 1.0, 1e-12);
        close(bonferroni(0.2, 0), 0.2, 1e-12);
    }
}
