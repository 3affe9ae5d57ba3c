//! Output rounding. p-values and significance levels keep four significant
//! figures, every other real keeps four decimal places, view counts are whole
//! numbers.
//!
//! A rounded p-value never lands on the other side of a threshold it was
//! compared against, so verdicts and significance flags stay reproducible from
//! the published numbers.

use openers_battery::{
    verdict::{MODERATE_THRESHOLD, STRONG_THRESHOLD},
    Finding, GroupSummary, WordCorrelation,
};

/// Thresholds a verdict p-value is compared against.
pub const VERDICT_THRESHOLDS: [f64; 2] = [STRONG_THRESHOLD, MODERATE_THRESHOLD];

/// Rounds to four significant figures.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn round_sig(value: f64) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }
    format!("{value:.3e}").parse().unwrap_or(value)
}

/// Rounds to four significant figures, truncating instead when rounding up
/// would reach one of `thresholds` from below.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_p_against(value: f64, thresholds: &[f64]) -> f64 {
    let rounded = round_sig(value);
    let crosses = thresholds
        .iter()
        .any(|&threshold| value < threshold && rounded >= threshold);
    if !crosses {
        return rounded;
    }
    let exponent = value.abs().log10().floor() as i32;
    let scale = 10_f64.powi(3 - exponent);
    let truncated = round_sig((value * scale).floor() / scale);
    if thresholds
        .iter()
        .any(|&threshold| value < threshold && truncated >= threshold)
    {
        value
    } else {
        truncated
    }
}

/// Rounds a verdict p-value without moving it across a verdict threshold.
#[must_use]
pub fn round_p(value: f64) -> f64 {
    round_p_against(value, &VERDICT_THRESHOLDS)
}

/// Rounds to four decimal places.
#[must_use]
pub fn round_real(value: f64) -> f64 {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// Rounds an optional real.
#[must_use]
pub fn round_opt(value: Option<f64>) -> Option<f64> {
    value.map(round_real)
}

/// Rounds a view-valued real to the nearest whole view.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_views(value: f64) -> u64 {
    value.max(0.0).round() as u64
}

fn round_group(group: &mut GroupSummary) {
    group.mean = round_opt(group.mean);
    group.median = round_opt(group.median);
    group.std_dev = round_opt(group.std_dev);
    group.std_err = round_opt(group.std_err);
}

fn is_significance_level(key: &str) -> bool {
    key == "alpha" || key.ends_with("_alpha")
}

/// Rounds every number a finding carries.
pub fn round_finding(finding: &mut Finding) {
    for (key, value) in &mut finding.statistics {
        *value = if is_significance_level(key) {
            round_sig(*value)
        } else {
            round_real(*value)
        };
    }
    for value in finding.p_values.values_mut() {
        *value = round_p(*value);
    }
    finding.p_value = finding.p_value.map(round_p);
    finding.effect_size = round_opt(finding.effect_size);
    finding.groups.iter_mut().for_each(round_group);
}

/// Rounds a word-correlation row, keeping its p-value on the same side of the
/// significance levels it was flagged against.
pub fn round_word(word: &mut WordCorrelation, levels: &[f64]) {
    word.rho = round_real(word.rho);
    word.p_value = round_p_against(word.p_value, levels);
}

#[cfg(test)]
mod tests {
    use super::*;

    use openers_battery::{verdict_for, ProcedureKind};

    #[test]
    fn p_values_never_cross_verdict_thresholds() {
        for raw in [0.009_999_7, 0.009_999_51, 0.049_999, 0.049_999_9] {
            let published = round_p(raw);
            assert_eq!(verdict_for(published), verdict_for(raw), "{raw} -> {published}");
            assert!(published < raw + 1e-9);
        }
        assert!((round_p(0.009_999_7) - 0.009_999).abs() < 1e-15);
        assert!((round_p(0.049_999) - 0.049_99).abs() < 1e-15);
        assert!((round_p(0.010_000_3) - 0.01).abs() < 1e-15);
    }

    #[test]
    fn finding_verdict_matches_published_p() {
        let mut finding = Finding::new("demo", ProcedureKind::TwoGroup, "demo")
            .p_value_entry("mann_whitney_u", 0.049_999)
            .decide(0.049_999);
        round_finding(&mut finding);
        let published = finding.p_value.unwrap();
        assert_eq!(verdict_for(published), finding.verdict);
        assert!(finding.p_values["mann_whitney_u"] < 0.05);
    }

    #[test]
    fn significance_levels_keep_significant_figures() {
        let mut finding = Finding::new("demo", ProcedureKind::Lexical, "demo")
            .statistic("alpha", 0.05)
            .statistic("corrected_alpha", 0.05 / 300.0)
            .statistic("strongest_rho", 0.123_456);
        round_finding(&mut finding);
        assert!((finding.stat("corrected_alpha").unwrap() - 0.000_166_7).abs() < 1e-15);
        assert!((finding.stat("alpha").unwrap() - 0.05).abs() < 1e-15);
        assert!((finding.stat("strongest_rho").unwrap() - 0.1235).abs() < 1e-12);
    }

    #[test]
    fn word_p_values_respect_corrected_level() {
        let level = 0.05 / 300.0;
        let mut word = WordCorrelation {
            word: "story".to_string(),
            rho: 0.2,
            p_value: 0.000_166_66,
            documents: 40,
            significant: true,
            significant_corrected: true,
        };
        round_word(&mut word, &[0.05, level]);
        assert!(word.p_value < level);
    }

    #[test]
    fn p_values_keep_significant_figures() {
        assert!((round_p(0.012_345_67) - 0.012_35).abs() < 1e-15);
        assert!((round_p(3.141_59e-12) - 3.142e-12).abs() < 1e-24);
        assert!((round_p(0.5) - 0.5).abs() < f64::EPSILON);
        assert!(round_p(0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reals_keep_four_decimals() {
        assert!((round_real(1.234_567) - 1.2346).abs() < 1e-12);
        assert!((round_real(-0.000_04) - 0.0).abs() < 1e-12);
        assert_eq!(round_opt(None), None);
        assert_eq!(round_views(1_234.5), 1_235);
        assert_eq!(round_views(-3.0), 0);
    }

    #[test]
    fn rounding_is_idempotent() {
        for value in [0.123_456_789, 9.876_5e-7, 0.049_999] {
            assert_eq!(round_p(round_p(value)), round_p(value));
            assert_eq!(round_real(round_real(value)), round_real(value));
        }
    }
}
