use std::fmt;

use serde::{Deserialize, Serialize};

/// p below this is a strong result.
pub const STRONG_THRESHOLD: f64 = 0.01;
/// p below this (and at or above [`STRONG_THRESHOLD`]) is a moderate result.
pub const MODERATE_THRESHOLD: f64 = 0.05;

/// Categorical strength of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// `p < 0.01`.
    #[serde(rename = "strong")]
    Strong,
    /// `0.01 <= p < 0.05`.
    #[serde(rename = "moderate")]
    Moderate,
    /// `p >= 0.05`.
    #[serde(rename = "weak/none")]
    WeakOrNone,
    /// The procedure did not compute a statistic.
    #[serde(rename = "insufficient_data")]
    InsufficientData,
}

impl Verdict {
    /// Serialized label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Moderate => "moderate",
            Self::WeakOrNone => "weak/none",
            Self::InsufficientData => "insufficient_data",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The one threshold lookup every procedure goes through.
#[must_use]
pub fn verdict_for(p_value: f64) -> Verdict {
    if p_value.is_nan() {
        Verdict::InsufficientData
    } else if p_value < STRONG_THRESHOLD {
        Verdict::Strong
    } else if p_value < MODERATE_THRESHOLD {
        Verdict::Moderate
    } else {
        Verdict::WeakOrNone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_half_open() {
        assert_eq!(verdict_for(0.0), Verdict::Strong);
        assert_eq!(verdict_for(0.009_999), Verdict::Strong);
        assert_eq!(verdict_for(0.01), Verdict::Moderate);
        assert_eq!(verdict_for(0.049_999), Verdict::Moderate);
        assert_eq!(verdict_for(0.05), Verdict::WeakOrNone);
        assert_eq!(verdict_for(1.0), Verdict::WeakOrNone);
        assert_eq!(verdict_for(f64::NAN), Verdict::InsufficientData);
    }

    #[test]
    fn labels_match_serialization() {
        for verdict in [
            Verdict::Strong,
            Verdict::Moderate,
            Verdict::WeakOrNone,
            Verdict::InsufficientData,
        ] {
            let encoded = serde_json::to_string(&verdict).unwrap();
            assert_eq!(encoded, format!("\"{}\"", verdict.label()));
        }
    }
}
