use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::procedures::accuracy::LabeledOccupation;

fn default_two_group_min() -> usize {
    5
}

fn default_min_sample() -> usize {
    3
}

fn default_period_boundary_year() -> i32 {
    2020
}

fn default_min_talks_per_year() -> usize {
    20
}

fn default_parallel() -> bool {
    true
}

fn default_min_document_frequency() -> usize {
    10
}

fn default_max_vocabulary() -> usize {
    100
}

fn default_alpha() -> f64 {
    0.05
}

/// Word correlation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalConfig {
    /// Openers a word must appear in to be tested.
    #[serde(default = "default_min_document_frequency")]
    pub min_document_frequency: usize,
    /// Most frequent words kept after the frequency filter.
    #[serde(default = "default_max_vocabulary")]
    pub max_vocabulary: usize,
    /// Family-wise significance level before correction.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            min_document_frequency: default_min_document_frequency(),
            max_vocabulary: default_max_vocabulary(),
            alpha: default_alpha(),
        }
    }
}

/// Battery thresholds and switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Minimum members per group for two-group comparisons.
    #[serde(default = "default_two_group_min")]
    pub two_group_min: usize,
    /// Minimum observations for any other procedure.
    #[serde(default = "default_min_sample")]
    pub min_sample: usize,
    /// First year of the late period in the strategy shift test.
    #[serde(default = "default_period_boundary_year")]
    pub period_boundary_year: i32,
    /// A year enters trend regressions only with strictly more talks than this.
    #[serde(default = "default_min_talks_per_year")]
    pub min_talks_per_year: usize,
    /// Run procedures on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Word correlation settings.
    #[serde(default)]
    pub lexical: LexicalConfig,
    /// Optional CSV of extra labeled occupations (`occupation,category`).
    #[serde(default)]
    pub labeled_occupations: Option<PathBuf>,
    /// Labels loaded from `labeled_occupations`, appended to the built-in sample.
    #[serde(skip)]
    pub extra_labels: Vec<LabeledOccupation>,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            two_group_min: default_two_group_min(),
            min_sample: default_min_sample(),
            period_boundary_year: default_period_boundary_year(),
            min_talks_per_year: default_min_talks_per_year(),
            parallel: default_parallel(),
            lexical: LexicalConfig::default(),
            labeled_occupations: None,
            extra_labels: Vec::new(),
        }
    }
}
