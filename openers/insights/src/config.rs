use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use openers_battery::{load_labeled_sample, BatteryConfig};
use openers_corpus::BuildOptions;
use serde::{Deserialize, Serialize};

use crate::serializer::InsightsOptions;

/// Everything a pipeline run can be tuned with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Feature table options.
    #[serde(default)]
    pub corpus: BuildOptions,
    /// Battery thresholds.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Document list sizes.
    #[serde(default)]
    pub insights: InsightsOptions,
    /// Score openers with the built-in surprisal heuristic.
    #[serde(default)]
    pub heuristic_surprisal: bool,
}

impl AnalysisConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Relative `labeled_occupations` paths resolve against the file's
    /// directory, and the labels are read eagerly so a bad file fails here.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, a value is out of range, or the labeled sample cannot be loaded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading analysis config {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating {}", path.display()))?;

        let source_dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        if let Some(labels) = config.battery.labeled_occupations.as_mut() {
            if labels.is_relative() {
                *labels = source_dir.join(&*labels);
            }
            config.battery.extra_labels = load_labeled_sample(labels.as_path())
                .with_context(|| format!("loading labels referenced by {}", path.display()))?;
        }
        Ok(config)
    }

    /// Rejects values no run can use.
    ///
    /// # Errors
    ///
    /// Fails when a value is out of range.
    pub fn validate(&self) -> Result<()> {
        let percentile = self.corpus.viral_percentile;
        if !(percentile > 0.0 && percentile < 1.0) {
            bail!("corpus.viral_percentile must be inside (0, 1), got {percentile}");
        }
        let alpha = self.battery.lexical.alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            bail!("battery.lexical.alpha must be inside (0, 1), got {alpha}");
        }
        if self.battery.two_group_min == 0 || self.battery.min_sample == 0 {
            bail!("battery.two_group_min and battery.min_sample must be positive");
        }
        if self.battery.lexical.max_vocabulary == 0 {
            bail!("battery.lexical.max_vocabulary must be positive");
        }
        let lists = &self.insights;
        if [
            lists.viral_list_size,
            lists.extreme_list_size,
            lists.question_list_size,
            lists.poetry_list_size,
        ]
        .contains(&0)
        {
            bail!("insights list sizes must be positive");
        }
        if self.corpus.excerpt_chars == 0 {
            bail!("corpus.excerpt_chars must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use openers_corpus::OccupationCategory;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        fs::write(&path, "").unwrap();
        let config = AnalysisConfig::load(&path).unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.corpus.reference_year, 2025);
        assert_eq!(config.battery.period_boundary_year, 2020);
        assert_eq!(config.battery.lexical.min_document_frequency, 10);
        assert_eq!(config.insights.viral_list_size, 41);
    }

    #[test]
    fn loads_sections_and_resolves_label_path() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(
            dir.path().join("data/labels.csv"),
            "occupation,category\nOceanographer,scientist\n",
        )
        .unwrap();
        let path = dir.path().join("analysis.toml");
        fs::write(
            &path,
            r#"
heuristic_surprisal = true

[corpus]
reference_year = 2024
viral_percentile = 0.95

[battery]
period_boundary_year = 2016
parallel = false
labeled_occupations = "data/labels.csv"

[battery.lexical]
min_document_frequency = 4

[insights]
viral_list_size = 20
"#,
        )
        .unwrap();
        let config = AnalysisConfig::load(&path).unwrap();
        assert!(config.heuristic_surprisal);
        assert_eq!(config.corpus.reference_year, 2024);
        assert_eq!(config.corpus.excerpt_chars, 120);
        assert!(!config.battery.parallel);
        assert_eq!(config.battery.lexical.min_document_frequency, 4);
        assert_eq!(config.battery.lexical.max_vocabulary, 100);
        assert_eq!(config.insights.viral_list_size, 20);
        assert_eq!(
            config.battery.labeled_occupations.as_deref(),
            Some(dir.path().join("data/labels.csv").as_path())
        );
        assert_eq!(config.battery.extra_labels.len(), 1);
        assert_eq!(config.battery.extra_labels[0].category, OccupationCategory::Scientist);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        fs::write(&path, "[corpus]\nviral_percentile = 1.5\n").unwrap();
        let error = AnalysisConfig::load(&path).unwrap_err();
        assert!(format!("{error:#}").contains("viral_percentile"));

        fs::write(&path, "[insights]\nviral_list_size = 0\n").unwrap();
        assert!(AnalysisConfig::load(&path).is_err());
    }

    #[test]
    fn missing_label_file_fails_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        fs::write(&path, "[battery]\nlabeled_occupations = \"nope.csv\"\n").unwrap();
        assert!(AnalysisConfig::load(&path).is_err());
    }
}
