use std::{fs::File, path::Path};

use openers_corpus::{classify, OccupationCategory};
use serde::{Deserialize, Serialize};

use crate::{
    error::BatteryError,
    finding::{Finding, ProcedureKind},
    stats::binomial_upper_tail,
};

/// One hand-labeled occupation string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledOccupation {
    /// Raw occupation text.
    pub occupation: String,
    /// Category a human assigned.
    pub category: OccupationCategory,
}

impl LabeledOccupation {
    /// Pairs an occupation string with its expected category.
    #[must_use]
    pub fn new(occupation: impl Into<String>, category: OccupationCategory) -> Self {
        Self {
            occupation: occupation.into(),
            category,
        }
    }
}

/// Held-out occupations labeled by hand. Includes strings the keyword rules
/// are known to miss so the measured accuracy is honest.
const BUILT_IN_LABELS: [(&str, OccupationCategory); 28] = [
    ("Clinical psychologist", OccupationCategory::Psychologist),
    ("Psychiatrist", OccupationCategory::Psychologist),
    ("Neuropsychologist", OccupationCategory::Psychologist),
    ("Social psychologist", OccupationCategory::Psychologist),
    ("Novelist", OccupationCategory::Writer),
    ("Investigative journalist", OccupationCategory::Writer),
    ("Poet", OccupationCategory::Writer),
    ("Author, educator", OccupationCategory::Writer),
    ("Marine biologist", OccupationCategory::Scientist),
    ("Astrophysicist", OccupationCategory::Scientist),
    ("Neuroscientist", OccupationCategory::Scientist),
    ("Climate researcher", OccupationCategory::Scientist),
    ("Serial entrepreneur", OccupationCategory::Entrepreneur),
    ("Founder and CEO", OccupationCategory::Entrepreneur),
    ("Venture capitalist", OccupationCategory::Entrepreneur),
    ("Investor", OccupationCategory::Entrepreneur),
    ("Human rights activist", OccupationCategory::Activist),
    ("Community organizer", OccupationCategory::Activist),
    ("Environmental advocate", OccupationCategory::Activist),
    ("Lawyer and activist", OccupationCategory::Activist),
    ("Photographer", OccupationCategory::Artist),
    ("Street artist", OccupationCategory::Artist),
    ("Graphic designer", OccupationCategory::Artist),
    ("Cellist", OccupationCategory::Artist),
    ("Architect", OccupationCategory::Unclassified),
    ("Economist", OccupationCategory::Unclassified),
    ("Surgeon", OccupationCategory::Unclassified),
    ("Chef", OccupationCategory::Unclassified),
];

/// The built-in labeled sample.
#[must_use]
pub fn built_in_labels() -> Vec<LabeledOccupation> {
    BUILT_IN_LABELS
        .iter()
        .map(|(occupation, category)| LabeledOccupation::new(*occupation, *category))
        .collect()
}

#[derive(Deserialize)]
struct LabelRecord {
    occupation: String,
    category: String,
}

/// Reads an `occupation,category` CSV with a header row.
///
/// # Errors
///
/// Fails when the file cannot be read, a row is malformed, or a category is unknown.
pub fn load_labeled_sample(path: impl AsRef<Path>) -> Result<Vec<LabeledOccupation>, BatteryError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| BatteryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut labels = Vec::new();
    for (index, record) in reader.deserialize::<LabelRecord>().enumerate() {
        let record = record.map_err(|source| BatteryError::Labels {
            path: path.to_path_buf(),
            source,
        })?;
        let category = record
            .category
            .parse::<OccupationCategory>()
            .map_err(|_| BatteryError::UnknownCategory {
                path: path.to_path_buf(),
                record: index + 1,
                value: record.category.clone(),
            })?;
        labels.push(LabeledOccupation::new(record.occupation, category));
    }
    Ok(labels)
}

/// Accuracy of [`classify`] on a labeled sample.
///
/// The p-value is the exact one-sided binomial probability of at least this
/// many correct labels when guessing uniformly over the seven categories.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn classifier_accuracy(labels: &[LabeledOccupation], min_sample: usize) -> Finding {
    let total = labels.len();
    let correct = labels
        .iter()
        .filter(|label| classify(&label.occupation) == label.category)
        .count();
    let finding = Finding::new(
        "occupation_classifier_accuracy",
        ProcedureKind::Accuracy,
        "Keyword occupation classifier against hand-labeled occupations",
    )
    .sample_size("labeled", total)
    .sample_size("correct", correct);
    if total < min_sample.max(1) {
        return finding.insufficient(format!("need at least {} labeled occupations, found {total}", min_sample.max(1)));
    }
    let chance = 1.0 / OccupationCategory::ALL.len() as f64;
    let accuracy = correct as f64 / total as f64;
    finding
        .statistic("accuracy", accuracy)
        .statistic("correct", correct as f64)
        .statistic("total", total as f64)
        .statistic("chance_rate", chance)
        .effect(accuracy - chance)
        .note("one-sided exact binomial test against uniform guessing")
        .decide(binomial_upper_tail(correct, total, chance))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::verdict::Verdict;

    #[test]
    fn built_in_sample_has_known_misses() {
        let finding = classifier_accuracy(&built_in_labels(), 3);
        assert_eq!(finding.sample_sizes["labeled"], 28);
        assert_eq!(finding.sample_sizes["correct"], 23);
        assert!((finding.stat("accuracy").unwrap() - 23.0 / 28.0).abs() < 1e-12);
        assert_eq!(finding.verdict, Verdict::Strong);
    }

    #[test]
    fn empty_sample_is_insufficient() {
        let finding = classifier_accuracy(&[], 3);
        assert!(finding.is_insufficient());
    }

    #[test]
    fn loads_labels_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "occupation,category").unwrap();
        writeln!(file, "Oceanographer, scientist").unwrap();
        writeln!(file, "\"Poet, essayist\",writer").unwrap();
        writeln!(file, "Chef,other").unwrap();
        let labels = load_labeled_sample(file.path()).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0].category, OccupationCategory::Scientist);
        assert_eq!(labels[1].occupation, "Poet, essayist");
        assert_eq!(labels[2].category, OccupationCategory::Unclassified);
    }

    #[test]
    fn rejects_unknown_category() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "occupation,category\nPlumber,trades").unwrap();
        let error = load_labeled_sample(file.path()).unwrap_err();
        assert!(matches!(error, BatteryError::UnknownCategory { record: 1, .. }));
    }
}
