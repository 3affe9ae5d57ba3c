#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Hypothesis test battery over opener feature tables.
//!
//! A fixed, ordered set of independent procedures reads an immutable
//! [`openers_corpus::FeatureTable`] and produces [`Finding`]s. Every verdict
//! comes from the single threshold lookup in [`verdict`], and a procedure
//! that lacks data yields an insufficient-data finding instead of failing the
//! run.

/// Battery runner and report types.
pub mod battery;
/// Thresholds and switches.
pub mod config;
/// Errors outside the statistics.
pub mod error;
/// Finding record.
pub mod finding;
/// Test procedures.
pub mod procedures;
/// Statistical primitives.
pub mod stats;
/// Verdict policy.
pub mod verdict;

pub use battery::{BatteryReport, BatterySummary, Hypothesis, HypothesisBattery, HypothesisOutcome};
pub use config::{BatteryConfig, LexicalConfig};
pub use error::BatteryError;
pub use finding::{Finding, GroupSummary, ProcedureKind};
pub use procedures::{
    accuracy::{built_in_labels, classifier_accuracy, load_labeled_sample, LabeledOccupation},
    lexical::{tokenize, WordCorrelation},
    temporal::{yearly_aggregates, YearAggregate},
    two_group::two_group_comparison,
};
pub use verdict::{verdict_for, Verdict};
