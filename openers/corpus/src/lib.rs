#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Talk corpus ingestion and per-talk feature derivation.
//!
//! Raw rows are loaded into [`Talk`] records, each transcript's opening line
//! is reduced to [`OpenerFeatures`], speaker occupations are mapped onto a
//! closed [`OccupationCategory`] set, and everything is joined into a
//! [`FeatureTable`] that the hypothesis battery reads.

/// Tabular corpus loading.
pub mod loader;
/// Occupation keyword classification.
pub mod occupation;
/// Opening-line extraction and marker detection.
pub mod opener;
/// Injectable opener surprisal scoring.
pub mod surprisal;
/// Feature table construction.
pub mod table;
/// Talk record and cell decoding helpers.
pub mod talk;

pub use loader::{load_corpus, read_corpus, CorpusError, REQUIRED_COLUMNS};
pub use occupation::{classify, classify_all, OccupationCategory, CLASSIFICATION_RULES};
pub use opener::{extract, opening_line, strip_annotations, OpenerFeatures, OpeningStrategy};
pub use surprisal::{HeuristicSurprisal, SurprisalScorer};
pub use table::{
    BuildOptions, DataQuality, EventType, FeatureRow, FeatureTable, FeatureTableBuilder,
    LengthBucket, ViralThreshold,
};
pub use talk::Talk;
