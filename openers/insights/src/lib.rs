#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Insights document production for the opener analysis.
//!
//! [`AnalysisPipeline`] loads a corpus, builds the feature table, runs the
//! hypothesis battery and hands the report to [`InsightsSerializer`], whose
//! [`InsightsDocument`] is written atomically by [`write_document`].

/// Run configuration.
pub mod config;
/// Document schema.
pub mod document;
/// Document errors.
pub mod error;
/// Pipeline runtime.
pub mod pipeline;
/// Output rounding rules.
pub mod rounding;
/// Report and table aggregation.
pub mod serializer;
/// Run-scoped structured log.
pub mod telemetry;
/// Atomic document persistence.
pub mod writer;

pub use config::AnalysisConfig;
pub use document::{
    CorpusStats, EventSummary, Extremes, InsightsDocument, OccupationSummary, Provenance,
    QuestionOpeners, StrategyShare, TalkExcerpt, TimelinePoint, ViralTalk, SCHEMA_VERSION,
};
pub use error::InsightsError;
pub use pipeline::{AnalysisPipeline, RunSummary};
pub use serializer::{InsightsOptions, InsightsSerializer};
pub use telemetry::{PipelineTelemetry, PipelineTelemetryBuilder};
pub use writer::{read_document, to_json, write_document};
