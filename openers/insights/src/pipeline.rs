use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use openers_battery::{BatterySummary, HypothesisBattery};
use openers_corpus::{
    load_corpus, DataQuality, FeatureTable, FeatureTableBuilder, HeuristicSurprisal,
    SurprisalScorer, Talk,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_logging::LogLevel;
use tracing::{info, warn};

use crate::{
    config::AnalysisConfig, document::InsightsDocument, serializer::InsightsSerializer,
    telemetry::PipelineTelemetry, writer::write_document,
};

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Talks loaded.
    pub talks: usize,
    /// Findings written.
    pub findings: usize,
    /// Verdict tallies.
    pub battery: BatterySummary,
    /// Degradation counts.
    pub quality: DataQuality,
    /// Document location.
    pub output: PathBuf,
}

/// Load, build, test, serialize, write.
#[derive(Clone, Default)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    telemetry: Option<PipelineTelemetry>,
    scorer: Option<Arc<dyn SurprisalScorer>>,
}

impl fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("config", &self.config)
            .field("telemetry", &self.telemetry)
            .field("scorer", &self.scorer.is_some())
            .finish()
    }
}

impl AnalysisPipeline {
    /// Creates a pipeline.
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            telemetry: None,
            scorer: None,
        }
    }

    /// Attaches a run log.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: PipelineTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Injects a surprisal scorer, overriding `heuristic_surprisal`.
    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn SurprisalScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn emit(&self, level: LogLevel, message: &str, metadata: Value) {
        if let Some(telemetry) = &self.telemetry {
            if let Err(err) = telemetry.log(level, message, metadata) {
                warn!(error = %err, message, "telemetry write failed");
            }
        }
    }

    fn table_builder(&self) -> FeatureTableBuilder {
        let builder = FeatureTableBuilder::new(self.config.corpus.clone());
        match (&self.scorer, self.config.heuristic_surprisal) {
            (Some(scorer), _) => builder.with_scorer(Arc::clone(scorer)),
            (None, true) => builder.with_scorer(Arc::new(HeuristicSurprisal::default())),
            (None, false) => builder,
        }
    }

    /// Builds the feature table and records its data-quality counts.
    #[must_use]
    pub fn build_table(&self, talks: &[Talk]) -> FeatureTable {
        let table = self.table_builder().build(talks);
        self.emit(
            LogLevel::Info,
            "table.built",
            json!({
                "rows": table.len(),
                "viral_threshold": table.viral.views,
                "quality": table.quality,
            }),
        );
        table
    }

    /// Runs the in-memory part of the pipeline.
    #[must_use]
    pub fn analyze(&self, talks: &[Talk], generated_at: DateTime<Utc>) -> InsightsDocument {
        let table = self.build_table(talks);
        let report = HypothesisBattery::new(self.config.battery.clone()).run(&table);
        for finding in &report.findings {
            self.emit(
                LogLevel::Debug,
                "battery.procedure",
                json!({
                    "hypothesis": finding.hypothesis,
                    "finding": finding.name,
                    "verdict": finding.verdict,
                    "p_value": finding.p_value,
                    "note": finding.note,
                }),
            );
        }
        self.emit(
            LogLevel::Info,
            "battery.completed",
            json!({ "summary": report.summary, "words": report.word_correlations.len() }),
        );
        InsightsSerializer::new(self.config.insights.clone()).serialize(&report, &table, generated_at)
    }

    /// Loads the corpus, analyses it and writes the document atomically.
    ///
    /// A corpus that cannot be loaded or a document that cannot be written
    /// fails the whole run; nothing is written in either case.
    ///
    /// # Errors
    ///
    /// Fails when the corpus cannot be loaded or the document cannot be written.
    pub fn run(
        &self,
        corpus_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        generated_at: DateTime<Utc>,
    ) -> Result<RunSummary> {
        let corpus_path = corpus_path.as_ref();
        let output_path = output_path.as_ref();
        let talks = match load_corpus(corpus_path) {
            Ok(talks) => talks,
            Err(err) => {
                self.emit(
                    LogLevel::Error,
                    "corpus.failed",
                    json!({ "path": corpus_path.display().to_string(), "error": err.to_string() }),
                );
                return Err(anyhow::Error::new(err)
                    .context(format!("loading corpus {}", corpus_path.display())));
            }
        };
        self.emit(
            LogLevel::Info,
            "corpus.loaded",
            json!({ "path": corpus_path.display().to_string(), "talks": talks.len() }),
        );

        let document = self.analyze(&talks, generated_at);
        write_document(output_path, &document)
            .with_context(|| format!("writing insights to {}", output_path.display()))?;
        self.emit(
            LogLevel::Info,
            "insights.written",
            json!({
                "path": output_path.display().to_string(),
                "findings": document.findings.len(),
                "schema_version": document.provenance.schema_version,
            }),
        );
        info!(
            talks = talks.len(),
            findings = document.findings.len(),
            output = %output_path.display(),
            "analysis run finished"
        );
        Ok(RunSummary {
            talks: talks.len(),
            findings: document.findings.len(),
            battery: document.provenance.battery,
            quality: document.provenance.data_quality,
            output: output_path.to_path_buf(),
        })
    }

    /// Loads the corpus and builds the feature table without testing anything.
    ///
    /// # Errors
    ///
    /// Fails when the corpus cannot be loaded.
    pub fn validate(&self, corpus_path: impl AsRef<Path>) -> Result<DataQuality> {
        let corpus_path = corpus_path.as_ref();
        let talks = load_corpus(corpus_path)
            .with_context(|| format!("loading corpus {}", corpus_path.display()))?;
        Ok(self.build_table(&talks).quality)
    }
}
