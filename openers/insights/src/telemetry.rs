use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord};

/// Builder for pipeline telemetry sinks.
pub struct PipelineTelemetryBuilder {
    stage: String,
    log_path: Option<PathBuf>,
}

impl PipelineTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            log_path: None,
        }
    }

    /// Sets the JSON-lines log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Builds the telemetry handle.
    ///
    /// # Errors
    ///
    /// Fails when the log file cannot be opened.
    pub fn build(self) -> Result<PipelineTelemetry> {
        let logger = match self.log_path {
            Some(path) => Some(JsonLogger::new(path)?),
            None => None,
        };
        Ok(PipelineTelemetry {
            inner: Arc::new(TelemetryInner {
                stage: self.stage,
                logger,
            }),
        })
    }
}

/// Run-scoped structured log shared by pipeline stages.
#[derive(Clone)]
pub struct PipelineTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for PipelineTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineTelemetry")
            .field("stage", &self.inner.stage)
            .field("log_path", &self.inner.logger.as_ref().map(JsonLogger::path))
            .finish()
    }
}

struct TelemetryInner {
    stage: String,
    logger: Option<JsonLogger>,
}

impl PipelineTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(stage: impl Into<String>) -> PipelineTelemetryBuilder {
        PipelineTelemetryBuilder::new(stage)
    }

    /// Logs one record with object metadata.
    ///
    /// # Errors
    ///
    /// Fails when the record cannot be written.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            let record = LogRecord::new(&self.inner.stage, level, message).with_metadata(metadata);
            logger.log(&record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shared_logging::read_log;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn writes_records_with_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let telemetry = PipelineTelemetry::builder("openers").log_path(&path).build().unwrap();
        telemetry
            .log(LogLevel::Info, "corpus.loaded", json!({ "talks": 3 }))
            .unwrap();
        let records = read_log(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stage, "openers");
        assert_eq!(records[0].metadata["talks"], json!(3));
    }

    #[test]
    fn without_a_path_logging_is_a_no_op() {
        let telemetry = PipelineTelemetry::builder("openers").build().unwrap();
        assert!(telemetry.log(LogLevel::Warn, "noop", Value::Null).is_ok());
    }
}
