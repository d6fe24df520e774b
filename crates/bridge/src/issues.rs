//! Issue reports: transcript snapshot plus model metadata, appended to a
//! durable sink.

use std::path::PathBuf;

use {
    async_trait::async_trait,
    courier_sessions::TranscriptEntry,
    serde::{Deserialize, Serialize},
    tokio::io::AsyncWriteExt,
    tracing::{error, info},
};

#[cfg(feature = "metrics")]
use courier_metrics::{counter, issues as metrics_issues};

use crate::{error::Error, models::ModelInfo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Local time, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
    pub model_info: String,
    pub transcript: String,
    pub description: String,
}

/// Durable destination for issue records.
#[async_trait]
pub trait IssueSink: Send + Sync {
    async fn append_record(&self, record: &IssueRecord) -> anyhow::Result<()>;
}

/// Appends one JSON object per line.
pub struct JsonlIssueSink {
    path: PathBuf,
}

impl JsonlIssueSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl IssueSink for JsonlIssueSink {
    async fn append_record(&self, record: &IssueRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Used when no sink path is configured; the report is still logged.
#[derive(Debug, Default)]
pub struct LogOnlyIssueSink;

#[async_trait]
impl IssueSink for LogOnlyIssueSink {
    async fn append_record(&self, _record: &IssueRecord) -> anyhow::Result<()> {
        Ok(())
    }
}

/// `User: ...` / `AI: ...`, one line per entry in order.
#[must_use]
pub fn format_transcript(transcript: &[TranscriptEntry]) -> String {
    transcript
        .iter()
        .map(|e| format!("{}: {}", e.role.label(), e.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct IssueReporter {
    sink: std::sync::Arc<dyn IssueSink>,
}

impl IssueReporter {
    pub fn new(sink: std::sync::Arc<dyn IssueSink>) -> Self {
        Self { sink }
    }

    /// Build and persist one record. Completes before returning; sink
    /// failures are logged and swallowed.
    pub async fn submit(
        &self,
        user_id: &str,
        description: &str,
        transcript: &[TranscriptEntry],
        model_info: &ModelInfo,
    ) {
        let record = IssueRecord {
            timestamp: courier_common::time::local_timestamp(),
            model_info: model_info.render(),
            transcript: format_transcript(transcript),
            description: description.to_string(),
        };

        info!(
            user_id,
            entries = transcript.len(),
            model = model_info.get("id").unwrap_or("default"),
            description_len = record.description.len(),
            "issue report received"
        );
        #[cfg(feature = "metrics")]
        counter!(metrics_issues::REPORTS_TOTAL).increment(1);

        if let Err(e) = self.sink.append_record(&record).await {
            let e = Error::SinkWriteFailed(e);
            error!(user_id, error = %e, "failed to persist issue report");
            #[cfg(feature = "metrics")]
            counter!(metrics_issues::SINK_FAILURES_TOTAL).increment(1);
        }
    }
}
