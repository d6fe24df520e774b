//! Config schema types.
use std::{collections::HashMap, path::PathBuf};

use {
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

/// Document MIME types accepted when no allow-list is configured.
pub const DEFAULT_DOCUMENT_MIMES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub telegram: TelegramConfig,
    pub interface: InterfaceConfig,
    pub orchestrator: OrchestratorConfig,
    /// Model profiles users may pick from with "select model".
    pub models: Vec<ModelProfile>,
    pub attachments: AttachmentsConfig,
    pub object_storage: ObjectStorageConfig,
    pub sessions: SessionsConfig,
    pub issues: IssuesConfig,
    /// Message catalog overrides: language code -> message key -> text.
    pub messages: HashMap<String, HashMap<String, String>>,
    pub metrics: MetricsConfig,
}

/// Telegram bot account.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,
    /// Long-polling timeout passed to `getUpdates`, in seconds.
    pub poll_timeout_secs: u32,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            poll_timeout_secs: 30,
        }
    }
}

/// Which bot interface variant runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    /// Full command set: reporting, model selection, attachments.
    #[default]
    Tester,
    /// Text-only demo with a single "start new chat" button.
    Showcase,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    pub kind: InterfaceKind,
    /// Show the "select model" button (tester only).
    pub show_model_selector: bool,
    /// Replaces the localized welcome text when set.
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestratorKind {
    /// POST each request as JSON to `orchestrator.url`.
    #[default]
    Http,
    /// Answer `Echo: <text>` locally. Development only.
    Echo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub kind: OrchestratorKind,
    pub url: Option<String>,
    /// Upper bound for one orchestrator round trip.
    pub timeout_secs: u64,
    /// Model the orchestrator uses when the user has not picked one.
    /// Only used for display and issue metadata.
    pub default_model: Option<DefaultModel>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            kind: OrchestratorKind::default(),
            url: None,
            timeout_secs: 120,
            default_model: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultModel {
    pub id: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// A selectable model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Attachment kinds that may be handed over as a platform link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Image,
    Document,
    Audio,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AttachmentsConfig {
    /// Kinds resolved as time-limited platform URLs instead of inline bytes.
    pub url_kinds: Vec<LinkKind>,
    /// Accepted document MIME types.
    pub document_mimes: Vec<String>,
    /// Upper bound for one download or upload.
    pub timeout_secs: u64,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            url_kinds: vec![LinkKind::Image],
            document_mimes: DEFAULT_DOCUMENT_MIMES
                .iter()
                .map(|m| (*m).to_string())
                .collect(),
            timeout_secs: 60,
        }
    }
}

/// Durable object storage for attachments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObjectStorageConfig {
    pub enabled: bool,
    /// Base URL objects are `PUT` under.
    pub endpoint: Option<String>,
    /// Base URL the orchestrator reads objects from. Defaults to `endpoint`.
    pub public_base_url: Option<String>,
    /// Bearer token sent with uploads.
    pub token: Option<Secret<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    pub backend: SessionBackend,
    pub sqlite_path: Option<PathBuf>,
    /// Keep the selected model when the user starts a new chat.
    pub retain_model_on_reset: bool,
    /// Oldest transcript entries are dropped beyond this count.
    pub max_transcript_entries: usize,
    /// A per-user worker with nothing queued retires after this many seconds.
    pub worker_idle_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            sqlite_path: None,
            retain_model_on_reset: true,
            max_transcript_entries: 200,
            worker_idle_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IssuesConfig {
    /// JSONL file issue reports are appended to. Reports are only logged when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Prometheus scrape address, e.g. `127.0.0.1:9464`.
    pub listen: Option<String>,
}
