//! Startup validation.
//!
//! Every problem found is collected so the operator sees the whole list at
//! once; any problem prevents the process from starting.

use std::fmt;

use crate::schema::{CourierConfig, InterfaceKind, OrchestratorKind, SessionBackend};

/// A configuration the process cannot start with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    pub problems: Vec<String>,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.problems.join("; "))
    }
}

impl std::error::Error for ConfigurationError {}

impl CourierConfig {
    /// Check required startup parameters and cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut problems = Vec::new();

        if !self.has_token() {
            problems.push("telegram.token is required (or set TELEGRAM_BOT_TOKEN)".to_string());
        }

        if self.orchestrator.kind == OrchestratorKind::Http
            && self.orchestrator.url.as_deref().is_none_or(str::is_empty)
        {
            problems.push(
                "orchestrator.url is required when orchestrator.kind = \"http\"".to_string(),
            );
        }

        if self.orchestrator.timeout_secs == 0 {
            problems.push("orchestrator.timeout_secs must be greater than 0".to_string());
        }

        if self.attachments.timeout_secs == 0 {
            problems.push("attachments.timeout_secs must be greater than 0".to_string());
        }

        if self.object_storage.enabled && self.object_storage.endpoint.is_none() {
            problems.push(
                "object_storage.endpoint is required when object storage is enabled".to_string(),
            );
        }

        if self.sessions.backend == SessionBackend::Sqlite && self.sessions.sqlite_path.is_none()
        {
            problems.push(
                "sessions.sqlite_path is required when sessions.backend = \"sqlite\"".to_string(),
            );
        }

        if self.sessions.max_transcript_entries == 0 {
            problems.push("sessions.max_transcript_entries must be greater than 0".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for model in &self.models {
            if model.id.is_empty() {
                problems.push(format!("models: profile \"{}\" has an empty id", model.name));
            } else if !seen.insert(model.id.as_str()) {
                problems.push(format!("models: duplicate model id \"{}\"", model.id));
            }
        }

        if let Some(default) = &self.orchestrator.default_model
            && !self.models.is_empty()
            && !self.models.iter().any(|m| m.id == default.id)
        {
            problems.push(format!(
                "orchestrator.default_model \"{}\" is not listed in models",
                default.id
            ));
        }

        if self.interface.kind == InterfaceKind::Tester
            && self.interface.show_model_selector
            && self.models.is_empty()
        {
            problems.push(
                "interface.show_model_selector requires at least one entry in models".to_string(),
            );
        }

        if self.metrics.enabled
            && let Some(listen) = &self.metrics.listen
            && listen.parse::<std::net::SocketAddr>().is_err()
        {
            problems.push(format!("metrics.listen is not a socket address: {listen}"));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError { problems })
        }
    }
}
