//! Per-user conversational state.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Top-level conversation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the business context text.
    #[default]
    AwaitingContext,
    /// Context captured; content is forwarded to the orchestrator.
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used in human-readable transcripts.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub state: SessionState,
    /// Business context captured while awaiting context.
    #[serde(default)]
    pub context: Option<String>,
    /// Model profile id; `None` means the configured default.
    #[serde(default)]
    pub selected_model: Option<String>,
    #[serde(default)]
    pub reporting: bool,
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            state: SessionState::AwaitingContext,
            context: None,
            selected_model: None,
            reporting: false,
            transcript: Vec::new(),
        }
    }

    /// `reporting` only ever holds in `Active`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        !self.reporting || self.state == SessionState::Active
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Store the business context and enter `Active`.
    pub fn activate(&mut self, context: impl Into<String>) {
        self.context = Some(context.into());
        self.state = SessionState::Active;
    }

    /// Enter the reporting sub-flow.
    pub fn begin_reporting(&mut self) -> Result<()> {
        if !self.is_active() {
            return Err(Error::invalid_transition(
                "reporting requires an active session",
            ));
        }
        self.reporting = true;
        Ok(())
    }

    /// Back to `AwaitingContext` with an empty transcript.
    pub fn reset(&mut self, retain_model: bool) {
        self.state = SessionState::AwaitingContext;
        self.context = None;
        self.reporting = false;
        self.transcript.clear();
        if !retain_model {
            self.selected_model = None;
        }
    }

    /// Append to the transcript, dropping the oldest entries beyond `cap`.
    pub fn push_transcript(&mut self, role: Role, text: impl Into<String>, cap: usize) {
        self.transcript.push(TranscriptEntry {
            role,
            text: text.into(),
        });
        if self.transcript.len() > cap {
            let excess = self.transcript.len() - cap;
            self.transcript.drain(..excess);
        }
    }
}
