#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Resolve(#[from] courier_media::Error),

    #[error("orchestrator call failed: {0:#}")]
    OrchestratorCallFailed(anyhow::Error),

    #[error("orchestrator call timed out after {secs}s")]
    OrchestratorTimeout { secs: u64 },

    #[error("issue sink write failed: {0:#}")]
    SinkWriteFailed(anyhow::Error),

    #[error(transparent)]
    Session(#[from] courier_sessions::Error),

    #[error(transparent)]
    Transport(#[from] courier_channels::Error),
}

impl Error {
    /// Timeouts are handled exactly like call failures.
    #[must_use]
    pub fn is_orchestrator_failure(&self) -> bool {
        matches!(
            self,
            Self::OrchestratorCallFailed(_) | Self::OrchestratorTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
