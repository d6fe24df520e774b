//! Metric name and label definitions.
//!
//! Every metric recorded by courier is named here so the full set can be
//! read in one place.

/// Inbound platform events
pub mod inbound {
    /// Total inbound events accepted by the dispatcher
    pub const EVENTS_TOTAL: &str = "courier_inbound_events_total";
    /// Inbound content answered with the "unsupported content" notice
    pub const UNSUPPORTED_TOTAL: &str = "courier_inbound_unsupported_total";
    /// Number of live per-user workers
    pub const WORKERS_ACTIVE: &str = "courier_inbound_workers_active";
    /// Time spent processing one inbound event, in seconds
    pub const PROCESSING_DURATION_SECONDS: &str = "courier_inbound_processing_duration_seconds";
}

/// Orchestrator round trips
pub mod orchestrator {
    /// Total orchestrator invocations
    pub const CALLS_TOTAL: &str = "courier_orchestrator_calls_total";
    /// Orchestrator invocations that failed or timed out
    pub const FAILURES_TOTAL: &str = "courier_orchestrator_failures_total";
    /// Orchestrator round-trip duration in seconds
    pub const CALL_DURATION_SECONDS: &str = "courier_orchestrator_call_duration_seconds";
}

/// Attachment resolution
pub mod attachments {
    /// Resolved attachments, labelled by `strategy`
    pub const RESOLVED_TOTAL: &str = "courier_attachments_resolved_total";
    /// Attachment download/upload failures
    pub const FETCH_FAILURES_TOTAL: &str = "courier_attachments_fetch_failures_total";
}

/// Issue reports
pub mod issues {
    /// Issue reports submitted by users
    pub const REPORTS_TOTAL: &str = "courier_issue_reports_total";
    /// Issue reports the durable sink failed to persist
    pub const SINK_FAILURES_TOTAL: &str = "courier_issue_sink_failures_total";
}

/// Telegram transport
pub mod telegram {
    /// Total messages sent to Telegram
    pub const MESSAGES_SENT_TOTAL: &str = "courier_telegram_messages_sent_total";
    /// Failed Telegram send attempts
    pub const SEND_ERRORS_TOTAL: &str = "courier_telegram_send_errors_total";
    /// Failed `getUpdates` polls
    pub const POLL_ERRORS_TOTAL: &str = "courier_telegram_poll_errors_total";
}

/// Common label keys
pub mod labels {
    pub const KIND: &str = "kind";
    pub const STRATEGY: &str = "strategy";
    pub const RESULT: &str = "result";
}
