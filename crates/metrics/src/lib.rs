//! Metrics for courier.
//!
//! Library crates record through the `metrics` facade (re-exported here)
//! behind their own `metrics` feature; the binary decides whether a
//! recorder is installed.
//!
//! ```rust,ignore
//! use courier_metrics::{counter, orchestrator};
//!
//! counter!(orchestrator::CALLS_TOTAL, "kind" => "text").increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsRecorderConfig, init_metrics},
};

pub use metrics::{counter, gauge, histogram};
