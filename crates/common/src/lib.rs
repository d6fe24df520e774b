//! Shared error plumbing and small utilities used across all courier crates.

pub mod error;
pub mod time;

pub use error::{Context, FromMessage};
