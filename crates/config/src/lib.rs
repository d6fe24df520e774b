//! Configuration loading, env substitution, and validation.
//!
//! Config files: `courier.toml`, `courier.yaml`, `courier.yml` or
//! `courier.json`, searched in `./` then `~/.config/courier/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in the raw
//! file before parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{
        AttachmentsConfig, CourierConfig, DefaultModel, InterfaceConfig, InterfaceKind,
        IssuesConfig, LinkKind, MetricsConfig, ModelProfile, ObjectStorageConfig,
        OrchestratorConfig, OrchestratorKind, SessionBackend, SessionsConfig, TelegramConfig,
    },
    validate::ConfigurationError,
};
