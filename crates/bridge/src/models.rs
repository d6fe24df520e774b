//! Selectable model profiles and the metadata attached to issue reports.

use {
    courier_channels::{Choice, ModelSelection},
    courier_config::{DefaultModel, ModelProfile},
};

/// Where the model shown for a session comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    UserSelected,
    ConfigDefault,
    Unknown,
}

impl ModelSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserSelected => "user_selected",
            Self::ConfigDefault => "config_default",
            Self::Unknown => "unknown",
        }
    }
}

/// Ordered `key: value` metadata about the active model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelInfo {
    pub fields: Vec<(String, String)>,
}

impl ModelInfo {
    fn push(&mut self, key: &str, value: impl Into<String>) {
        self.fields.push((key.to_string(), value.into()));
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// One `key: value` line per field.
    #[must_use]
    pub fn render(&self) -> String {
        if self.fields.is_empty() {
            return "Default (no model selected)".to_string();
        }
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    profiles: Vec<ModelProfile>,
    default: Option<DefaultModel>,
}

impl ModelCatalog {
    pub fn new(profiles: Vec<ModelProfile>, default: Option<DefaultModel>) -> Self {
        Self { profiles, default }
    }

    #[must_use]
    pub fn profiles(&self) -> &[ModelProfile] {
        &self.profiles
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ModelProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Name shown in the selector prompt.
    #[must_use]
    pub fn current_name(&self, selected: Option<&str>) -> String {
        selected
            .and_then(|id| self.get(id))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Default".to_string())
    }

    /// Name shown under the welcome text.
    #[must_use]
    pub fn display_name(&self, selected: Option<&str>) -> String {
        let info = self.info(selected);
        info.get("name")
            .or_else(|| info.get("id"))
            .unwrap_or("Unknown")
            .to_string()
    }

    /// One button per profile.
    #[must_use]
    pub fn choices(&self) -> Vec<Choice> {
        self.profiles
            .iter()
            .map(|p| Choice {
                label: p.name.clone(),
                data: ModelSelection::callback_data(&p.id),
            })
            .collect()
    }

    /// Metadata for the selected profile, else the configured default.
    #[must_use]
    pub fn info(&self, selected: Option<&str>) -> ModelInfo {
        let mut info = ModelInfo::default();
        if let Some(profile) = selected.and_then(|id| self.get(id)) {
            info.push("id", profile.id.clone());
            info.push("name", profile.name.clone());
            if let Some(provider) = &profile.provider {
                info.push("provider", provider.clone());
            }
            info.push("source", ModelSource::UserSelected.as_str());
            return info;
        }
        if let Some(default) = &self.default {
            info.push("id", default.id.clone());
            info.push(
                "provider",
                default.provider.clone().unwrap_or_else(|| "unknown".into()),
            );
            if let Some(t) = default.temperature {
                info.push("temperature", t.to_string());
            }
            info.push("source", ModelSource::ConfigDefault.as_str());
            return info;
        }
        info.push("source", ModelSource::Unknown.as_str());
        info
    }
}
