//! Interface variants and their command tables.

use {
    courier_channels::{ContentKind, ReplyMarkup},
    courier_config::{InterfaceConfig, InterfaceKind},
};

pub const START_NEW_CHAT: &str = "🔄 Start New Chat";
pub const REPORT_ISSUE: &str = "⚠️ Report Issue";
pub const SELECT_MODEL: &str = "🤖 Select Model";

/// A menu button the user can press instead of typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    StartNewChat,
    ReportIssue,
    SelectModel,
}

impl MenuCommand {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::StartNewChat => START_NEW_CHAT,
            Self::ReportIssue => REPORT_ISSUE,
            Self::SelectModel => SELECT_MODEL,
        }
    }
}

/// What a running bot offers, fixed at construction from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotInterface {
    /// Full tester bot: issue reports, optional model selector, attachments.
    Tester {
        show_model_selector: bool,
        title: Option<String>,
    },
    /// Text-only demo bot with a single reset button.
    Showcase { title: Option<String> },
}

impl BotInterface {
    #[must_use]
    pub fn from_config(cfg: &InterfaceConfig) -> Self {
        match cfg.kind {
            InterfaceKind::Tester => Self::Tester {
                show_model_selector: cfg.show_model_selector,
                title: cfg.title.clone(),
            },
            InterfaceKind::Showcase => Self::Showcase {
                title: cfg.title.clone(),
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tester { .. } => "tester",
            Self::Showcase { .. } => "showcase",
        }
    }

    /// Replacement for the localized welcome text.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Tester { title, .. } | Self::Showcase { title } => title.as_deref(),
        }
    }

    #[must_use]
    pub fn supports_reports(&self) -> bool {
        matches!(self, Self::Tester { .. })
    }

    #[must_use]
    pub fn shows_model_selector(&self) -> bool {
        matches!(
            self,
            Self::Tester {
                show_model_selector: true,
                ..
            }
        )
    }

    /// Whether attachments of `kind` are forwarded at all.
    #[must_use]
    pub fn accepts(&self, kind: ContentKind) -> bool {
        match self {
            Self::Tester { .. } => true,
            Self::Showcase { .. } => kind == ContentKind::Text,
        }
    }

    /// Buttons available in this variant, in menu order.
    #[must_use]
    pub fn commands(&self) -> Vec<MenuCommand> {
        let mut commands = vec![MenuCommand::StartNewChat];
        if self.supports_reports() {
            commands.push(MenuCommand::ReportIssue);
        }
        if self.shows_model_selector() {
            commands.push(MenuCommand::SelectModel);
        }
        commands
    }

    /// Exact-text match against the command table.
    #[must_use]
    pub fn match_command(&self, text: &str) -> Option<MenuCommand> {
        self.commands().into_iter().find(|c| c.label() == text)
    }

    /// Persistent keyboard shown under every bot message.
    #[must_use]
    pub fn main_menu(&self) -> ReplyMarkup {
        let mut rows = Vec::new();
        match self {
            Self::Tester { .. } => {
                rows.push(vec![START_NEW_CHAT.to_string(), REPORT_ISSUE.to_string()]);
                if self.shows_model_selector() {
                    rows.push(vec![SELECT_MODEL.to_string()]);
                }
            },
            Self::Showcase { .. } => rows.push(vec![START_NEW_CHAT.to_string()]),
        }
        ReplyMarkup::Menu(rows)
    }
}
