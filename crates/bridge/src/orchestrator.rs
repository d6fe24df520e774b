//! Orchestrator request/response types and clients.

use std::time::Duration;

use {
    async_trait::async_trait,
    courier_channels::ContentItem,
    serde::{Deserialize, Deserializer, Serialize},
    tracing::debug,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Image,
    Document,
    Audio,
    DeleteHistory,
    DeleteEntriesByChat,
}

impl MessageType {
    #[must_use]
    pub fn is_control(self) -> bool {
        matches!(self, Self::DeleteHistory | Self::DeleteEntriesByChat)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::DeleteHistory => "delete_history",
            Self::DeleteEntriesByChat => "delete_entries_by_chat",
        }
    }
}

/// Primary payload of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestData {
    Text(String),
    Content(ContentItem),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSettings {
    /// Model profile id the user picked; absent means orchestrator default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Normalized request handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRequest {
    pub chat_id: String,
    pub sender_id: String,
    pub sender_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub language_code: String,
    pub timestamp: i64,
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RequestData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub control: bool,
    pub settings: RequestSettings,
}

/// Orchestrator reply. An empty `message` means nothing is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundResponse {
    #[serde(default, deserialize_with = "string_or_number")]
    pub chat_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl OutboundResponse {
    #[must_use]
    pub fn has_message(&self) -> bool {
        !self.message.trim().is_empty()
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Int(i64),
    }
    Ok(match Option::<Id>::deserialize(de)? {
        Some(Id::Str(s)) => s,
        Some(Id::Int(n)) => n.to_string(),
        None => String::new(),
    })
}

/// The external engine that produces replies.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// `Ok(None)` for fire-and-forget requests.
    async fn invoke(&self, request: OutboundRequest) -> anyhow::Result<Option<OutboundResponse>>;
}

/// POSTs each request as JSON and parses the reply body.
pub struct HttpOrchestrator {
    client: reqwest::Client,
    url: String,
}

impl HttpOrchestrator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Orchestrator for HttpOrchestrator {
    async fn invoke(&self, request: OutboundRequest) -> anyhow::Result<Option<OutboundResponse>> {
        let resp = self.client.post(&self.url).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("orchestrator returned HTTP {status}");
        }
        let body = resp.bytes().await?;
        debug!(
            message_type = request.message_type.as_str(),
            bytes = body.len(),
            "orchestrator replied"
        );
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }
}

/// Replies `Echo: <text>` to text requests; stand-in for local development.
#[derive(Debug, Default)]
pub struct EchoOrchestrator;

#[async_trait]
impl Orchestrator for EchoOrchestrator {
    async fn invoke(&self, request: OutboundRequest) -> anyhow::Result<Option<OutboundResponse>> {
        let message = match (&request.message_type, &request.data) {
            (t, _) if t.is_control() => return Ok(None),
            (_, Some(RequestData::Text(text))) => format!("Echo: {text}"),
            (_, Some(RequestData::Content(item))) => match &item.caption {
                Some(caption) => format!("Echo: received {} ({caption})", item.kind),
                None => format!("Echo: received {}", item.kind),
            },
            (_, None) => return Ok(None),
        };
        Ok(Some(OutboundResponse {
            chat_id: request.chat_id,
            message,
            status: "ok".into(),
        }))
    }
}
