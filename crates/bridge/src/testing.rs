//! Recording test doubles shared by the unit tests.

use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    courier_channels::{
        Command, CommandEvent, DocumentEvent, FetchMode, Fetched, FileRef, ImageEvent,
        InboundDescriptor, InboundEvent, OutboundMessage, Sender, TextEvent, Transport,
    },
    tokio::sync::Notify,
};

use crate::{
    issues::{IssueRecord, IssueSink},
    orchestrator::{Orchestrator, OutboundRequest, OutboundResponse},
};

pub fn sender(user_id: &str) -> Sender {
    Sender {
        id: user_id.to_string(),
        username: Some("alice".into()),
        first_name: Some("Alice".into()),
        last_name: None,
        language_code: Some("en".into()),
    }
}

pub fn event(user_id: &str, event: InboundEvent) -> InboundDescriptor {
    InboundDescriptor {
        chat_id: user_id.to_string(),
        sender: sender(user_id),
        timestamp: 1_700_000_000,
        event,
    }
}

pub fn text_event(user_id: &str, text: &str) -> InboundDescriptor {
    event(user_id, InboundEvent::Text(TextEvent { text: text.into() }))
}

pub fn start_event(user_id: &str) -> InboundDescriptor {
    event(
        user_id,
        InboundEvent::Command(CommandEvent {
            command: Command::Start,
        }),
    )
}

pub fn image_event(user_id: &str, caption: Option<&str>) -> InboundDescriptor {
    event(
        user_id,
        InboundEvent::Image(ImageEvent {
            file: FileRef::new("photo-1"),
            mime_type: None,
            caption: caption.map(Into::into),
        }),
    )
}

pub fn document_event(user_id: &str, mime: &str, name: &str) -> InboundDescriptor {
    event(
        user_id,
        InboundEvent::Document(DocumentEvent {
            file: FileRef::new("doc-1"),
            mime_type: Some(mime.into()),
            file_name: Some(name.into()),
            caption: None,
        }),
    )
}

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(String, OutboundMessage)>>,
    pub typing: Mutex<Vec<String>>,
    pub fetches: Mutex<Vec<(FileRef, FetchMode)>>,
    pub fail_fetch: bool,
    /// Sends whose text starts with this prefix fail.
    pub reject_prefix: Option<&'static str>,
}

impl RecordingTransport {
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, m)| m.text.clone())
            .collect()
    }

    pub fn last(&self) -> Option<OutboundMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .map(|(_, m)| m.clone())
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, chat_id: &str, message: &OutboundMessage) -> courier_channels::Result<()> {
        if self
            .reject_prefix
            .is_some_and(|prefix| message.text.starts_with(prefix))
        {
            return Err(courier_channels::Error::unavailable("send rejected"));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((chat_id.to_string(), message.clone()));
        Ok(())
    }

    async fn send_typing(&self, chat_id: &str) -> courier_channels::Result<()> {
        self.typing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(chat_id.to_string());
        Ok(())
    }

    async fn fetch_attachment(
        &self,
        file: &FileRef,
        mode: FetchMode,
    ) -> courier_channels::Result<Fetched> {
        self.fetches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((file.clone(), mode));
        if self.fail_fetch {
            return Err(courier_channels::Error::unavailable("file expired"));
        }
        Ok(match mode {
            FetchMode::Bytes => Fetched::Bytes(b"file-bytes".to_vec()),
            FetchMode::Link => Fetched::Link(format!("https://files.test/{}", file.as_str())),
        })
    }
}

enum Reply {
    Text(String),
    Echo,
    Fail,
    Stall,
}

/// Orchestrator double that records requests and tracks overlap.
pub struct ScriptedOrchestrator {
    reply: Reply,
    delay: Option<Duration>,
    requests: Mutex<Vec<OutboundRequest>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    /// Notified once per completed call.
    pub completed: Notify,
}

impl ScriptedOrchestrator {
    fn with(reply: Reply) -> Self {
        Self {
            reply,
            delay: None,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            completed: Notify::new(),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with(Reply::Text(text.to_string()))
    }

    /// Replies `echo:<text>` to text requests.
    pub fn echo() -> Self {
        Self::with(Reply::Echo)
    }

    pub fn failing() -> Self {
        Self::with(Reply::Fail)
    }

    pub fn stalling() -> Self {
        Self::with(Reply::Stall)
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Orchestrator for ScriptedOrchestrator {
    async fn invoke(&self, request: OutboundRequest) -> anyhow::Result<Option<OutboundResponse>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = match &self.reply {
            Reply::Text(text) => Ok(Some(OutboundResponse {
                chat_id: request.chat_id.clone(),
                message: text.clone(),
                status: "ok".into(),
            })),
            Reply::Echo => Ok(match &request.data {
                Some(crate::orchestrator::RequestData::Text(t)) => Some(OutboundResponse {
                    chat_id: request.chat_id.clone(),
                    message: format!("echo:{t}"),
                    status: "ok".into(),
                }),
                _ => None,
            }),
            Reply::Fail => Err(anyhow::anyhow!("engine exploded")),
            Reply::Stall => {
                tokio::time::sleep(Duration::from_secs(86_400)).await;
                Ok(None)
            },
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.notify_one();
        result
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub records: Mutex<Vec<IssueRecord>>,
}

#[async_trait]
impl IssueSink for RecordingSink {
    async fn append_record(&self, record: &IssueRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}
