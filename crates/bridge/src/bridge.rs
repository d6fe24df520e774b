//! Orchestrator round trip under a failure boundary.

use std::{sync::Arc, time::Duration};

use {
    courier_channels::{InboundDescriptor, OutboundMessage, ReplyMarkup, Transport},
    courier_sessions::{Role, Session},
    tracing::{debug, error, warn},
};

#[cfg(feature = "metrics")]
use {
    courier_metrics::{counter, histogram, labels, orchestrator as metrics_orchestrator},
    std::time::Instant,
};

use crate::{
    catalog::{MessageCatalog, MessageKey},
    error::{Error, Result},
    orchestrator::{
        MessageType, Orchestrator, OutboundRequest, OutboundResponse, RequestData,
        RequestSettings,
    },
};

/// What one forwarded turn carries.
#[derive(Debug, Clone)]
pub enum Turn {
    /// User content: text or a resolved attachment.
    Content {
        message_type: MessageType,
        data: RequestData,
    },
    /// History deletion; never produces a visible reply or error.
    Control(MessageType),
}

impl Turn {
    fn message_type(&self) -> MessageType {
        match self {
            Self::Content { message_type, .. } | Self::Control(message_type) => *message_type,
        }
    }

    fn is_control(&self) -> bool {
        matches!(self, Self::Control(_))
    }
}

pub struct RequestBridge {
    orchestrator: Arc<dyn Orchestrator>,
    transport: Arc<dyn Transport>,
    catalog: Arc<dyn MessageCatalog>,
    timeout: Duration,
    max_transcript: usize,
    menu: ReplyMarkup,
}

impl RequestBridge {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        transport: Arc<dyn Transport>,
        catalog: Arc<dyn MessageCatalog>,
        timeout: Duration,
        max_transcript: usize,
        menu: ReplyMarkup,
    ) -> Self {
        Self {
            orchestrator,
            transport,
            catalog,
            timeout,
            max_transcript,
            menu,
        }
    }

    /// Build the request for `turn` from the session and inbound metadata.
    #[must_use]
    pub fn build_request(
        &self,
        session: &Session,
        inbound: &InboundDescriptor,
        turn: &Turn,
    ) -> OutboundRequest {
        let (data, description) = match turn {
            Turn::Content { data, .. } => (Some(data.clone()), session.context.clone()),
            Turn::Control(_) => (None, None),
        };
        OutboundRequest {
            chat_id: inbound.chat_id.clone(),
            sender_id: inbound.sender.id.clone(),
            sender_name: inbound.sender.display_name(),
            username: inbound.sender.username.clone(),
            language_code: inbound.sender.language().to_string(),
            timestamp: inbound.timestamp,
            message_type: turn.message_type(),
            data,
            description,
            control: turn.is_control(),
            settings: RequestSettings {
                model: session.selected_model.clone(),
            },
        }
    }

    /// Invoke the orchestrator once and relay its reply.
    ///
    /// Content replies are sent and recorded in the transcript; control
    /// replies are discarded. Failures send the localized error for content
    /// turns only.
    pub async fn forward(
        &self,
        session: &mut Session,
        inbound: &InboundDescriptor,
        turn: Turn,
    ) -> Option<OutboundResponse> {
        let request = self.build_request(session, inbound, &turn);
        let message_type = request.message_type;

        match self.invoke(request).await {
            Ok(Some(response)) if !turn.is_control() => {
                if response.has_message() {
                    let reply = OutboundMessage::text(&response.message).with_markup(self.menu.clone());
                    if let Err(e) = self.transport.send(&inbound.chat_id, &reply).await {
                        warn!(chat_id = %inbound.chat_id, error = %e, "failed to deliver reply");
                    }
                    session.push_transcript(Role::Assistant, &response.message, self.max_transcript);
                } else {
                    debug!(chat_id = %inbound.chat_id, "orchestrator returned an empty message");
                }
                Some(response)
            },
            Ok(response) => response,
            Err(e) => {
                error!(
                    user_id = %inbound.sender.id,
                    message_type = message_type.as_str(),
                    error = %e,
                    "orchestrator call failed"
                );
                #[cfg(feature = "metrics")]
                counter!(metrics_orchestrator::FAILURES_TOTAL, labels::KIND => message_type.as_str())
                    .increment(1);
                if !turn.is_control() {
                    let text = self
                        .catalog
                        .get_message(MessageKey::Error, inbound.sender.language());
                    let notice = OutboundMessage::text(text).with_markup(self.menu.clone());
                    match self.transport.send(&inbound.chat_id, &notice).await {
                        Ok(()) => {
                            session.push_transcript(Role::Assistant, &notice.text, self.max_transcript);
                        },
                        Err(e) => {
                            warn!(chat_id = %inbound.chat_id, error = %e, "failed to deliver error notice");
                        },
                    }
                }
                None
            },
        }
    }

    async fn invoke(&self, request: OutboundRequest) -> Result<Option<OutboundResponse>> {
        #[cfg(feature = "metrics")]
        let started = Instant::now();
        #[cfg(feature = "metrics")]
        counter!(metrics_orchestrator::CALLS_TOTAL, labels::KIND => request.message_type.as_str())
            .increment(1);

        let result = match tokio::time::timeout(self.timeout, self.orchestrator.invoke(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(Error::OrchestratorCallFailed(e)),
            Err(_) => Err(Error::OrchestratorTimeout {
                secs: self.timeout.as_secs(),
            }),
        };

        #[cfg(feature = "metrics")]
        histogram!(metrics_orchestrator::CALL_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        result
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{catalog::BuiltinCatalog, testing::*},
    };

    fn bridge(orchestrator: Arc<dyn Orchestrator>, transport: Arc<RecordingTransport>) -> RequestBridge {
        RequestBridge::new(
            orchestrator,
            transport,
            Arc::new(BuiltinCatalog::new()),
            Duration::from_secs(5),
            50,
            ReplyMarkup::None,
        )
    }

    fn active_session() -> Session {
        let mut s = Session::new("42");
        s.activate("We sell coffee, open 8-18");
        s.selected_model = Some("sonnet".into());
        s
    }

    fn text_turn(text: &str) -> Turn {
        Turn::Content {
            message_type: MessageType::Text,
            data: RequestData::Text(text.into()),
        }
    }

    #[tokio::test]
    async fn request_carries_context_model_and_sender() {
        let orch = Arc::new(ScriptedOrchestrator::replying("hi"));
        let transport = Arc::new(RecordingTransport::default());
        let b = bridge(orch.clone(), transport);
        let inbound = text_event("42", "hello");

        let mut session = active_session();
        b.forward(&mut session, &inbound, text_turn("hello")).await;

        let requests = orch.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.description.as_deref(), Some("We sell coffee, open 8-18"));
        assert_eq!(req.settings.model.as_deref(), Some("sonnet"));
        assert_eq!(req.sender_name, "Alice");
        assert!(!req.control);
    }

    #[tokio::test]
    async fn reply_is_sent_and_recorded() {
        let orch = Arc::new(ScriptedOrchestrator::replying("We open at 8"));
        let transport = Arc::new(RecordingTransport::default());
        let b = bridge(orch, transport.clone());
        let mut session = active_session();

        let resp = b
            .forward(&mut session, &text_event("42", "when?"), text_turn("when?"))
            .await;
        assert_eq!(resp.map(|r| r.message).as_deref(), Some("We open at 8"));
        assert_eq!(transport.texts(), vec!["We open at 8".to_string()]);
        assert_eq!(session.transcript.last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn empty_reply_sends_nothing() {
        let orch = Arc::new(ScriptedOrchestrator::replying(""));
        let transport = Arc::new(RecordingTransport::default());
        let b = bridge(orch, transport.clone());
        let mut session = active_session();
        b.forward(&mut session, &text_event("42", "x"), text_turn("x"))
            .await;
        assert!(transport.texts().is_empty());
        assert!(session.transcript.is_empty());
    }

    #[tokio::test]
    async fn failure_sends_one_error_for_content_and_nothing_for_control() {
        let orch = Arc::new(ScriptedOrchestrator::failing());
        let transport = Arc::new(RecordingTransport::default());
        let b = bridge(orch, transport.clone());
        let mut session = active_session();
        let inbound = text_event("42", "x");

        assert!(b.forward(&mut session, &inbound, text_turn("x")).await.is_none());
        assert_eq!(transport.texts().len(), 1);
        assert!(transport.texts()[0].starts_with("I apologize"));
        assert!(session.transcript.last().unwrap().text.starts_with("I apologize"));

        b.forward(&mut session, &inbound, Turn::Control(MessageType::DeleteHistory))
            .await;
        assert_eq!(transport.texts().len(), 1);
    }

    #[tokio::test]
    async fn control_reply_is_discarded() {
        let orch = Arc::new(ScriptedOrchestrator::replying("history deleted"));
        let transport = Arc::new(RecordingTransport::default());
        let b = bridge(orch.clone(), transport.clone());
        let mut session = active_session();
        b.forward(
            &mut session,
            &text_event("42", "/start"),
            Turn::Control(MessageType::DeleteHistory),
        )
        .await;
        assert!(transport.texts().is_empty());
        let req = &orch.requests()[0];
        assert!(req.control);
        assert!(req.data.is_none());
        assert!(req.description.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_counts_as_failure() {
        let orch = Arc::new(ScriptedOrchestrator::stalling());
        let transport = Arc::new(RecordingTransport::default());
        let b = bridge(orch, transport.clone());
        let mut session = active_session();
        assert!(
            b.forward(&mut session, &text_event("42", "x"), text_turn("x"))
                .await
                .is_none()
        );
        assert_eq!(transport.texts().len(), 1);
    }
}
