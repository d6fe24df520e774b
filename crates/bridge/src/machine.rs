//! Session state machine: one inbound event in, state transition and side
//! effects out.

use std::{sync::Arc, time::Duration};

use {
    courier_channels::{
        AttachmentDescriptor, Command, ContentKind, InboundDescriptor, InboundEvent,
        OutboundMessage, ReplyMarkup, Transport,
    },
    courier_media::ContentResolver,
    courier_sessions::{Role, Session, SessionStore},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use courier_metrics::{counter, inbound as metrics_inbound, labels};

use crate::{
    bridge::{RequestBridge, Turn},
    catalog::{MessageCatalog, MessageKey},
    error::{Error, Result},
    interface::{BotInterface, MenuCommand},
    issues::{IssueReporter, IssueSink},
    models::ModelCatalog,
    orchestrator::{MessageType, Orchestrator, RequestData},
};

/// Everything the state machine talks to.
pub struct MachineDeps {
    pub transport: Arc<dyn Transport>,
    pub store: Arc<dyn SessionStore>,
    pub orchestrator: Arc<dyn Orchestrator>,
    pub resolver: Arc<ContentResolver>,
    pub issue_sink: Arc<dyn IssueSink>,
    pub catalog: Arc<dyn MessageCatalog>,
    pub interface: BotInterface,
    pub models: ModelCatalog,
    pub orchestrator_timeout: Duration,
    pub retain_model_on_reset: bool,
    pub max_transcript_entries: usize,
}

pub struct SessionMachine {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    resolver: Arc<ContentResolver>,
    catalog: Arc<dyn MessageCatalog>,
    bridge: RequestBridge,
    reporter: IssueReporter,
    interface: BotInterface,
    models: ModelCatalog,
    retain_model_on_reset: bool,
    max_transcript: usize,
}

impl SessionMachine {
    pub fn new(deps: MachineDeps) -> Self {
        let bridge = RequestBridge::new(
            deps.orchestrator,
            Arc::clone(&deps.transport),
            Arc::clone(&deps.catalog),
            deps.orchestrator_timeout,
            deps.max_transcript_entries,
            deps.interface.main_menu(),
        );
        Self {
            transport: deps.transport,
            store: deps.store,
            resolver: deps.resolver,
            catalog: deps.catalog,
            bridge,
            reporter: IssueReporter::new(deps.issue_sink),
            interface: deps.interface,
            models: deps.models,
            retain_model_on_reset: deps.retain_model_on_reset,
            max_transcript: deps.max_transcript_entries,
        }
    }

    #[must_use]
    pub fn interface(&self) -> &BotInterface {
        &self.interface
    }

    /// Process one event for its user. Callers must not run two events of the
    /// same user concurrently.
    ///
    /// A failed non-command turn is answered with the localized error message
    /// and reported as `Ok`. A write-back failure after a successful
    /// transition is returned without an extra reply.
    pub async fn handle(&self, inbound: &InboundDescriptor) -> Result<()> {
        let mut session = match self.store.get(inbound.user_id()).await {
            Ok(session) => session,
            Err(e) => return self.fail_turn(inbound, e.into()).await,
        };
        let outcome = self.transition(&mut session, inbound).await;
        debug_assert!(session.is_consistent(), "reporting outside active state");
        let saved = self.store.set(&session).await;
        match outcome {
            Ok(()) => Ok(saved?),
            Err(e) => {
                if let Err(save_err) = saved {
                    warn!(user_id = %session.user_id, error = %save_err, "session write-back failed");
                }
                self.fail_turn(inbound, e).await
            },
        }
    }

    async fn fail_turn(&self, inbound: &InboundDescriptor, error: Error) -> Result<()> {
        if matches!(inbound.event, InboundEvent::Command(_)) {
            return Err(error);
        }
        warn!(user_id = %inbound.user_id(), error = %error, "turn failed, sending error reply");
        let text = self
            .catalog
            .get_message(MessageKey::Error, inbound.sender.language());
        let message = OutboundMessage::text(text).with_markup(self.interface.main_menu());
        if let Err(e) = self.transport.send(&inbound.chat_id, &message).await {
            warn!(chat_id = %inbound.chat_id, error = %e, "error reply failed");
        }
        Ok(())
    }

    async fn transition(&self, session: &mut Session, inbound: &InboundDescriptor) -> Result<()> {
        match &inbound.event {
            InboundEvent::Command(cmd) => match cmd.command {
                Command::Start => self.start(session, inbound).await,
                Command::DeleteAllHistory => {
                    self.bridge
                        .forward(session, inbound, Turn::Control(MessageType::DeleteEntriesByChat))
                        .await;
                    session.transcript.clear();
                    Ok(())
                },
            },
            InboundEvent::ModelSelected(selection) => {
                self.select_model(session, inbound, &selection.model_id).await
            },
            InboundEvent::Text(t)
                if self.interface.match_command(&t.text) == Some(MenuCommand::StartNewChat) =>
            {
                self.start(session, inbound).await
            },
            event if !session.is_active() => match event {
                InboundEvent::Text(t) => {
                    session.activate(t.text.clone());
                    session.push_transcript(Role::User, &t.text, self.max_transcript);
                    info!(user_id = %session.user_id, context_len = t.text.len(), "business context captured");
                    self.reply(session, inbound, MessageKey::DescriptionAccepted).await
                },
                _ => self.unsupported(session, inbound).await,
            },
            event if session.reporting => match event {
                InboundEvent::Text(t) => self.submit_report(session, inbound, &t.text).await,
                _ => self.unsupported(session, inbound).await,
            },
            InboundEvent::Text(t) => match self.interface.match_command(&t.text) {
                Some(MenuCommand::ReportIssue) => self.begin_report(session, inbound).await,
                Some(MenuCommand::SelectModel) => self.present_models(session, inbound).await,
                Some(MenuCommand::StartNewChat) | None => {
                    session.push_transcript(Role::User, &t.text, self.max_transcript);
                    self.typing(inbound).await;
                    let turn = Turn::Content {
                        message_type: MessageType::Text,
                        data: RequestData::Text(t.text.clone()),
                    };
                    self.bridge.forward(session, inbound, turn).await;
                    Ok(())
                },
            },
            InboundEvent::Unsupported(u) => {
                debug!(user_id = %session.user_id, media = %u.media, "unsupported media");
                self.unsupported(session, inbound).await
            },
            InboundEvent::Image(_) | InboundEvent::Document(_) | InboundEvent::Audio(_) => {
                match inbound.event.attachment() {
                    Some(attachment) => self.forward_attachment(session, inbound, attachment).await,
                    None => self.unsupported(session, inbound).await,
                }
            },
        }
    }

    /// Reset to `AwaitingContext`, drop orchestrator history, greet.
    async fn start(&self, session: &mut Session, inbound: &InboundDescriptor) -> Result<()> {
        session.reset(self.retain_model_on_reset);
        self.bridge
            .forward(session, inbound, Turn::Control(MessageType::DeleteHistory))
            .await;

        let mut welcome = match self.interface.title() {
            Some(title) => title.to_string(),
            None => self
                .catalog
                .get_message(MessageKey::Welcome, inbound.sender.language()),
        };
        if self.interface.shows_model_selector() {
            let name = self.models.display_name(session.selected_model.as_deref());
            welcome.push_str(&format!("\n\n🤖 Model: {name}"));
        }
        self.send(session, inbound, welcome, self.interface.main_menu())
            .await
    }

    async fn begin_report(&self, session: &mut Session, inbound: &InboundDescriptor) -> Result<()> {
        session.begin_reporting()?;
        let prompt = self
            .catalog
            .get_message(MessageKey::ReportPrompt, inbound.sender.language());
        self.send(session, inbound, prompt, self.interface.main_menu())
            .await
    }

    /// Hand the report off, confirm, then start over.
    async fn submit_report(
        &self,
        session: &mut Session,
        inbound: &InboundDescriptor,
        description: &str,
    ) -> Result<()> {
        let model_info = self.models.info(session.selected_model.as_deref());
        self.reporter
            .submit(&session.user_id, description, &session.transcript, &model_info)
            .await;
        session.reporting = false;
        if let Err(e) = self.reply(session, inbound, MessageKey::ReportThanks).await {
            warn!(user_id = %session.user_id, error = %e, "report confirmation failed");
        }
        self.start(session, inbound).await
    }

    async fn present_models(
        &self,
        session: &mut Session,
        inbound: &InboundDescriptor,
    ) -> Result<()> {
        let current = self.models.current_name(session.selected_model.as_deref());
        let prompt = self
            .catalog
            .get_message(MessageKey::SelectModel, inbound.sender.language())
            .replace("{model}", &current);
        let choices = ReplyMarkup::Choices(self.models.choices());
        self.send(session, inbound, prompt, choices).await
    }

    async fn select_model(
        &self,
        session: &mut Session,
        inbound: &InboundDescriptor,
        model_id: &str,
    ) -> Result<()> {
        if !self.interface.shows_model_selector() {
            debug!(user_id = %session.user_id, "model selection ignored, selector disabled");
            return Ok(());
        }
        let Some(profile) = self.models.get(model_id) else {
            warn!(user_id = %session.user_id, model_id, "selection of unknown model ignored");
            return Ok(());
        };
        let name = profile.name.clone();
        session.selected_model = Some(profile.id.clone());
        info!(user_id = %session.user_id, model_id, "model selected");
        let ack = self
            .catalog
            .get_message(MessageKey::ModelChanged, inbound.sender.language())
            .replace("{model}", &name);
        self.send(session, inbound, ack, self.interface.main_menu())
            .await
    }

    async fn forward_attachment(
        &self,
        session: &mut Session,
        inbound: &InboundDescriptor,
        attachment: AttachmentDescriptor,
    ) -> Result<()> {
        if !self.interface.accepts(attachment.kind) {
            return self.unsupported(session, inbound).await;
        }
        self.typing(inbound).await;

        let item = match self.resolver.resolve(&attachment, &inbound.chat_id).await {
            Ok(item) => item,
            Err(e) if e.is_unsupported() => {
                debug!(user_id = %session.user_id, error = %e, "attachment rejected");
                return self.unsupported(session, inbound).await;
            },
            Err(e) => {
                // The turn is dropped without telling the user.
                warn!(user_id = %session.user_id, kind = %attachment.kind, error = %e, "attachment fetch failed");
                return Ok(());
            },
        };

        session.push_transcript(Role::User, transcript_placeholder(&attachment), self.max_transcript);
        let turn = Turn::Content {
            message_type: message_type_for(attachment.kind),
            data: RequestData::Content(item),
        };
        self.bridge.forward(session, inbound, turn).await;
        Ok(())
    }

    async fn unsupported(&self, session: &mut Session, inbound: &InboundDescriptor) -> Result<()> {
        #[cfg(feature = "metrics")]
        counter!(metrics_inbound::UNSUPPORTED_TOTAL, labels::KIND => event_label(&inbound.event))
            .increment(1);
        self.reply(session, inbound, MessageKey::UnsupportedContent)
            .await
    }

    async fn reply(
        &self,
        session: &mut Session,
        inbound: &InboundDescriptor,
        key: MessageKey,
    ) -> Result<()> {
        let text = self.catalog.get_message(key, inbound.sender.language());
        self.send(session, inbound, text, self.interface.main_menu())
            .await
    }

    /// Send and record the text as an assistant transcript entry.
    async fn send(
        &self,
        session: &mut Session,
        inbound: &InboundDescriptor,
        text: String,
        markup: ReplyMarkup,
    ) -> Result<()> {
        let message = OutboundMessage::text(text).with_markup(markup);
        self.transport.send(&inbound.chat_id, &message).await?;
        session.push_transcript(Role::Assistant, &message.text, self.max_transcript);
        Ok(())
    }

    async fn typing(&self, inbound: &InboundDescriptor) {
        if let Err(e) = self.transport.send_typing(&inbound.chat_id).await {
            debug!(chat_id = %inbound.chat_id, error = %e, "typing indicator failed");
        }
    }
}

fn message_type_for(kind: ContentKind) -> MessageType {
    match kind {
        ContentKind::Text => MessageType::Text,
        ContentKind::Image => MessageType::Image,
        ContentKind::Document => MessageType::Document,
        ContentKind::Audio => MessageType::Audio,
    }
}

/// Transcript text for an attachment turn.
fn transcript_placeholder(attachment: &AttachmentDescriptor) -> String {
    if let Some(caption) = attachment.caption.as_deref().filter(|c| !c.is_empty()) {
        return caption.to_string();
    }
    match attachment.kind {
        ContentKind::Image => "Image sent".to_string(),
        ContentKind::Document => format!(
            "Document sent: {}",
            attachment.file_name.as_deref().unwrap_or("document")
        ),
        ContentKind::Audio => "Audio message sent".to_string(),
        ContentKind::Text => String::new(),
    }
}

#[cfg(feature = "metrics")]
fn event_label(event: &InboundEvent) -> &'static str {
    match event {
        InboundEvent::Text(_) => "text",
        InboundEvent::Image(_) => "image",
        InboundEvent::Document(_) => "document",
        InboundEvent::Audio(_) => "audio",
        InboundEvent::Command(_) => "command",
        InboundEvent::ModelSelected(_) => "model_selected",
        InboundEvent::Unsupported(_) => "unsupported",
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            catalog::BuiltinCatalog,
            interface::{REPORT_ISSUE, SELECT_MODEL, START_NEW_CHAT},
            testing::*,
        },
        courier_channels::{InboundEvent, ModelSelection, Payload, UnsupportedEvent},
        courier_config::ModelProfile,
        courier_media::StrategyConfig,
        courier_sessions::{MemorySessionStore, SessionState},
    };

    struct Harness {
        machine: SessionMachine,
        transport: Arc<RecordingTransport>,
        orchestrator: Arc<ScriptedOrchestrator>,
        store: Arc<MemorySessionStore>,
        sink: Arc<RecordingSink>,
    }

    impl Harness {
        fn build(
            orchestrator: ScriptedOrchestrator,
            interface: BotInterface,
            transport: RecordingTransport,
        ) -> Self {
            let transport = Arc::new(transport);
            let orchestrator = Arc::new(orchestrator);
            let store = Arc::new(MemorySessionStore::new());
            let sink = Arc::new(RecordingSink::default());
            let resolver = Arc::new(ContentResolver::new(
                transport.clone(),
                None,
                StrategyConfig::default(),
            ));
            let machine = SessionMachine::new(MachineDeps {
                transport: transport.clone(),
                store: store.clone(),
                orchestrator: orchestrator.clone(),
                resolver,
                issue_sink: sink.clone(),
                catalog: Arc::new(BuiltinCatalog::new()),
                interface,
                models: ModelCatalog::new(
                    vec![ModelProfile {
                        id: "sonnet".into(),
                        name: "Claude Sonnet".into(),
                        provider: Some("anthropic".into()),
                    }],
                    None,
                ),
                orchestrator_timeout: Duration::from_secs(5),
                retain_model_on_reset: true,
                max_transcript_entries: 100,
            });
            Self {
                machine,
                transport,
                orchestrator,
                store,
                sink,
            }
        }

        fn tester(orchestrator: ScriptedOrchestrator) -> Self {
            Self::build(
                orchestrator,
                BotInterface::Tester {
                    show_model_selector: true,
                    title: None,
                },
                RecordingTransport::default(),
            )
        }

        async fn send(&self, inbound: InboundDescriptor) {
            self.machine.handle(&inbound).await.unwrap();
            let session = self.store.get(inbound.user_id()).await.unwrap();
            assert!(session.is_consistent());
        }

        async fn session(&self, user: &str) -> Session {
            self.store.get(user).await.unwrap()
        }

        async fn activate(&self, user: &str) {
            self.send(start_event(user)).await;
            self.send(text_event(user, "We sell coffee, open 8-18")).await;
        }
    }

    #[tokio::test]
    async fn start_then_context_activates_without_content_forward() {
        let h = Harness::tester(ScriptedOrchestrator::replying("should not be sent"));
        h.activate("42").await;

        let session = h.session("42").await;
        assert_eq!(session.state, SessionState::Active);
        assert_eq!(session.context.as_deref(), Some("We sell coffee, open 8-18"));

        // only the history deletion control request reached the orchestrator
        let requests = h.orchestrator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message_type, MessageType::DeleteHistory);
        assert!(requests[0].control);

        let texts = h.transport.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("👋 Welcome!"));
        assert!(texts[0].ends_with("🤖 Model: Unknown"));
        assert!(texts[1].starts_with("✨ Perfect!"));
    }

    #[tokio::test]
    async fn start_from_any_state_resets() {
        let h = Harness::tester(ScriptedOrchestrator::echo());
        h.activate("42").await;
        h.send(text_event("42", "hello")).await;
        h.send(text_event("42", REPORT_ISSUE)).await;
        assert!(h.session("42").await.reporting);

        h.send(text_event("42", START_NEW_CHAT)).await;
        let session = h.session("42").await;
        assert_eq!(session.state, SessionState::AwaitingContext);
        // only the fresh welcome survives the reset
        assert_eq!(session.transcript.len(), 1);
        assert!(session.transcript[0].text.starts_with("👋 Welcome!"));
        assert!(!session.reporting);
        assert!(h.sink.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn active_text_is_forwarded_and_reply_recorded() {
        let h = Harness::tester(ScriptedOrchestrator::echo());
        h.activate("42").await;
        h.send(text_event("42", "do you have oat milk?")).await;

        let requests = h.orchestrator.requests();
        let req = requests.last().unwrap();
        assert_eq!(req.message_type, MessageType::Text);
        assert_eq!(req.description.as_deref(), Some("We sell coffee, open 8-18"));
        assert_eq!(h.transport.last().unwrap().text, "echo:do you have oat milk?");
        assert_eq!(h.transport.typing.lock().unwrap().len(), 1);

        let session = h.session("42").await;
        let roles: Vec<_> = session.transcript.iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant
        ]);
    }

    #[tokio::test]
    async fn non_text_while_awaiting_context_is_unsupported() {
        let h = Harness::tester(ScriptedOrchestrator::echo());
        h.send(start_event("42")).await;
        h.send(image_event("42", None)).await;

        assert_eq!(h.session("42").await.state, SessionState::AwaitingContext);
        assert!(h.transport.last().unwrap().text.starts_with("I can only process text"));
        assert_eq!(h.transport.fetch_count(), 0);
    }

    #[tokio::test]
    async fn report_flow_submits_then_resets() {
        let h = Harness::tester(ScriptedOrchestrator::echo());
        h.activate("42").await;
        h.send(text_event("42", "hi")).await;
        h.send(text_event("42", REPORT_ISSUE)).await;
        assert_eq!(
            h.transport.last().unwrap().text,
            "Please describe the issue: "
        );

        h.send(text_event("42", "the bot repeats itself")).await;

        let records = h.sink.records.lock().unwrap().clone();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "the bot repeats itself");
        let catalog = BuiltinCatalog::new();
        let welcome = catalog.get_message(MessageKey::Welcome, "en");
        let accepted = catalog.get_message(MessageKey::DescriptionAccepted, "en");
        assert_eq!(
            records[0].transcript,
            format!(
                "AI: {welcome}\n\n🤖 Model: Unknown\nUser: We sell coffee, open 8-18\nAI: {accepted}\nUser: hi\nAI: echo:hi\nAI: Please describe the issue: "
            )
        );
        assert_eq!(records[0].model_info, "source: unknown");

        let session = h.session("42").await;
        assert_eq!(session.state, SessionState::AwaitingContext);
        assert_eq!(session.transcript.len(), 1);
        assert!(!session.reporting);

        let texts = h.transport.texts();
        let n = texts.len();
        assert_eq!(texts[n - 2], "Thank you for reporting the issue, starting new chat...");
        assert!(texts[n - 1].starts_with("👋 Welcome!"));
        // the description was never forwarded as content
        assert!(
            !h.orchestrator
                .requests()
                .iter()
                .any(|r| r.data == Some(RequestData::Text("the bot repeats itself".into())))
        );
    }

    #[tokio::test]
    async fn failed_confirmation_still_starts_fresh_session() {
        let h = Harness::build(
            ScriptedOrchestrator::echo(),
            BotInterface::Tester {
                show_model_selector: false,
                title: None,
            },
            RecordingTransport {
                reject_prefix: Some("Thank you"),
                ..Default::default()
            },
        );
        h.activate("42").await;
        h.send(text_event("42", REPORT_ISSUE)).await;
        h.send(text_event("42", "answers are too long")).await;

        assert_eq!(h.sink.records.lock().unwrap().len(), 1);
        let session = h.session("42").await;
        assert_eq!(session.state, SessionState::AwaitingContext);
        assert!(session.context.is_none());
        assert!(!session.reporting);
        assert_eq!(session.transcript.len(), 1);
        assert!(h.transport.last().unwrap().text.starts_with("👋 Welcome!"));
    }

    #[tokio::test]
    async fn bot_messages_are_recorded_in_transcript() {
        let h = Harness::tester(ScriptedOrchestrator::echo());
        h.activate("42").await;
        h.send(image_event("42", None)).await;
        h.send(event(
            "42",
            InboundEvent::Unsupported(UnsupportedEvent {
                media: "sticker".into(),
            }),
        ))
        .await;

        let session = h.session("42").await;
        let assistant: Vec<_> = session
            .transcript
            .iter()
            .filter(|e| e.role == Role::Assistant)
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(assistant.len(), 3);
        assert!(assistant[0].starts_with("👋 Welcome!"));
        assert!(assistant[1].starts_with("✨ Perfect!"));
        assert!(assistant[2].starts_with("I can only process text"));
    }

    /// Store whose reads fail, as a locked or corrupt database would.
    struct BrokenStore;

    #[async_trait::async_trait]
    impl SessionStore for BrokenStore {
        async fn get(&self, _user_id: &str) -> courier_sessions::Result<Session> {
            Err(courier_sessions::Error::message("database is locked"))
        }

        async fn set(&self, _session: &Session) -> courier_sessions::Result<()> {
            Ok(())
        }

        async fn clear(&self, _user_id: &str) -> courier_sessions::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn store_failure_answers_content_turn_with_error() {
        let transport = Arc::new(RecordingTransport::default());
        let mut machine = Harness::tester(ScriptedOrchestrator::echo()).machine;
        machine.store = Arc::new(BrokenStore);
        machine.transport = transport.clone();

        machine.handle(&text_event("42", "hello")).await.unwrap();
        let texts = transport.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("I apologize"));

        // commands keep surfacing the error to the caller
        assert!(machine.handle(&start_event("42")).await.is_err());
        assert_eq!(transport.texts().len(), 1);
    }

    #[tokio::test]
    async fn failed_send_answers_with_error() {
        let h = Harness::build(
            ScriptedOrchestrator::echo(),
            BotInterface::Tester {
                show_model_selector: false,
                title: None,
            },
            RecordingTransport {
                reject_prefix: Some("✨ Perfect!"),
                ..Default::default()
            },
        );
        h.send(start_event("42")).await;
        h.send(text_event("42", "We sell coffee")).await;

        let texts = h.transport.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[1].starts_with("I apologize"));
        // the context was still captured
        assert!(h.session("42").await.is_active());
    }

    #[tokio::test]
    async fn attachment_while_reporting_keeps_reporting() {
        let h = Harness::tester(ScriptedOrchestrator::echo());
        h.activate("42").await;
        h.send(text_event("42", REPORT_ISSUE)).await;
        h.send(image_event("42", None)).await;
        assert!(h.session("42").await.reporting);
        assert!(h.transport.last().unwrap().text.starts_with("I can only process text"));
    }

    #[tokio::test]
    async fn orchestrator_failure_is_visible_for_content_only() {
        let h = Harness::tester(ScriptedOrchestrator::failing());
        h.send(start_event("42")).await;
        // the failed control request produced only the welcome message
        assert_eq!(h.transport.texts().len(), 1);

        h.send(text_event("42", "context")).await;
        h.send(text_event("42", "question")).await;
        let texts = h.transport.texts();
        assert_eq!(texts.len(), 3);
        assert!(texts[2].starts_with("I apologize"));
    }

    #[tokio::test]
    async fn image_is_forwarded_as_link_with_placeholder() {
        let h = Harness::tester(ScriptedOrchestrator::replying("nice logo"));
        h.activate("42").await;
        h.send(image_event("42", None)).await;

        let req = h.orchestrator.requests().last().cloned().unwrap();
        assert_eq!(req.message_type, MessageType::Image);
        match req.data {
            Some(RequestData::Content(item)) => {
                assert_eq!(item.mime_type, "image/jpeg");
                assert!(matches!(item.payload, Payload::Url { .. }));
            },
            other => panic!("unexpected data: {other:?}"),
        }
        let session = h.session("42").await;
        assert!(session.transcript.iter().any(|e| e.text == "Image sent"));
    }

    #[tokio::test]
    async fn unlisted_document_is_unsupported_without_fetch() {
        let h = Harness::tester(ScriptedOrchestrator::echo());
        h.activate("42").await;
        let before = h.orchestrator.requests().len();
        h.send(document_event("42", "application/x-msdownload", "setup.exe"))
            .await;
        assert_eq!(h.transport.fetch_count(), 0);
        assert_eq!(h.orchestrator.requests().len(), before);
        assert!(h.transport.last().unwrap().text.starts_with("I can only process text"));
    }

    #[tokio::test]
    async fn fetch_failure_drops_turn_silently() {
        let h = Harness::build(
            ScriptedOrchestrator::echo(),
            BotInterface::Tester {
                show_model_selector: false,
                title: None,
            },
            RecordingTransport {
                fail_fetch: true,
                ..Default::default()
            },
        );
        h.activate("42").await;
        let sent_before = h.transport.texts().len();
        let requests_before = h.orchestrator.requests().len();
        h.send(document_event("42", "application/pdf", "menu.pdf")).await;
        assert_eq!(h.transport.texts().len(), sent_before);
        assert_eq!(h.orchestrator.requests().len(), requests_before);
    }

    #[tokio::test]
    async fn showcase_treats_attachments_as_unsupported() {
        let h = Harness::build(
            ScriptedOrchestrator::echo(),
            BotInterface::Showcase {
                title: Some("Coffee demo".into()),
            },
            RecordingTransport::default(),
        );
        h.send(start_event("42")).await;
        assert_eq!(h.transport.texts()[0], "Coffee demo");
        h.send(text_event("42", "context")).await;
        h.send(image_event("42", Some("logo"))).await;
        assert_eq!(h.transport.fetch_count(), 0);
        // report button is plain text in showcase and goes to the orchestrator
        h.send(text_event("42", REPORT_ISSUE)).await;
        assert!(!h.session("42").await.reporting);
        assert_eq!(h.transport.last().unwrap().text, format!("echo:{REPORT_ISSUE}"));
    }

    #[tokio::test]
    async fn model_selection_flow() {
        let h = Harness::tester(ScriptedOrchestrator::echo());
        h.activate("42").await;
        h.send(text_event("42", SELECT_MODEL)).await;
        let prompt = h.transport.last().unwrap();
        assert!(prompt.text.starts_with("Current model: Default"));
        assert!(matches!(prompt.markup, ReplyMarkup::Choices(ref c) if c.len() == 1));

        h.send(event(
            "42",
            InboundEvent::ModelSelected(ModelSelection {
                model_id: "sonnet".into(),
            }),
        ))
        .await;
        let session = h.session("42").await;
        assert_eq!(session.selected_model.as_deref(), Some("sonnet"));
        assert_eq!(session.state, SessionState::Active);
        assert!(
            h.transport
                .last()
                .unwrap()
                .text
                .starts_with("✅ Model changed to: Claude Sonnet")
        );

        h.send(text_event("42", "hi")).await;
        let req = h.orchestrator.requests().last().cloned().unwrap();
        assert_eq!(req.settings.model.as_deref(), Some("sonnet"));

        // preference survives a reset
        h.send(start_event("42")).await;
        assert_eq!(
            h.session("42").await.selected_model.as_deref(),
            Some("sonnet")
        );
        assert!(h.transport.last().unwrap().text.ends_with("🤖 Model: Claude Sonnet"));
    }

    #[tokio::test]
    async fn unknown_model_selection_is_ignored() {
        let h = Harness::tester(ScriptedOrchestrator::echo());
        h.activate("42").await;
        let sent = h.transport.texts().len();
        h.send(event(
            "42",
            InboundEvent::ModelSelected(ModelSelection {
                model_id: "retired".into(),
            }),
        ))
        .await;
        assert!(h.session("42").await.selected_model.is_none());
        assert_eq!(h.transport.texts().len(), sent);
    }

    #[tokio::test]
    async fn delete_all_history_is_silent_control() {
        let h = Harness::tester(ScriptedOrchestrator::replying("deleted"));
        h.activate("42").await;
        let sent = h.transport.texts().len();
        h.send(event(
            "42",
            InboundEvent::Command(courier_channels::CommandEvent {
                command: Command::DeleteAllHistory,
            }),
        ))
        .await;
        let req = h.orchestrator.requests().last().cloned().unwrap();
        assert_eq!(req.message_type, MessageType::DeleteEntriesByChat);
        assert_eq!(h.transport.texts().len(), sent);
        let session = h.session("42").await;
        assert!(session.transcript.is_empty());
        assert!(session.is_active());
    }

    #[tokio::test]
    async fn unsupported_media_never_reaches_orchestrator() {
        let h = Harness::tester(ScriptedOrchestrator::echo());
        h.activate("42").await;
        let before = h.orchestrator.requests().len();
        h.send(event(
            "42",
            InboundEvent::Unsupported(UnsupportedEvent {
                media: "sticker".into(),
            }),
        ))
        .await;
        assert_eq!(h.orchestrator.requests().len(), before);
        assert!(h.transport.last().unwrap().text.starts_with("I can only process text"));
    }

    /// Drive random event sequences and check the reporting invariant after
    /// every transition.
    #[tokio::test]
    async fn reporting_implies_active_over_event_sequences() {
        let h = Harness::tester(ScriptedOrchestrator::echo());
        let alphabet: Vec<InboundDescriptor> = vec![
            start_event("7"),
            text_event("7", "some text"),
            text_event("7", REPORT_ISSUE),
            text_event("7", START_NEW_CHAT),
            text_event("7", SELECT_MODEL),
            image_event("7", Some("cap")),
            document_event("7", "application/pdf", "a.pdf"),
            event(
                "7",
                InboundEvent::ModelSelected(ModelSelection {
                    model_id: "sonnet".into(),
                }),
            ),
        ];
        // deterministic LCG so failures are reproducible
        let mut seed: u64 = 0x5eed;
        for _ in 0..400 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let pick = (seed >> 33) as usize % alphabet.len();
            h.send(alphabet[pick].clone()).await;
            let s = h.session("7").await;
            assert!(!s.reporting || s.state == SessionState::Active);
        }
    }
}
