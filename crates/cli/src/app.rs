//! Component wiring and the main run loop.

use std::{sync::Arc, time::Duration};

use {
    courier_bridge::{
        BotInterface, BuiltinCatalog, Dispatcher, EchoOrchestrator, HttpOrchestrator, IssueSink,
        JsonlIssueSink, LogOnlyIssueSink, MachineDeps, MessageCatalog, ModelCatalog, Orchestrator,
        SessionMachine,
    },
    courier_channels::Transport,
    courier_config::{
        CourierConfig, IssuesConfig, OrchestratorConfig, OrchestratorKind, SessionBackend,
        SessionsConfig,
    },
    courier_media::{ContentResolver, HttpObjectStorage, ObjectStorage, StrategyConfig},
    courier_metrics::MetricsRecorderConfig,
    courier_sessions::{MemorySessionStore, SessionStore, SqliteSessionStore},
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

/// Inbound events buffered between the poller and the dispatcher.
const EVENT_QUEUE_CAPACITY: usize = 256;

pub async fn build_store(cfg: &SessionsConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    match (cfg.backend, &cfg.sqlite_path) {
        (SessionBackend::Sqlite, Some(path)) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let store = SqliteSessionStore::open(path).await?;
            info!(path = %path.display(), "using sqlite session store");
            Ok(Arc::new(store))
        },
        (SessionBackend::Sqlite, None) => {
            anyhow::bail!("sessions.sqlite_path is required for the sqlite backend")
        },
        (SessionBackend::Memory, _) => {
            info!("using in-memory session store");
            Ok(Arc::new(MemorySessionStore::new()))
        },
    }
}

pub fn build_orchestrator(cfg: &OrchestratorConfig) -> anyhow::Result<Arc<dyn Orchestrator>> {
    match cfg.kind {
        OrchestratorKind::Http => {
            let Some(url) = cfg.url.as_deref().filter(|u| !u.is_empty()) else {
                anyhow::bail!("orchestrator.url is required for the http orchestrator");
            };
            info!(url, "using http orchestrator");
            Ok(Arc::new(HttpOrchestrator::new(
                url,
                Duration::from_secs(cfg.timeout_secs),
            )?))
        },
        OrchestratorKind::Echo => {
            warn!("using echo orchestrator, replies are generated locally");
            Ok(Arc::new(EchoOrchestrator))
        },
    }
}

pub fn build_issue_sink(cfg: &IssuesConfig) -> Arc<dyn IssueSink> {
    match &cfg.path {
        Some(path) => Arc::new(JsonlIssueSink::new(path.clone())),
        None => {
            info!("issues.path not set, issue reports are only logged");
            Arc::new(LogOnlyIssueSink)
        },
    }
}

pub fn build_catalog(config: &CourierConfig) -> Arc<dyn MessageCatalog> {
    let (catalog, unknown) = BuiltinCatalog::new().with_overrides(&config.messages);
    for key in unknown {
        warn!(key, "ignoring unknown message override");
    }
    Arc::new(catalog)
}

/// Assemble the session machine for `transport`.
pub async fn build_machine(
    config: &CourierConfig,
    transport: Arc<dyn Transport>,
) -> anyhow::Result<SessionMachine> {
    let io_timeout = Duration::from_secs(config.attachments.timeout_secs);
    let storage = HttpObjectStorage::from_config(&config.object_storage, io_timeout)?
        .map(|s| Arc::new(s) as Arc<dyn ObjectStorage>);
    let resolver = ContentResolver::new(
        Arc::clone(&transport),
        storage,
        StrategyConfig::from(&config.attachments),
    );

    let interface = BotInterface::from_config(&config.interface);
    info!(interface = interface.name(), "bot interface selected");

    Ok(SessionMachine::new(MachineDeps {
        transport,
        store: build_store(&config.sessions).await?,
        orchestrator: build_orchestrator(&config.orchestrator)?,
        resolver: Arc::new(resolver),
        issue_sink: build_issue_sink(&config.issues),
        catalog: build_catalog(config),
        interface,
        models: ModelCatalog::new(
            config.models.clone(),
            config.orchestrator.default_model.clone(),
        ),
        orchestrator_timeout: Duration::from_secs(config.orchestrator.timeout_secs),
        retain_model_on_reset: config.sessions.retain_model_on_reset,
        max_transcript_entries: config.sessions.max_transcript_entries,
    }))
}

fn init_metrics(config: &CourierConfig) -> anyhow::Result<()> {
    let listen = config
        .metrics
        .listen
        .as_deref()
        .map(str::parse)
        .transpose()?;
    courier_metrics::init_metrics(&MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        listen,
    })
}

/// Run the bot until Ctrl-C or until polling stops.
pub async fn run(config: CourierConfig) -> anyhow::Result<()> {
    init_metrics(&config)?;

    let cancel = CancellationToken::new();
    // Updates queue in `rx` until the dispatcher starts below.
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let (transport, poller) =
        courier_telegram::start_polling(&config.telegram, tx, cancel.clone()).await?;

    let machine = match build_machine(&config, Arc::new(transport)).await {
        Ok(machine) => Arc::new(machine),
        Err(e) => {
            cancel.cancel();
            return Err(e);
        },
    };
    let dispatcher = Dispatcher::new(
        machine,
        Duration::from_secs(config.sessions.worker_idle_secs),
    );

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
        }
        shutdown.cancel();
    });

    info!("courier running");
    dispatcher.run(rx, cancel.clone()).await;
    cancel.cancel();
    if let Err(e) = poller.await {
        warn!(error = %e, "telegram polling task failed");
    }
    info!("courier stopped");
    Ok(())
}
