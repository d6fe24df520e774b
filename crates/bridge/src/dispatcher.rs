//! Per-user workers.
//!
//! Each user gets one task fed by an unbounded queue, so that user's events
//! run in arrival order and never overlap while different users proceed in
//! parallel. Workers start on the first event and retire after sitting idle.

use std::{
    collections::HashMap,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use {
    courier_channels::InboundDescriptor,
    futures::FutureExt,
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info},
};

#[cfg(feature = "metrics")]
use {
    courier_metrics::{counter, gauge, histogram, inbound as metrics_inbound},
    std::time::Instant,
};

use crate::machine::SessionMachine;

type WorkerMap = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<InboundDescriptor>>>>;

pub struct Dispatcher {
    machine: Arc<SessionMachine>,
    workers: WorkerMap,
    idle: Duration,
}

impl Dispatcher {
    pub fn new(machine: Arc<SessionMachine>, idle: Duration) -> Self {
        Self {
            machine,
            workers: Arc::default(),
            idle,
        }
    }

    /// Queue an event on its user's worker, starting one if needed.
    pub fn handle_inbound_event(&self, inbound: InboundDescriptor) {
        #[cfg(feature = "metrics")]
        counter!(metrics_inbound::EVENTS_TOTAL).increment(1);

        let user_id = inbound.user_id().to_string();
        // Sends and retirement both happen under this lock.
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);

        let inbound = match workers.get(&user_id) {
            Some(tx) => match tx.send(inbound) {
                Ok(()) => return,
                Err(mpsc::error::SendError(back)) => {
                    workers.remove(&user_id);
                    back
                },
            },
            None => inbound,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(inbound).is_err() {
            return;
        }
        workers.insert(user_id.clone(), tx);
        debug!(user_id = %user_id, "starting worker");
        tokio::spawn(worker(
            user_id,
            rx,
            Arc::clone(&self.machine),
            Arc::clone(&self.workers),
            self.idle,
        ));
    }

    /// Consume events until the channel closes or `cancel` fires.
    pub async fn run(&self, mut events: mpsc::Receiver<InboundDescriptor>, cancel: CancellationToken) {
        info!("dispatcher running");
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                next = events.recv() => match next {
                    Some(inbound) => self.handle_inbound_event(inbound),
                    None => break,
                },
            }
        }
        info!(workers = self.active_workers(), "dispatcher stopped");
    }

    #[must_use]
    pub fn active_workers(&self) -> usize {
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

async fn worker(
    user_id: String,
    mut rx: mpsc::UnboundedReceiver<InboundDescriptor>,
    machine: Arc<SessionMachine>,
    workers: WorkerMap,
    idle: Duration,
) {
    #[cfg(feature = "metrics")]
    gauge!(metrics_inbound::WORKERS_ACTIVE).increment(1.0);

    loop {
        let next = match tokio::time::timeout(idle, rx.recv()).await {
            Ok(next) => next,
            Err(_) => {
                let mut map = workers.lock().unwrap_or_else(PoisonError::into_inner);
                match rx.try_recv() {
                    Ok(inbound) => Some(inbound),
                    Err(_) => {
                        map.remove(&user_id);
                        None
                    },
                }
            },
        };
        let Some(inbound) = next else {
            break;
        };

        #[cfg(feature = "metrics")]
        let started = Instant::now();

        match AssertUnwindSafe(machine.handle(&inbound)).catch_unwind().await {
            Ok(Ok(())) => {},
            Ok(Err(e)) => error!(user_id = %user_id, error = %e, "event handling failed"),
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(ToString::to_string)
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(user_id = %user_id, reason = %reason, "event handling panicked");
            },
        }

        #[cfg(feature = "metrics")]
        histogram!(metrics_inbound::PROCESSING_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
    }

    debug!(user_id = %user_id, "worker retired");
    #[cfg(feature = "metrics")]
    gauge!(metrics_inbound::WORKERS_ACTIVE).decrement(1.0);
}
