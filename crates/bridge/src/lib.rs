//! The conversational bridge: per-user session state machine, orchestrator
//! round trips, issue reports and the dispatcher that serializes each user's
//! events.
//!
//! Hosts feed [`Dispatcher::handle_inbound_event`] (or [`Dispatcher::run`]
//! with a channel) from a transport; everything else is wired through
//! [`MachineDeps`].

pub mod bridge;
pub mod catalog;
pub mod dispatcher;
pub mod error;
pub mod interface;
pub mod issues;
pub mod machine;
pub mod models;
pub mod orchestrator;

#[cfg(test)]
mod testing;

pub use {
    bridge::{RequestBridge, Turn},
    catalog::{BuiltinCatalog, MessageCatalog, MessageKey},
    dispatcher::Dispatcher,
    error::{Error, Result},
    interface::{BotInterface, MenuCommand},
    issues::{IssueRecord, IssueReporter, IssueSink, JsonlIssueSink, LogOnlyIssueSink},
    machine::{MachineDeps, SessionMachine},
    models::{ModelCatalog, ModelInfo},
    orchestrator::{
        EchoOrchestrator, HttpOrchestrator, MessageType, Orchestrator, OutboundRequest,
        OutboundResponse,
    },
};
