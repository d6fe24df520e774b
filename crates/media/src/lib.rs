//! Attachment resolution: pick an encoding strategy for an inbound
//! attachment and produce a [`courier_channels::ContentItem`].

pub mod error;
pub mod mime;
pub mod resolver;
pub mod storage;

pub use {
    error::{Error, Result},
    resolver::{ContentResolver, StrategyConfig},
    storage::{HttpObjectStorage, ObjectStorage},
};
