//! Encoding-strategy selection.
//!
//! Order: object storage (when configured and reachable), then a platform
//! link for link-capable kinds, then inline base64. Documents are checked
//! against the MIME allow-list before any network I/O happens.

use std::{collections::HashSet, sync::Arc, time::Duration};

use {
    base64::Engine as _,
    courier_channels::{
        AttachmentDescriptor, ContentItem, ContentKind, FetchMode, Fetched, Payload, Transport,
        content::MIN_LINK_VALIDITY_SECS,
    },
    courier_config::{AttachmentsConfig, LinkKind},
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use courier_metrics::{attachments as metrics_attachments, counter, labels};

use crate::{
    error::{Error, Result},
    mime,
    storage::ObjectStorage,
};

/// Which strategies apply to which attachments.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub url_kinds: HashSet<ContentKind>,
    pub document_mimes: Vec<String>,
    pub timeout: Duration,
}

impl StrategyConfig {
    #[must_use]
    pub fn links_kind(&self, kind: ContentKind) -> bool {
        self.url_kinds.contains(&kind)
    }

    #[must_use]
    pub fn accepts_document(&self, mime_type: &str) -> bool {
        self.document_mimes
            .iter()
            .any(|allowed| mime::same_essence(allowed, mime_type))
    }
}

impl From<&AttachmentsConfig> for StrategyConfig {
    fn from(cfg: &AttachmentsConfig) -> Self {
        let url_kinds = cfg
            .url_kinds
            .iter()
            .map(|k| match k {
                LinkKind::Image => ContentKind::Image,
                LinkKind::Document => ContentKind::Document,
                LinkKind::Audio => ContentKind::Audio,
            })
            .collect();
        Self {
            url_kinds,
            document_mimes: cfg.document_mimes.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::from(&AttachmentsConfig::default())
    }
}

pub struct ContentResolver {
    transport: Arc<dyn Transport>,
    storage: Option<Arc<dyn ObjectStorage>>,
    config: StrategyConfig,
}

impl ContentResolver {
    pub fn new(
        transport: Arc<dyn Transport>,
        storage: Option<Arc<dyn ObjectStorage>>,
        config: StrategyConfig,
    ) -> Self {
        Self {
            transport,
            storage,
            config,
        }
    }

    /// Resolve one attachment into a [`ContentItem`].
    ///
    /// `namespace` groups uploads in object storage; callers pass the chat id.
    pub async fn resolve(
        &self,
        attachment: &AttachmentDescriptor,
        namespace: &str,
    ) -> Result<ContentItem> {
        let mime_type = attachment.effective_mime().to_string();

        if attachment.kind == ContentKind::Document && !self.config.accepts_document(&mime_type) {
            #[cfg(feature = "metrics")]
            counter!(courier_metrics::inbound::UNSUPPORTED_TOTAL, labels::KIND => "document")
                .increment(1);
            return Err(Error::unsupported(attachment.kind, mime_type));
        }

        // Bytes downloaded for an upload that could not complete are reused
        // for the inline fallback.
        let mut downloaded = None;

        if let Some(storage) = &self.storage {
            let bytes = self.download(attachment).await?;
            let file_name = upload_name(attachment, &mime_type);
            let upload = storage.upload(bytes.clone(), &file_name, &mime_type, namespace);
            match tokio::time::timeout(self.config.timeout, upload).await {
                Ok(Ok(Some(url))) => {
                    return Ok(self.item(attachment, mime_type, Payload::RemoteStored { url }));
                },
                Ok(Ok(None)) => {
                    warn!(kind = %attachment.kind, "object storage unavailable, falling back");
                    downloaded = Some(bytes);
                },
                Ok(Err(e)) => {
                    #[cfg(feature = "metrics")]
                    counter!(metrics_attachments::FETCH_FAILURES_TOTAL, labels::KIND => attachment.kind.as_str())
                        .increment(1);
                    return Err(Error::fetch_failed_with("upload to object storage", e));
                },
                Err(_) => {
                    #[cfg(feature = "metrics")]
                    counter!(metrics_attachments::FETCH_FAILURES_TOTAL, labels::KIND => attachment.kind.as_str())
                        .increment(1);
                    return Err(Error::fetch_failed("upload to object storage timed out"));
                },
            }
        }

        if self.config.links_kind(attachment.kind) {
            let url = match self.fetch(attachment, FetchMode::Link).await? {
                Fetched::Link(url) => url,
                Fetched::Bytes(_) => {
                    return Err(Error::fetch_failed("transport returned bytes for a link request"));
                },
            };
            return Ok(self.item(attachment, mime_type, Payload::Url {
                url,
                expires_after_secs: MIN_LINK_VALIDITY_SECS,
            }));
        }

        let bytes = match downloaded {
            Some(bytes) => bytes,
            None => self.download(attachment).await?,
        };
        let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
        debug!(kind = %attachment.kind, size = bytes.len(), "attachment encoded inline");
        Ok(self.item(attachment, mime_type, Payload::Inline { data }))
    }

    async fn download(&self, attachment: &AttachmentDescriptor) -> Result<Vec<u8>> {
        match self.fetch(attachment, FetchMode::Bytes).await? {
            Fetched::Bytes(bytes) => Ok(bytes),
            Fetched::Link(_) => Err(Error::fetch_failed(
                "transport returned a link for a download request",
            )),
        }
    }

    async fn fetch(&self, attachment: &AttachmentDescriptor, mode: FetchMode) -> Result<Fetched> {
        let fetch = self.transport.fetch_attachment(&attachment.file, mode);
        match tokio::time::timeout(self.config.timeout, fetch).await {
            Ok(Ok(fetched)) => Ok(fetched),
            Ok(Err(e)) => {
                #[cfg(feature = "metrics")]
                counter!(metrics_attachments::FETCH_FAILURES_TOTAL, labels::KIND => attachment.kind.as_str())
                    .increment(1);
                Err(Error::fetch_failed_with("fetch from platform", e))
            },
            Err(_) => {
                #[cfg(feature = "metrics")]
                counter!(metrics_attachments::FETCH_FAILURES_TOTAL, labels::KIND => attachment.kind.as_str())
                    .increment(1);
                Err(Error::fetch_failed("fetch from platform timed out"))
            },
        }
    }

    fn item(
        &self,
        attachment: &AttachmentDescriptor,
        mime_type: String,
        payload: Payload,
    ) -> ContentItem {
        #[cfg(feature = "metrics")]
        counter!(metrics_attachments::RESOLVED_TOTAL,
            labels::KIND => attachment.kind.as_str(),
            labels::STRATEGY => payload.strategy()
        )
        .increment(1);
        ContentItem {
            kind: attachment.kind,
            payload,
            mime_type,
            caption: attachment.caption.clone(),
            file_name: attachment.file_name.clone(),
        }
    }
}

fn upload_name(attachment: &AttachmentDescriptor, mime_type: &str) -> String {
    attachment
        .file_name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("{}.{}", attachment.kind, mime::extension_for(mime_type)))
}
