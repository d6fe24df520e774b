//! Durable object storage for attachments.

use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, warn},
};

/// Durable blob store the orchestrator can read from.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `namespace` and return its public URL.
    ///
    /// `Ok(None)` means the store is unreachable right now and the caller
    /// should fall back to another strategy.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
        namespace: &str,
    ) -> anyhow::Result<Option<String>>;
}

/// Plain HTTP `PUT` object store (S3-compatible presigned buckets, MinIO
/// gateways, static file servers with write access).
pub struct HttpObjectStorage {
    client: reqwest::Client,
    endpoint: String,
    public_base_url: String,
    token: Option<Secret<String>>,
}

impl HttpObjectStorage {
    pub fn new(
        endpoint: impl Into<String>,
        public_base_url: Option<String>,
        token: Option<Secret<String>>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let public_base_url = public_base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| endpoint.clone());
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            public_base_url,
            token,
        })
    }

    /// `None` when object storage is disabled.
    pub fn from_config(
        cfg: &courier_config::ObjectStorageConfig,
        timeout: Duration,
    ) -> anyhow::Result<Option<Self>> {
        if !cfg.enabled {
            return Ok(None);
        }
        let Some(endpoint) = cfg.endpoint.clone() else {
            anyhow::bail!("object_storage.endpoint is not set");
        };
        Self::new(endpoint, cfg.public_base_url.clone(), cfg.token.clone(), timeout).map(Some)
    }
}

fn object_key(namespace: &str, file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{namespace}/{}-{safe}", uuid::Uuid::new_v4())
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
        namespace: &str,
    ) -> anyhow::Result<Option<String>> {
        let key = object_key(namespace, file_name);
        let size = bytes.len();
        let mut req = self
            .client
            .put(format!("{}/{key}", self.endpoint))
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token.expose_secret());
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) if e.is_connect() => {
                warn!(error = %e, "object storage unreachable");
                return Ok(None);
            },
            Err(e) => return Err(e.into()),
        };
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("object storage rejected upload: HTTP {status}");
        }

        debug!(key, size, "uploaded attachment to object storage");
        Ok(Some(format!("{}/{key}", self.public_base_url)))
    }
}
