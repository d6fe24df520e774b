use {anyhow::Result, std::net::SocketAddr, tracing::info};

/// Configuration for the metrics recorder.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorderConfig {
    /// Whether a recorder should be installed at all.
    pub enabled: bool,
    /// Address the Prometheus scrape endpoint listens on.
    pub listen: Option<SocketAddr>,
}

/// Install the process-wide metrics recorder.
///
/// Call once at startup. Without the `prometheus` feature, or when disabled,
/// no recorder is installed and every facade call is a no-op.
pub fn init_metrics(config: &MetricsRecorderConfig) -> Result<()> {
    if !config.enabled {
        info!("metrics collection is disabled");
        return Ok(());
    }

    #[cfg(feature = "prometheus")]
    {
        let mut builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        if let Some(addr) = config.listen {
            builder = builder.with_http_listener(addr);
        }
        builder.install()?;
        info!(listen = ?config.listen, "prometheus metrics exporter installed");
        Ok(())
    }

    #[cfg(not(feature = "prometheus"))]
    {
        info!("metrics requested but the prometheus feature is not compiled in");
        Ok(())
    }
}
