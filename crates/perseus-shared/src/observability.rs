//! Observability features: structured logging and metrics

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::{info, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::config::{LoggingConfig, ObservabilityConfig};

/// Global observability system
static OBSERVABILITY: OnceCell<ObservabilitySystem> = OnceCell::new();

/// Process-wide logging and metrics setup
pub struct ObservabilitySystem {
    metrics: Option<PrometheusHandle>,
}

impl ObservabilitySystem {
    /// Initialize the observability system
    pub fn init(config: &ObservabilityConfig) -> anyhow::Result<()> {
        Self::init_logging(&config.logging)?;

        let metrics = if config.metrics.enabled {
            Some(Self::init_metrics()?)
        } else {
            None
        };

        OBSERVABILITY
            .set(Self { metrics })
            .map_err(|_| anyhow::anyhow!("Observability system already initialized"))?;

        info!("Observability system initialized");
        Ok(())
    }

    /// Initialize structured logging
    fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
        let env_filter = EnvFilter::builder()
            .with_default_directive(parse_level(&config.level).into())
            .from_env_lossy();

        let registry = tracing_subscriber::registry().with(env_filter);

        match config.format.to_lowercase().as_str() {
            "json" => {
                let json_layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE);
                registry.with(json_layer).try_init()?;
            }
            _ => {
                let pretty_layer = tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE);
                registry.with(pretty_layer).try_init()?;
            }
        }

        Ok(())
    }

    /// Install the Prometheus recorder for the `metrics` facade
    fn init_metrics() -> anyhow::Result<PrometheusHandle> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        info!("Prometheus metrics recorder installed");
        Ok(handle)
    }

    /// Get the global observability system
    pub fn get() -> Option<&'static ObservabilitySystem> {
        OBSERVABILITY.get()
    }

    /// Current metrics in Prometheus text format, when metrics are enabled
    pub fn render_metrics(&self) -> Option<String> {
        self.metrics.as_ref().map(PrometheusHandle::render)
    }
}

/// Map a configured level name to a tracing level, defaulting to INFO
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
