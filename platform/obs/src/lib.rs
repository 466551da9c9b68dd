use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{self as sdk, Resource};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,tower_http=warn";

static INIT: OnceCell<()> = OnceCell::new();

/// Configuration for tracing initialization.
#[derive(Clone, Debug)]
pub struct ObsConfig {
    pub service_name: &'static str,
    pub env_filter: Option<String>,
    pub otlp_endpoint: Option<String>,
    /// Print the event target (module path) next to each line.
    pub with_target: bool,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            service_name: "directory-server",
            env_filter: None,
            otlp_endpoint: None,
            with_target: false,
        }
    }
}

impl ObsConfig {
    /// Fill unset fields from `RUST_LOG` and `OTLP_ENDPOINT`.
    pub fn with_env_fallbacks(self) -> Self {
        Self {
            env_filter: self.env_filter.or_else(|| std::env::var("RUST_LOG").ok()),
            otlp_endpoint: self
                .otlp_endpoint
                .or_else(|| std::env::var("OTLP_ENDPOINT").ok())
                .filter(|endpoint| !endpoint.trim().is_empty()),
            ..self
        }
    }

    fn filter(&self) -> Result<EnvFilter> {
        let directives = self.env_filter.as_deref().unwrap_or(DEFAULT_FILTER);
        EnvFilter::try_new(directives).with_context(|| format!("invalid log filter {directives:?}"))
    }
}

/// Install the fmt subscriber, plus an OTLP span exporter when an endpoint is
/// configured. Calling this more than once is a no-op.
pub fn init_tracing(config: ObsConfig) -> Result<()> {
    let config = config.with_env_fallbacks();
    INIT.get_or_try_init(|| install(&config))?;
    Ok(())
}

fn install(config: &ObsConfig) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(config.with_target);
    let registry = tracing_subscriber::registry()
        .with(config.filter()?)
        .with(fmt_layer);

    let Some(endpoint) = config.otlp_endpoint.clone() else {
        registry.try_init()?;
        return Ok(());
    };

    let exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint.clone())
        .build()
        .context("failed to build OTLP exporter")?;
    let resource = Resource::builder()
        .with_service_name(config.service_name)
        .build();
    let provider = sdk::trace::SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build();
    let tracer = provider.tracer(config.service_name);

    registry
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()?;
    tracing::info!(%endpoint, "exporting spans over OTLP");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins_over_default() {
        let config = ObsConfig {
            env_filter: Some("debug".into()),
            ..ObsConfig::default()
        };
        assert!(config.filter().is_ok());
    }

    #[test]
    fn rejects_garbage_filter() {
        let config = ObsConfig {
            env_filter: Some("tower_http=loud".into()),
            ..ObsConfig::default()
        };
        assert!(config.filter().is_err());
    }

    #[test]
    fn blank_otlp_endpoint_is_ignored() {
        let config = ObsConfig {
            otlp_endpoint: Some("   ".into()),
            ..ObsConfig::default()
        }
        .with_env_fallbacks();
        assert!(config.otlp_endpoint.is_none());
    }
}
