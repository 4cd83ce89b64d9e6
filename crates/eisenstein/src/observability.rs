//! Tracing subscriber setup for the binary.
//!
//! Logs go to stderr so stdout stays clean for JSON output. With the
//! `observability` feature, spans are also exported through OpenTelemetry to
//! stdout.

use eisenstein_error::{ConfigError, EisensteinResult};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging and span export settings.
#[derive(Debug, Clone, PartialEq, Eq, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct ObservabilityConfig {
    /// Service name for telemetry attribution
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info", "eisenstein=debug")
    pub log_level: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl ObservabilityConfig {
    /// Settings for the named service at `info` level.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    fn env_filter(&self) -> EisensteinResult<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .map_err(|e| {
                ConfigError::new(format!("Invalid log filter '{}': {}", self.log_level, e)).into()
            })
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}

fn fmt_layer<S>(json: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the log filter does not parse.
#[cfg(not(feature = "observability"))]
pub fn init_observability(config: &ObservabilityConfig) -> EisensteinResult<()> {
    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(fmt_layer(config.json_logs))
        .init();
    Ok(())
}

/// Install the global subscriber with an OpenTelemetry span layer.
///
/// # Errors
///
/// Returns an error if the log filter does not parse.
#[cfg(feature = "observability")]
pub fn init_observability(config: &ObservabilityConfig) -> EisensteinResult<()> {
    use opentelemetry::{KeyValue, global, trace::TracerProvider};
    use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attributes(vec![KeyValue::new(
            "service.version",
            config.service_version.clone(),
        )])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
        .with_resource(resource)
        .build();
    global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer(config.service_name.clone());
    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(fmt_layer(config.json_logs))
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_setters() {
        let config = ObservabilityConfig::default()
            .with_log_level("debug".to_string())
            .with_json_logs(true);
        assert_eq!(config.service_name, "eisenstein");
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);
    }
}
