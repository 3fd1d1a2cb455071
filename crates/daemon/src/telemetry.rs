//! OpenTelemetry span export
//!
//! Built as an optional `tracing_subscriber` layer so it composes with the
//! fmt layer in a single registry.

use crate::config::DaemonConfig;
use anyhow::Result;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// What `layer` decided, reported once the subscriber is installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryStatus {
    Disabled,
    /// Endpoint configured but the binary was built without `telemetry`
    Unsupported,
    Exporting { endpoint: String, service_name: String },
    /// Exporter could not be built; logging continues without it
    Failed(String),
}

/// Build the OTLP export layer for `config`
///
/// Must run inside the tokio runtime: the batch exporter spawns onto it.
pub fn layer<S>(config: &DaemonConfig) -> Result<(Option<BoxedLayer<S>>, TelemetryStatus)>
where
    S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
{
    let Some(endpoint) = config.otel_endpoint.clone() else {
        return Ok((None, TelemetryStatus::Disabled));
    };

    export_layer(endpoint, &config.otel_service_name)
}

#[cfg(feature = "telemetry")]
fn export_layer<S>(
    endpoint: String,
    service_name: &str,
) -> Result<(Option<BoxedLayer<S>>, TelemetryStatus)>
where
    S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
{
    let layer = otlp_layer::<S>(&endpoint, service_name)?;
    Ok((
        Some(layer),
        TelemetryStatus::Exporting {
            endpoint,
            service_name: service_name.to_string(),
        },
    ))
}

#[cfg(not(feature = "telemetry"))]
fn export_layer<S>(
    _endpoint: String,
    _service_name: &str,
) -> Result<(Option<BoxedLayer<S>>, TelemetryStatus)>
where
    S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
{
    Ok((None, TelemetryStatus::Unsupported))
}

#[cfg(feature = "telemetry")]
fn otlp_layer<S>(endpoint: &str, service_name: &str) -> Result<BoxedLayer<S>>
where
    S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
{
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]))
        .build();

    let tracer = provider.tracer(service_name.to_string());
    opentelemetry::global::set_tracer_provider(provider);

    Ok(tracing_opentelemetry::layer().with_tracer(tracer).boxed())
}

/// Flush spans still buffered in the exporter
pub fn shutdown() {
    #[cfg(feature = "telemetry")]
    opentelemetry::global::shutdown_tracer_provider();
}
