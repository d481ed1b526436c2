use crate::logging::config::OpenTelemetryConfig;
use crate::logging::layers::BoxLayer;
use anyhow::{anyhow, Context, Result};
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::{resource::Resource, trace::SdkTracerProvider};
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::registry::LookupSpan;
use url::Url;

/// Flushes and shuts down the tracer provider when dropped.
pub struct OpenTelemetryGuard(SdkTracerProvider);

impl Drop for OpenTelemetryGuard {
    fn drop(&mut self) {
        let _ = self.0.force_flush();
        let _ = self.0.shutdown();
    }
}

/// Build the OTLP export layer when the configuration enables it.
pub fn layer_from_config<S>(
    config: &OpenTelemetryConfig,
) -> Result<Option<(BoxLayer<S>, OpenTelemetryGuard)>>
where
    S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync + 'static,
{
    if !config.enabled {
        return Ok(None);
    }
    let endpoint = config
        .endpoint
        .as_deref()
        .ok_or_else(|| anyhow!("OpenTelemetry is enabled without an endpoint"))?;
    let endpoint = Url::parse(endpoint).context("invalid OTLP endpoint")?;
    build_opentelemetry_layer(&endpoint, &config.service_name).map(Some)
}

/// Builds an OpenTelemetry layer wired to the OTLP gRPC endpoint.
pub fn build_opentelemetry_layer<S>(
    endpoint: &Url,
    service_name: &str,
) -> Result<(BoxLayer<S>, OpenTelemetryGuard)>
where
    S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync + 'static,
{
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.as_str())
        .build()
        .context("failed to build OTLP exporter")?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    let provider = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build();

    let tracer = provider.tracer("orchdoc");
    let layer = OpenTelemetryLayer::new(tracer);

    Ok((Box::new(layer), OpenTelemetryGuard(provider)))
}
