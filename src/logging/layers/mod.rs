use tracing::Subscriber;
use tracing_subscriber::layer::Layer;

pub mod console;
pub mod file;
pub mod opentelemetry;

/// Type-erased layer so every sink can be stacked on the same registry.
pub type BoxLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Stand-in for a disabled sink.
pub struct NoopLayer;

impl<S> Layer<S> for NoopLayer where S: Subscriber {}

pub fn noop_layer<S>() -> BoxLayer<S>
where
    S: Subscriber + 'static,
{
    Box::new(NoopLayer)
}

/// Unwrap an optional sink, substituting a no-op layer when it is absent.
pub fn optional_layer<S>(layer: Option<BoxLayer<S>>) -> BoxLayer<S>
where
    S: Subscriber + 'static,
{
    layer.unwrap_or_else(noop_layer)
}
