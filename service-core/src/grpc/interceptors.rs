//! gRPC interceptors for cross-cutting concerns.

use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tonic::{Request, Status};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// gRPC metadata key for W3C traceparent header.
pub const TRACEPARENT_KEY: &str = "traceparent";

/// gRPC metadata key for request ID.
pub const REQUEST_ID_KEY: &str = "x-request-id";

/// Read-only view of tonic metadata for the W3C propagator.
struct MetadataExtractor<'a>(&'a tonic::metadata::MetadataMap);

impl Extractor for MetadataExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0
            .keys()
            .filter_map(|k| match k {
                tonic::metadata::KeyRef::Ascii(key) => Some(key.as_str()),
                tonic::metadata::KeyRef::Binary(_) => None,
            })
            .collect()
    }
}

/// Interceptor that parents the current span on the caller's trace context.
///
/// Reads `traceparent`/`tracestate` from the request metadata. Requests
/// without trace headers pass through untouched.
#[allow(clippy::result_large_err)]
pub fn trace_context_interceptor(request: Request<()>) -> Result<Request<()>, Status> {
    if let Some(traceparent) = request.metadata().get(TRACEPARENT_KEY)
        && let Ok(traceparent_str) = traceparent.to_str()
    {
        tracing::debug!(traceparent = %traceparent_str, "Received trace context");
        let context = TraceContextPropagator::new().extract(&MetadataExtractor(request.metadata()));
        Span::current().set_parent(context);
    }

    if let Some(request_id) = extract_request_id(&request) {
        tracing::debug!(request_id = %request_id, "gRPC request received");
    }

    Ok(request)
}

/// Extract request ID from incoming gRPC request metadata.
pub fn extract_request_id<T>(request: &Request<T>) -> Option<String> {
    request
        .metadata()
        .get(REQUEST_ID_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_read_from_metadata() {
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(REQUEST_ID_KEY, "req-42".parse().unwrap());

        assert_eq!(extract_request_id(&request), Some("req-42".to_string()));
    }

    #[test]
    fn interceptor_passes_through_with_and_without_trace_headers() {
        assert!(trace_context_interceptor(Request::new(())).is_ok());

        let mut request = Request::new(());
        request.metadata_mut().insert(
            TRACEPARENT_KEY,
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
                .parse()
                .unwrap(),
        );
        assert!(trace_context_interceptor(request).is_ok());
    }

    #[test]
    fn request_id_is_logged_as_event_field() {
        use std::fmt;
        use std::sync::{Arc, Mutex};
        use tracing::field::{Field, Visit};
        use tracing_subscriber::layer::{Context, SubscriberExt};
        use tracing_subscriber::Layer;

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<(String, String)>>>);

        impl Visit for Captured {
            fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                self.0
                    .lock()
                    .unwrap()
                    .push((field.name().to_string(), format!("{:?}", value)));
            }
        }

        impl<S: tracing::Subscriber> Layer<S> for Captured {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                event.record(&mut self.clone());
            }
        }

        let captured = Captured::default();
        let subscriber = tracing_subscriber::registry().with(captured.clone());

        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(REQUEST_ID_KEY, "req-7".parse().unwrap());
        tracing::subscriber::with_default(subscriber, || {
            trace_context_interceptor(request).unwrap();
        });

        let fields = captured.0.lock().unwrap();
        assert!(
            fields
                .iter()
                .any(|(name, value)| name == "request_id" && value == "req-7")
        );
    }
}
