//! gRPC server builder utilities.

use std::time::Duration;

use tonic::transport::Server;
use tonic_reflection::server::Builder as ReflectionBuilder;

/// Transport settings for a service's gRPC listener.
#[derive(Debug, Clone)]
pub struct GrpcServerBuilder {
    service_name: String,
    http2_keepalive_interval: Option<Duration>,
    http2_keepalive_timeout: Option<Duration>,
}

impl GrpcServerBuilder {
    /// Create a new server builder for the given service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            http2_keepalive_interval: Some(Duration::from_secs(30)),
            http2_keepalive_timeout: Some(Duration::from_secs(10)),
        }
    }

    /// Build a tonic Server with the configured settings.
    pub fn build_server(&self) -> Server {
        let mut server = Server::builder();

        if let Some(interval) = self.http2_keepalive_interval {
            server = server.http2_keepalive_interval(Some(interval));
        }

        if let Some(timeout) = self.http2_keepalive_timeout {
            server = server.http2_keepalive_timeout(Some(timeout));
        }

        tracing::debug!(service = %self.service_name, "gRPC server configured");
        server
    }
}

/// Create a reflection service from encoded file descriptor sets.
pub fn create_reflection_service(
    file_descriptor_sets: &[&[u8]],
) -> Result<
    tonic_reflection::server::ServerReflectionServer<
        impl tonic_reflection::server::ServerReflection,
    >,
    tonic_reflection::server::Error,
> {
    let mut builder = ReflectionBuilder::configure();

    for fds in file_descriptor_sets {
        builder = builder.register_encoded_file_descriptor_set(fds);
    }

    builder.build_v1()
}
