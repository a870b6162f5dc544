//! Application startup and lifecycle management.

use crate::config::{PvzConfig, StorageBackend};
use crate::grpc::{
    proto::{pvz_service_server::PvzServiceServer, FILE_DESCRIPTOR_SET},
    trace_context_interceptor, PvzServiceImpl,
};
use crate::services::{init_metrics, Database, JwtService, MemoryStore, Repositories};
use crate::{build_router, AppState};
use service_core::error::AppError;
use service_core::grpc::{create_reflection_service, GrpcServerBuilder};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    grpc_port: u16,
    http_listener: TcpListener,
    grpc_listener: TcpListener,
    service_name: String,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: PvzConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: PvzConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: PvzConfig, run_migrations: bool) -> Result<Self, AppError> {
        config.validate()?;
        init_metrics();

        let jwt = JwtService::new(&config.jwt).map_err(AppError::ConfigError)?;

        let (repos, db) = match config.storage {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                (Repositories::from_store(MemoryStore::new()), None)
            }
            StorageBackend::Postgres => {
                let db = Database::new(
                    &config.database.url,
                    config.database.max_connections,
                    config.database.min_connections,
                )
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                    e
                })?;

                if run_migrations {
                    db.run_migrations().await.map_err(|e| {
                        tracing::error!(error = %e, "Failed to run migrations");
                        e
                    })?;
                }

                (Repositories::from_store(db.clone()), Some(Arc::new(db)))
            }
        };

        let state = AppState::new(repos, jwt, db);

        let http_addr = config.common.http_addr();
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %http_addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        let grpc_addr = config.common.grpc_addr();
        let grpc_listener = TcpListener::bind(grpc_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %grpc_addr, "Failed to bind gRPC listener");
            AppError::from(e)
        })?;
        let grpc_port = grpc_listener.local_addr()?.port();

        tracing::info!(
            http_port = http_port,
            grpc_port = grpc_port,
            storage = ?config.storage,
            "Pvz service listeners bound"
        );

        Ok(Self {
            http_port,
            grpc_port,
            http_listener,
            grpc_listener,
            service_name: config.service_name,
            state,
        })
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn grpc_port(&self) -> u16 {
        self.grpc_port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the HTTP and gRPC servers until either stops.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let http_router = build_router(self.state.clone());

        let pvz_service = PvzServiceImpl::new(self.state.pickup_points.clone());

        let (mut health_reporter, grpc_health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_serving::<PvzServiceServer<PvzServiceImpl>>()
            .await;

        let reflection_service = create_reflection_service(&[FILE_DESCRIPTOR_SET]).map_err(|e| {
            std::io::Error::other(format!("Failed to build reflection service: {}", e))
        })?;

        let grpc_trace_layer = TraceLayer::new_for_grpc()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::DEBUG));

        let pvz_service_with_interceptor =
            PvzServiceServer::with_interceptor(pvz_service, trace_context_interceptor);

        let incoming = tokio_stream::wrappers::TcpListenerStream::new(self.grpc_listener);
        let grpc_server = GrpcServerBuilder::new(self.service_name.clone())
            .build_server()
            .layer(grpc_trace_layer)
            .add_service(grpc_health_service)
            .add_service(reflection_service)
            .add_service(pvz_service_with_interceptor)
            .serve_with_incoming(incoming);

        tracing::info!(
            service = %self.service_name,
            version = env!("CARGO_PKG_VERSION"),
            http_port = self.http_port,
            grpc_port = self.grpc_port,
            "Service ready to accept connections"
        );

        tokio::select! {
            result = axum::serve(self.http_listener, http_router) => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "HTTP server error");
                    return Err(std::io::Error::other(format!("HTTP server error: {}", e)));
                }
            }
            result = grpc_server => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "gRPC server error");
                    return Err(std::io::Error::other(format!("gRPC server error: {}", e)));
                }
            }
        }

        Ok(())
    }
}
