//! gRPC utilities shared by the workspace services.
//!
//! - Error conversion from `AppError` to `tonic::Status`
//! - Trace context interceptor
//! - Server builder and reflection helpers

pub mod error;
pub mod interceptors;
pub mod server;

pub use error::IntoStatus;
pub use interceptors::{REQUEST_ID_KEY, extract_request_id, trace_context_interceptor};
pub use server::{GrpcServerBuilder, create_reflection_service};
