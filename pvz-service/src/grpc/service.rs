//! PvzService gRPC implementation.

use prost_types::Timestamp;
use service_core::error::AppError;
use service_core::grpc::IntoStatus;
use tonic::{Request, Response, Status};

use crate::grpc::proto::pvz_service_server::PvzService;
use crate::grpc::proto::{GetPickupPointListRequest, GetPickupPointListResponse, PickupPoint};
use crate::models;
use crate::services::metrics::record_grpc_request;
use crate::services::PickupPointRegistry;

pub struct PvzServiceImpl {
    pickup_points: PickupPointRegistry,
}

impl PvzServiceImpl {
    pub fn new(pickup_points: PickupPointRegistry) -> Self {
        Self { pickup_points }
    }
}

impl From<models::PickupPoint> for PickupPoint {
    fn from(p: models::PickupPoint) -> Self {
        PickupPoint {
            id: p.id.to_string(),
            registration_date: Some(Timestamp {
                seconds: p.registration_date.timestamp(),
                nanos: p.registration_date.timestamp_subsec_nanos() as i32,
            }),
            city: p.city.as_str().to_string(),
        }
    }
}

#[tonic::async_trait]
impl PvzService for PvzServiceImpl {
    async fn get_pickup_point_list(
        &self,
        _request: Request<GetPickupPointListRequest>,
    ) -> Result<Response<GetPickupPointListResponse>, Status> {
        let method = "GetPickupPointList";

        let pickup_points = self.pickup_points.all().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to list pickup points");
            record_grpc_request(method, "error");
            AppError::from(e).into_status()
        })?;

        tracing::debug!(count = pickup_points.len(), "Listed pickup points");
        record_grpc_request(method, "ok");

        Ok(Response::new(GetPickupPointListResponse {
            pickup_points: pickup_points.into_iter().map(Into::into).collect(),
        }))
    }
}
