use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::pagination::{PaginatedResponse, Pagination};
use crate::dtos::pickup_points::{CreatePickupPointRequest, ListPickupPointsQuery};
use crate::middleware::{AnyRole, Employee, Moderator};
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn create_pickup_point(
    State(state): State<AppState>,
    Moderator(user): Moderator,
    ValidatedJson(req): ValidatedJson<CreatePickupPointRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!(user_id = %user.sub, city = %req.city, "Creating pickup point");
    let pickup_point = state.pickup_points.create(&req.city).await?;
    Ok((StatusCode::CREATED, Json(pickup_point)))
}

pub async fn list_pickup_points(
    State(state): State<AppState>,
    AnyRole(_user): AnyRole,
    Query(query): Query<ListPickupPointsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (start, end) = query.date_bounds()?;
    let page = query.paging.page();
    let limit = query.paging.limit();

    let result = state.pickup_points.list(page, limit, start, end).await?;

    Ok(Json(PaginatedResponse {
        data: result.items,
        pagination: Pagination::new(page, limit, result.total),
    }))
}

pub async fn get_pickup_point(
    State(state): State<AppState>,
    AnyRole(_user): AnyRole,
    Path(pvz_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let pickup_point = state.pickup_points.get_by_id(pvz_id).await?;
    Ok(Json(pickup_point))
}

pub async fn close_last_reception(
    State(state): State<AppState>,
    Employee(_user): Employee,
    Path(pvz_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reception = state.receptions.close_latest(pvz_id).await?;
    Ok(Json(reception))
}
