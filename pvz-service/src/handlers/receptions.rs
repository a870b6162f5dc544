use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::pagination::{PageQuery, PaginatedResponse, Pagination};
use crate::dtos::receptions::{CreateReceptionRequest, ReceptionDetails};
use crate::middleware::{AnyRole, Employee};
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn create_reception(
    State(state): State<AppState>,
    Employee(_user): Employee,
    ValidatedJson(req): ValidatedJson<CreateReceptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let reception = state.receptions.open(req.pvz_id).await?;
    Ok((StatusCode::CREATED, Json(reception)))
}

pub async fn get_reception(
    State(state): State<AppState>,
    AnyRole(_user): AnyRole,
    Path(reception_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reception = state.receptions.get_by_id(reception_id).await?;
    Ok(Json(ReceptionDetails::from(reception)))
}

pub async fn list_reception_products(
    State(state): State<AppState>,
    AnyRole(_user): AnyRole,
    Path(reception_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = query.page();
    let limit = query.limit();

    let result = state
        .items
        .list_by_reception(reception_id, page, limit)
        .await?;

    Ok(Json(PaginatedResponse {
        data: result.items,
        pagination: Pagination::new(page, limit, result.total),
    }))
}
