use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::items::CreateItemRequest;
use crate::dtos::MessageResponse;
use crate::middleware::Employee;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Pop the most recently added product of the open reception.
pub async fn delete_last_product(
    State(state): State<AppState>,
    Employee(_user): Employee,
    Path(pvz_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.items.remove_last(pvz_id).await?;
    Ok(Json(MessageResponse {
        message: "Product successfully deleted".to_string(),
    }))
}

pub async fn add_product(
    State(state): State<AppState>,
    Employee(_user): Employee,
    ValidatedJson(req): ValidatedJson<CreateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.items.append(req.pvz_id, &req.category).await?;
    Ok((StatusCode::CREATED, Json(item)))
}
