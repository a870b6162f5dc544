use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Product type is required"))]
    pub category: String,
    pub pvz_id: Uuid,
}
