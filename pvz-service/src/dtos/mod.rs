pub mod auth;
pub mod items;
pub mod pagination;
pub mod pickup_points;
pub mod receptions;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
