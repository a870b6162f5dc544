use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Item, Reception, ReceptionWithItems};

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceptionRequest {
    pub pvz_id: Uuid,
}

/// Reception fields with its products inline.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReceptionDetails {
    #[serde(flatten)]
    pub reception: Reception,
    pub products: Vec<Item>,
}

impl From<ReceptionWithItems> for ReceptionDetails {
    fn from(r: ReceptionWithItems) -> Self {
        Self {
            reception: r.reception,
            products: r.items,
        }
    }
}
