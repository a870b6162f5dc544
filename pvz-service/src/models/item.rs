//! Item model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Item categories accepted at a pickup point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Electronics,
    Clothes,
    Footwear,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Electronics, Category::Clothes, Category::Footwear];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Clothes => "clothes",
            Category::Footwear => "footwear",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unsupported category: {}", s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Item received within a reception.
///
/// `sequence_num` starts at 1 and is assigned as `count + 1` of the items
/// currently in the reception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub date_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub category: Category,
    pub reception_id: Uuid,
    pub sequence_num: i32,
}
