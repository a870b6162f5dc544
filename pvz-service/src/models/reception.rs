//! Reception model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::Item;

/// Reception status. `InProgress` moves to `Closed` once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceptionStatus {
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "close")]
    Closed,
}

impl ReceptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceptionStatus::InProgress => "in_progress",
            ReceptionStatus::Closed => "close",
        }
    }
}

impl FromStr for ReceptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ReceptionStatus::InProgress),
            "close" => Ok(ReceptionStatus::Closed),
            other => Err(format!("unknown reception status: {}", other)),
        }
    }
}

/// Intake batch opened at a pickup point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reception {
    pub id: Uuid,
    pub date_time: DateTime<Utc>,
    pub pvz_id: Uuid,
    pub status: ReceptionStatus,
}

impl Reception {
    pub fn is_open(&self) -> bool {
        self.status == ReceptionStatus::InProgress
    }
}

/// Reception with its items ordered by sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceptionWithItems {
    pub reception: Reception,
    #[serde(rename = "products")]
    pub items: Vec<Item>,
}
