//! Pickup point model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ReceptionWithItems;

/// Cities a pickup point may be registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Moscow,
    #[serde(rename = "Saint Petersburg")]
    SaintPetersburg,
    Kazan,
}

impl Location {
    pub const ALL: [Location; 3] = [
        Location::Moscow,
        Location::SaintPetersburg,
        Location::Kazan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Moscow => "Moscow",
            Location::SaintPetersburg => "Saint Petersburg",
            Location::Kazan => "Kazan",
        }
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::ALL
            .into_iter()
            .find(|location| location.as_str() == s)
            .ok_or_else(|| format!("unsupported location: {}", s))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered pickup point. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupPoint {
    pub id: Uuid,
    pub registration_date: DateTime<Utc>,
    pub city: Location,
}

/// Pickup point together with its receptions, as returned by listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupPointWithReceptions {
    pub pvz: PickupPoint,
    pub receptions: Vec<ReceptionWithItems>,
}
