//! Pickup point registration and lookup.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::metrics::record_pickup_point_created;
use super::repository::PickupPointRepository;
use super::ServiceError;
use crate::models::{DateRange, Location, Page, PageRequest, PickupPoint, PickupPointWithReceptions};

#[derive(Clone)]
pub struct PickupPointRegistry {
    pickup_points: Arc<dyn PickupPointRepository>,
}

impl PickupPointRegistry {
    pub fn new(pickup_points: Arc<dyn PickupPointRepository>) -> Self {
        Self { pickup_points }
    }

    /// Register a pickup point in one of the allowed cities.
    #[instrument(skip(self))]
    pub async fn create(&self, city: &str) -> Result<PickupPoint, ServiceError> {
        let location: Location = city
            .parse()
            .map_err(|_| ServiceError::InvalidLocation(city.to_string()))?;

        let pickup_point = self.pickup_points.create(location).await?;

        record_pickup_point_created(location.as_str());
        info!(pvz_id = %pickup_point.id, city = %location, "Pickup point created");
        Ok(pickup_point)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<PickupPoint, ServiceError> {
        self.pickup_points
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("pickup point"))
    }

    /// List pickup points with their receptions and items.
    ///
    /// `page`/`limit` are normalized by [`PageRequest::new`]. The date filter
    /// applies to reception open timestamps and only when both bounds are set.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: i64,
        limit: i64,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Page<PickupPointWithReceptions>, ServiceError> {
        let request = PageRequest::new(page, limit);
        let range = DateRange::from_bounds(start, end);

        let result = self.pickup_points.list(request, range).await?;

        info!(
            count = result.items.len(),
            total = result.total,
            filtered = range.is_some(),
            "Pickup points listed"
        );
        Ok(result)
    }

    /// Every registered pickup point, without receptions.
    pub async fn all(&self) -> Result<Vec<PickupPoint>, ServiceError> {
        self.pickup_points.list_all().await
    }
}
