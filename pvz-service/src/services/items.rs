//! Item sequencing within the open reception of a pickup point.

use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::locks::KeyedLocks;
use super::metrics::record_item_added;
use super::repository::{
    ItemRepository, PickupPointRepository, ReceptionRepository, Repositories,
};
use super::ServiceError;
use crate::models::{Category, Item, Page, PageRequest, Reception};

/// Appends and pops items of the single open reception.
///
/// Sequence numbers are `count + 1`. Removing the last item frees its number
/// and the next append takes it again; nothing is ever renumbered.
#[derive(Clone)]
pub struct ItemSequencer {
    pickup_points: Arc<dyn PickupPointRepository>,
    receptions: Arc<dyn ReceptionRepository>,
    items: Arc<dyn ItemRepository>,
    locks: KeyedLocks,
}

impl ItemSequencer {
    pub fn new(repos: &Repositories, locks: KeyedLocks) -> Self {
        Self {
            pickup_points: repos.pickup_points.clone(),
            receptions: repos.receptions.clone(),
            items: repos.items.clone(),
            locks,
        }
    }

    async fn ensure_pickup_point(&self, pvz_id: Uuid) -> Result<(), ServiceError> {
        match self.pickup_points.get_by_id(pvz_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound("pickup point")),
        }
    }

    async fn open_reception_of(&self, pvz_id: Uuid) -> Result<Reception, ServiceError> {
        self.receptions
            .get_open_by_pickup_point_id(pvz_id)
            .await?
            .ok_or(ServiceError::NoOpenReception)
    }

    #[instrument(skip(self))]
    pub async fn append(&self, pvz_id: Uuid, category: &str) -> Result<Item, ServiceError> {
        let _guard = self.locks.lock(pvz_id).await;

        self.ensure_pickup_point(pvz_id).await?;
        let category: Category = category
            .parse()
            .map_err(|_| ServiceError::InvalidCategory(category.to_string()))?;
        let reception = self.open_reception_of(pvz_id).await?;

        let count = self.items.count_by_reception_id(reception.id).await?;
        let sequence_num = i32::try_from(count + 1)
            .map_err(|_| anyhow::anyhow!("sequence overflow in reception {}", reception.id))?;

        let item = self
            .items
            .create(category, reception.id, sequence_num)
            .await?;

        record_item_added(category.as_str());
        info!(
            pvz_id = %pvz_id,
            reception_id = %reception.id,
            item_id = %item.id,
            sequence_num = item.sequence_num,
            "Item added"
        );
        Ok(item)
    }

    /// Delete the item with the highest sequence number of the open reception.
    #[instrument(skip(self))]
    pub async fn remove_last(&self, pvz_id: Uuid) -> Result<(), ServiceError> {
        let _guard = self.locks.lock(pvz_id).await;

        self.ensure_pickup_point(pvz_id).await?;
        let reception = self.open_reception_of(pvz_id).await?;
        let last = self
            .items
            .get_last_by_reception_id(reception.id)
            .await?
            .ok_or(ServiceError::EmptyReception)?;

        self.items.delete_by_id(last.id).await?;

        info!(
            pvz_id = %pvz_id,
            reception_id = %reception.id,
            item_id = %last.id,
            sequence_num = last.sequence_num,
            "Last item removed"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_by_reception(
        &self,
        reception_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<Page<Item>, ServiceError> {
        if self.receptions.get_by_id(reception_id).await?.is_none() {
            return Err(ServiceError::NotFound("reception"));
        }

        self.items
            .list_by_reception_id(reception_id, PageRequest::new(page, limit))
            .await
    }
}
