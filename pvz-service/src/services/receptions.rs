//! Reception lifecycle: open, close and read back with items.

use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::locks::KeyedLocks;
use super::metrics::record_reception_created;
use super::repository::{
    ItemRepository, PickupPointRepository, ReceptionRepository, Repositories,
};
use super::ServiceError;
use crate::models::{PageRequest, Reception, ReceptionWithItems};

/// Owns the `in_progress` -> `close` transition of receptions.
///
/// Open and close run under the pickup point's lock, shared with
/// [`ItemSequencer`](super::ItemSequencer).
#[derive(Clone)]
pub struct ReceptionLifecycle {
    pickup_points: Arc<dyn PickupPointRepository>,
    receptions: Arc<dyn ReceptionRepository>,
    items: Arc<dyn ItemRepository>,
    locks: KeyedLocks,
}

impl ReceptionLifecycle {
    pub fn new(repos: &Repositories, locks: KeyedLocks) -> Self {
        Self {
            pickup_points: repos.pickup_points.clone(),
            receptions: repos.receptions.clone(),
            items: repos.items.clone(),
            locks,
        }
    }

    /// Open a new reception. At most one reception per pickup point may be
    /// open; the store rejects a second one even across instances.
    #[instrument(skip(self))]
    pub async fn open(&self, pvz_id: Uuid) -> Result<Reception, ServiceError> {
        let _guard = self.locks.lock(pvz_id).await;

        if self.pickup_points.get_by_id(pvz_id).await?.is_none() {
            return Err(ServiceError::NotFound("pickup point"));
        }

        if let Some(open) = self.receptions.get_open_by_pickup_point_id(pvz_id).await? {
            warn!(pvz_id = %pvz_id, reception_id = %open.id, "Reception already open");
            return Err(ServiceError::ConflictAlreadyOpen);
        }

        let reception = self.receptions.create(pvz_id).await?;

        record_reception_created();
        info!(pvz_id = %pvz_id, reception_id = %reception.id, "Reception opened");
        Ok(reception)
    }

    /// Close the open reception of a pickup point and return it re-read.
    #[instrument(skip(self))]
    pub async fn close_latest(&self, pvz_id: Uuid) -> Result<Reception, ServiceError> {
        let _guard = self.locks.lock(pvz_id).await;

        let open = self
            .receptions
            .get_open_by_pickup_point_id(pvz_id)
            .await?
            .ok_or(ServiceError::NoOpenReception)?;

        self.receptions.close(open.id).await?;

        let closed = self
            .receptions
            .get_by_id(open.id)
            .await?
            .ok_or(ServiceError::NotFound("reception"))?;

        info!(pvz_id = %pvz_id, reception_id = %closed.id, "Reception closed");
        Ok(closed)
    }

    /// Reception with all of its items, ordered by sequence number.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<ReceptionWithItems, ServiceError> {
        let reception = self
            .receptions
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("reception"))?;

        let items = self
            .items
            .list_by_reception_id(id, PageRequest::unbounded())
            .await?
            .items;

        Ok(ReceptionWithItems { reception, items })
    }
}
