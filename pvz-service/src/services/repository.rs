//! Persistence seams for the pickup point, reception, item and user records.
//!
//! Implemented by [`Database`](super::Database) for Postgres and by
//! [`MemoryStore`](super::MemoryStore) for tests and `STORAGE_BACKEND=memory`.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::ServiceError;
use crate::models::{
    Category, DateRange, Item, Location, Page, PageRequest, PickupPoint,
    PickupPointWithReceptions, Reception, Role, User,
};

#[async_trait]
pub trait PickupPointRepository: Send + Sync {
    async fn create(&self, city: Location) -> Result<PickupPoint, ServiceError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<PickupPoint>, ServiceError>;

    /// Pickup points ordered by id. With a range, only points that have a
    /// reception opened inside it are returned, each with only those
    /// receptions. `total` counts every match, not just this page.
    async fn list(
        &self,
        page: PageRequest,
        range: Option<DateRange>,
    ) -> Result<Page<PickupPointWithReceptions>, ServiceError>;

    /// Every pickup point ordered by id, without receptions.
    async fn list_all(&self) -> Result<Vec<PickupPoint>, ServiceError>;
}

#[async_trait]
pub trait ReceptionRepository: Send + Sync {
    /// Insert an open reception. Fails with `ConflictAlreadyOpen` when the
    /// store already holds an open reception for `pvz_id`.
    async fn create(&self, pvz_id: Uuid) -> Result<Reception, ServiceError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Reception>, ServiceError>;

    /// The open reception for a pickup point, if any.
    async fn get_open_by_pickup_point_id(
        &self,
        pvz_id: Uuid,
    ) -> Result<Option<Reception>, ServiceError>;

    async fn close(&self, id: Uuid) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Insert an item. Fails with `NoOpenReception` if the reception is no
    /// longer open at insert time.
    async fn create(
        &self,
        category: Category,
        reception_id: Uuid,
        sequence_num: i32,
    ) -> Result<Item, ServiceError>;

    async fn get_last_by_reception_id(
        &self,
        reception_id: Uuid,
    ) -> Result<Option<Item>, ServiceError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<(), ServiceError>;

    async fn count_by_reception_id(&self, reception_id: Uuid) -> Result<i64, ServiceError>;

    /// Items ordered by sequence number ascending.
    async fn list_by_reception_id(
        &self,
        reception_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Item>, ServiceError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `UserAlreadyExists` on a duplicate email.
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, ServiceError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;
}

/// Trait-object handles for one storage backend.
#[derive(Clone)]
pub struct Repositories {
    pub pickup_points: Arc<dyn PickupPointRepository>,
    pub receptions: Arc<dyn ReceptionRepository>,
    pub items: Arc<dyn ItemRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn from_store<S>(store: S) -> Self
    where
        S: PickupPointRepository + ReceptionRepository + ItemRepository + UserRepository + 'static,
    {
        let store = Arc::new(store);
        Self {
            pickup_points: store.clone(),
            receptions: store.clone(),
            items: store.clone(),
            users: store,
        }
    }
}

/// Choose the most recently opened reception out of `open`.
///
/// More than one candidate means the single-open-reception invariant was
/// broken somewhere; that is logged as a consistency fault.
pub(crate) fn latest_open(pvz_id: Uuid, mut open: Vec<Reception>) -> Option<Reception> {
    if open.len() > 1 {
        tracing::error!(
            pvz_id = %pvz_id,
            open_receptions = open.len(),
            "Consistency fault: several open receptions for one pickup point"
        );
    }
    open.sort_by_key(|r| r.date_time);
    open.pop()
}
