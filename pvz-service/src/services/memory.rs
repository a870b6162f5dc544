//! In-process store used by tests and `STORAGE_BACKEND=memory`.
//!
//! Every constraint the Postgres schema enforces (one open reception per
//! pickup point, unique sequence per reception, inserts only into an open
//! reception, unique email) is checked here under the write lock.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{
    latest_open, ItemRepository, PickupPointRepository, ReceptionRepository, UserRepository,
};
use super::ServiceError;
use crate::models::{
    Category, DateRange, Item, Location, Page, PageRequest, PickupPoint,
    PickupPointWithReceptions, Reception, ReceptionStatus, ReceptionWithItems, Role, User,
};

#[derive(Default)]
struct MemoryState {
    pickup_points: HashMap<Uuid, PickupPoint>,
    receptions: HashMap<Uuid, Reception>,
    items: HashMap<Uuid, Item>,
    users: HashMap<String, User>,
}

impl MemoryState {
    fn items_of(&self, reception_id: Uuid) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .items
            .values()
            .filter(|i| i.reception_id == reception_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.sequence_num);
        items
    }

    fn receptions_of(&self, pvz_id: Uuid, range: Option<DateRange>) -> Vec<Reception> {
        let mut receptions: Vec<Reception> = self
            .receptions
            .values()
            .filter(|r| r.pvz_id == pvz_id)
            .filter(|r| range.map_or(true, |range| range.contains(r.date_time)))
            .cloned()
            .collect();
        receptions.sort_by_key(|r| r.date_time);
        receptions
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PickupPointRepository for MemoryStore {
    async fn create(&self, city: Location) -> Result<PickupPoint, ServiceError> {
        let pickup_point = PickupPoint {
            id: Uuid::new_v4(),
            registration_date: Utc::now(),
            city,
        };
        self.state
            .write()
            .await
            .pickup_points
            .insert(pickup_point.id, pickup_point.clone());
        Ok(pickup_point)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<PickupPoint>, ServiceError> {
        Ok(self.state.read().await.pickup_points.get(&id).cloned())
    }

    async fn list(
        &self,
        page: PageRequest,
        range: Option<DateRange>,
    ) -> Result<Page<PickupPointWithReceptions>, ServiceError> {
        let state = self.state.read().await;

        let mut points: Vec<&PickupPoint> = state.pickup_points.values().collect();
        points.sort_by_key(|p| p.id);

        let matching: Vec<(PickupPoint, Vec<Reception>)> = points
            .into_iter()
            .map(|p| (p.clone(), state.receptions_of(p.id, range)))
            .filter(|(_, receptions)| range.is_none() || !receptions.is_empty())
            .collect();

        let total = matching.len() as i64;
        let items = page
            .apply(&matching)
            .into_iter()
            .map(|(pvz, receptions)| PickupPointWithReceptions {
                pvz,
                receptions: receptions
                    .into_iter()
                    .map(|reception| ReceptionWithItems {
                        items: state.items_of(reception.id),
                        reception,
                    })
                    .collect(),
            })
            .collect();

        Ok(Page { items, total })
    }

    async fn list_all(&self) -> Result<Vec<PickupPoint>, ServiceError> {
        let mut points: Vec<PickupPoint> =
            self.state.read().await.pickup_points.values().cloned().collect();
        points.sort_by_key(|p| p.id);
        Ok(points)
    }
}

#[async_trait]
impl ReceptionRepository for MemoryStore {
    async fn create(&self, pvz_id: Uuid) -> Result<Reception, ServiceError> {
        let mut state = self.state.write().await;

        if state
            .receptions
            .values()
            .any(|r| r.pvz_id == pvz_id && r.is_open())
        {
            return Err(ServiceError::ConflictAlreadyOpen);
        }

        let reception = Reception {
            id: Uuid::new_v4(),
            date_time: Utc::now(),
            pvz_id,
            status: ReceptionStatus::InProgress,
        };
        state.receptions.insert(reception.id, reception.clone());
        Ok(reception)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Reception>, ServiceError> {
        Ok(self.state.read().await.receptions.get(&id).cloned())
    }

    async fn get_open_by_pickup_point_id(
        &self,
        pvz_id: Uuid,
    ) -> Result<Option<Reception>, ServiceError> {
        let state = self.state.read().await;
        let open = state
            .receptions
            .values()
            .filter(|r| r.pvz_id == pvz_id && r.is_open())
            .cloned()
            .collect();
        Ok(latest_open(pvz_id, open))
    }

    async fn close(&self, id: Uuid) -> Result<(), ServiceError> {
        let mut state = self.state.write().await;
        let reception = state
            .receptions
            .get_mut(&id)
            .ok_or(ServiceError::NotFound("reception"))?;
        reception.status = ReceptionStatus::Closed;
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for MemoryStore {
    async fn create(
        &self,
        category: Category,
        reception_id: Uuid,
        sequence_num: i32,
    ) -> Result<Item, ServiceError> {
        let mut state = self.state.write().await;

        let open = state
            .receptions
            .get(&reception_id)
            .is_some_and(Reception::is_open);
        if !open {
            return Err(ServiceError::NoOpenReception);
        }

        if state
            .items
            .values()
            .any(|i| i.reception_id == reception_id && i.sequence_num == sequence_num)
        {
            return Err(ServiceError::Persistence(anyhow::anyhow!(
                "sequence number {} already used in reception {}",
                sequence_num,
                reception_id
            )));
        }

        let item = Item {
            id: Uuid::new_v4(),
            date_time: Utc::now(),
            category,
            reception_id,
            sequence_num,
        };
        state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_last_by_reception_id(
        &self,
        reception_id: Uuid,
    ) -> Result<Option<Item>, ServiceError> {
        let state = self.state.read().await;
        Ok(state
            .items
            .values()
            .filter(|i| i.reception_id == reception_id)
            .max_by_key(|i| i.sequence_num)
            .cloned())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), ServiceError> {
        self.state
            .write()
            .await
            .items
            .remove(&id)
            .map(|_| ())
            .ok_or(ServiceError::NotFound("product"))
    }

    async fn count_by_reception_id(&self, reception_id: Uuid) -> Result<i64, ServiceError> {
        let state = self.state.read().await;
        Ok(state
            .items
            .values()
            .filter(|i| i.reception_id == reception_id)
            .count() as i64)
    }

    async fn list_by_reception_id(
        &self,
        reception_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Item>, ServiceError> {
        let items = self.state.read().await.items_of(reception_id);
        Ok(Page {
            total: items.len() as i64,
            items: page.apply(&items),
        })
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, ServiceError> {
        let mut state = self.state.write().await;
        if state.users.contains_key(email) {
            return Err(ServiceError::UserAlreadyExists);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: Utc::now(),
        };
        state.users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.state.read().await.users.get(email).cloned())
    }
}
