//! Services layer for pvz-service.
//!
//! The lifecycle services depend only on the repository traits; `Database`
//! and `MemoryStore` are the two storage backends.

mod auth;
mod database;
pub mod error;
mod items;
mod jwt;
mod locks;
mod memory;
pub mod metrics;
mod pickup_points;
mod receptions;
pub mod repository;

pub use auth::{AuthService, DUMMY_EMAIL};
pub use database::Database;
pub use error::ServiceError;
pub use items::ItemSequencer;
pub use jwt::{AccessTokenClaims, JwtService};
pub use locks::KeyedLocks;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use pickup_points::PickupPointRegistry;
pub use receptions::ReceptionLifecycle;
pub use repository::{
    ItemRepository, PickupPointRepository, ReceptionRepository, Repositories, UserRepository,
};
