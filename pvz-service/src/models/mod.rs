//! Domain models for pvz-service.

mod item;
mod pagination;
mod pickup_point;
mod reception;
mod user;

pub use item::{Category, Item};
pub use pagination::{page_count, DateRange, Page, PageRequest, DEFAULT_LIMIT, UNBOUNDED_LIMIT};
pub use pickup_point::{Location, PickupPoint, PickupPointWithReceptions};
pub use reception::{Reception, ReceptionStatus, ReceptionWithItems};
pub use user::{Role, User};
