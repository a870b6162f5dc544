pub mod auth;
pub mod health;
pub mod items;
pub mod pickup_points;
pub mod receptions;
