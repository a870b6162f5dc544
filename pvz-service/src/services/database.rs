//! Postgres-backed repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use super::metrics::DB_QUERY_DURATION;
use super::repository::{
    latest_open, ItemRepository, PickupPointRepository, ReceptionRepository, UserRepository,
};
use super::ServiceError;
use crate::models::{
    Category, DateRange, Item, Location, Page, PageRequest, PickupPoint,
    PickupPointWithReceptions, Reception, ReceptionStatus, ReceptionWithItems, Role, User,
};

const OPEN_RECEPTION_INDEX: &str = "uq_receptions_one_open_per_pvz";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

// Enum columns are stored as text and parsed on read.

#[derive(FromRow)]
struct PickupPointRow {
    id: Uuid,
    registration_date: DateTime<Utc>,
    city: String,
}

impl TryFrom<PickupPointRow> for PickupPoint {
    type Error = ServiceError;

    fn try_from(row: PickupPointRow) -> Result<Self, Self::Error> {
        Ok(PickupPoint {
            id: row.id,
            registration_date: row.registration_date,
            city: row.city.parse().map_err(corrupt_row)?,
        })
    }
}

#[derive(FromRow)]
struct ReceptionRow {
    id: Uuid,
    date_time: DateTime<Utc>,
    pvz_id: Uuid,
    status: String,
}

impl TryFrom<ReceptionRow> for Reception {
    type Error = ServiceError;

    fn try_from(row: ReceptionRow) -> Result<Self, Self::Error> {
        Ok(Reception {
            id: row.id,
            date_time: row.date_time,
            pvz_id: row.pvz_id,
            status: row.status.parse().map_err(corrupt_row)?,
        })
    }
}

#[derive(FromRow)]
struct ItemRow {
    id: Uuid,
    date_time: DateTime<Utc>,
    category: String,
    reception_id: Uuid,
    sequence_num: i32,
}

impl TryFrom<ItemRow> for Item {
    type Error = ServiceError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Item {
            id: row.id,
            date_time: row.date_time,
            category: row.category.parse().map_err(corrupt_row)?,
            reception_id: row.reception_id,
            sequence_num: row.sequence_num,
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = ServiceError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role.parse().map_err(corrupt_row)?,
            created_at: row.created_at,
        })
    }
}

fn corrupt_row(message: String) -> ServiceError {
    ServiceError::Persistence(anyhow::anyhow!("unexpected column value: {}", message))
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, ServiceError>
where
    T: TryFrom<R, Error = ServiceError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn violated_constraint(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .filter(|db| db.is_unique_violation() || db.is_foreign_key_violation())
        .map(|db| db.constraint().unwrap_or_default().to_string())
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "pvz-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

// =========================================================================
// Pickup points
// =========================================================================

#[async_trait]
impl PickupPointRepository for Database {
    #[instrument(skip(self))]
    async fn create(&self, city: Location) -> Result<PickupPoint, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_pickup_point"])
            .start_timer();

        let row = sqlx::query_as::<_, PickupPointRow>(
            r#"
            INSERT INTO pickup_points (id, registration_date, city)
            VALUES ($1, $2, $3)
            RETURNING id, registration_date, city
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(Utc::now())
        .bind(city.as_str())
        .fetch_one(&self.pool)
        .await?;

        timer.observe_duration();
        row.try_into()
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<PickupPoint>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_pickup_point"])
            .start_timer();

        let row = sqlx::query_as::<_, PickupPointRow>(
            "SELECT id, registration_date, city FROM pickup_points WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();
        row.map(PickupPoint::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        page: PageRequest,
        range: Option<DateRange>,
    ) -> Result<Page<PickupPointWithReceptions>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_pickup_points"])
            .start_timer();

        let start = range.map(|r| r.start);
        let end = range.map(|r| r.end);

        // One snapshot for the page, its receptions, their items and the count.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let points: Vec<PickupPoint> = convert_all(
            sqlx::query_as::<_, PickupPointRow>(
                r#"
                SELECT p.id, p.registration_date, p.city
                FROM pickup_points p
                WHERE $1::timestamptz IS NULL
                   OR EXISTS (
                       SELECT 1 FROM receptions r
                       WHERE r.pvz_id = p.id AND r.date_time >= $1 AND r.date_time <= $2
                   )
                ORDER BY p.id
                LIMIT $3 OFFSET $4
                "#,
            )
            .bind(start)
            .bind(end)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await?,
        )?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM pickup_points p
            WHERE $1::timestamptz IS NULL
               OR EXISTS (
                   SELECT 1 FROM receptions r
                   WHERE r.pvz_id = p.id AND r.date_time >= $1 AND r.date_time <= $2
               )
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&mut *tx)
        .await?;

        let point_ids: Vec<Uuid> = points.iter().map(|p| p.id).collect();
        let receptions: Vec<Reception> = convert_all(
            sqlx::query_as::<_, ReceptionRow>(
                r#"
                SELECT id, date_time, pvz_id, status
                FROM receptions
                WHERE pvz_id = ANY($1)
                  AND ($2::timestamptz IS NULL OR (date_time >= $2 AND date_time <= $3))
                ORDER BY date_time
                "#,
            )
            .bind(&point_ids)
            .bind(start)
            .bind(end)
            .fetch_all(&mut *tx)
            .await?,
        )?;

        let reception_ids: Vec<Uuid> = receptions.iter().map(|r| r.id).collect();
        let items: Vec<Item> = convert_all(
            sqlx::query_as::<_, ItemRow>(
                r#"
                SELECT id, date_time, category, reception_id, sequence_num
                FROM items
                WHERE reception_id = ANY($1)
                ORDER BY sequence_num
                "#,
            )
            .bind(&reception_ids)
            .fetch_all(&mut *tx)
            .await?,
        )?;

        tx.commit().await?;
        timer.observe_duration();

        let mut items_by_reception: HashMap<Uuid, Vec<Item>> = HashMap::new();
        for item in items {
            items_by_reception.entry(item.reception_id).or_default().push(item);
        }

        let mut receptions_by_point: HashMap<Uuid, Vec<ReceptionWithItems>> = HashMap::new();
        for reception in receptions {
            let items = items_by_reception.remove(&reception.id).unwrap_or_default();
            receptions_by_point
                .entry(reception.pvz_id)
                .or_default()
                .push(ReceptionWithItems { reception, items });
        }

        let items = points
            .into_iter()
            .map(|pvz| PickupPointWithReceptions {
                receptions: receptions_by_point.remove(&pvz.id).unwrap_or_default(),
                pvz,
            })
            .collect();

        Ok(Page { items, total })
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<PickupPoint>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_all_pickup_points"])
            .start_timer();

        let rows = sqlx::query_as::<_, PickupPointRow>(
            "SELECT id, registration_date, city FROM pickup_points ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        timer.observe_duration();
        convert_all(rows)
    }
}

// =========================================================================
// Receptions
// =========================================================================

#[async_trait]
impl ReceptionRepository for Database {
    #[instrument(skip(self))]
    async fn create(&self, pvz_id: Uuid) -> Result<Reception, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_reception"])
            .start_timer();

        let row = sqlx::query_as::<_, ReceptionRow>(
            r#"
            INSERT INTO receptions (id, date_time, pvz_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, date_time, pvz_id, status
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(Utc::now())
        .bind(pvz_id)
        .bind(ReceptionStatus::InProgress.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violated_constraint(&e).as_deref() {
            Some(OPEN_RECEPTION_INDEX) => ServiceError::ConflictAlreadyOpen,
            Some("receptions_pvz_id_fkey") => ServiceError::NotFound("pickup point"),
            _ => ServiceError::from(e),
        })?;

        timer.observe_duration();
        row.try_into()
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Reception>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_reception"])
            .start_timer();

        let row = sqlx::query_as::<_, ReceptionRow>(
            "SELECT id, date_time, pvz_id, status FROM receptions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();
        row.map(Reception::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn get_open_by_pickup_point_id(
        &self,
        pvz_id: Uuid,
    ) -> Result<Option<Reception>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_open_reception"])
            .start_timer();

        let rows = sqlx::query_as::<_, ReceptionRow>(
            r#"
            SELECT id, date_time, pvz_id, status
            FROM receptions
            WHERE pvz_id = $1 AND status = $2
            ORDER BY date_time DESC
            "#,
        )
        .bind(pvz_id)
        .bind(ReceptionStatus::InProgress.as_str())
        .fetch_all(&self.pool)
        .await?;

        timer.observe_duration();
        Ok(latest_open(pvz_id, convert_all(rows)?))
    }

    #[instrument(skip(self))]
    async fn close(&self, id: Uuid) -> Result<(), ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["close_reception"])
            .start_timer();

        let result = sqlx::query("UPDATE receptions SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(ReceptionStatus::Closed.as_str())
            .execute(&self.pool)
            .await?;

        timer.observe_duration();
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("reception"));
        }
        Ok(())
    }
}

// =========================================================================
// Items
// =========================================================================

#[async_trait]
impl ItemRepository for Database {
    #[instrument(skip(self))]
    async fn create(
        &self,
        category: Category,
        reception_id: Uuid,
        sequence_num: i32,
    ) -> Result<Item, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_item"])
            .start_timer();

        // The insert only happens while the reception is still open; a
        // reused (reception_id, sequence_num) pair fails on the unique key.
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            INSERT INTO items (id, date_time, category, reception_id, sequence_num)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (
                SELECT 1 FROM receptions WHERE id = $4 AND status = $6
            )
            RETURNING id, date_time, category, reception_id, sequence_num
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(Utc::now())
        .bind(category.as_str())
        .bind(reception_id)
        .bind(sequence_num)
        .bind(ReceptionStatus::InProgress.as_str())
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();
        row.ok_or(ServiceError::NoOpenReception)?.try_into()
    }

    #[instrument(skip(self))]
    async fn get_last_by_reception_id(
        &self,
        reception_id: Uuid,
    ) -> Result<Option<Item>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_last_item"])
            .start_timer();

        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, date_time, category, reception_id, sequence_num
            FROM items
            WHERE reception_id = $1
            ORDER BY sequence_num DESC
            LIMIT 1
            "#,
        )
        .bind(reception_id)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();
        row.map(Item::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: Uuid) -> Result<(), ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_item"])
            .start_timer();

        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        timer.observe_duration();
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("product"));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn count_by_reception_id(&self, reception_id: Uuid) -> Result<i64, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_items"])
            .start_timer();

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM items WHERE reception_id = $1")
                .bind(reception_id)
                .fetch_one(&self.pool)
                .await?;

        timer.observe_duration();
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn list_by_reception_id(
        &self,
        reception_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Item>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_items"])
            .start_timer();

        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, date_time, category, reception_id, sequence_num
            FROM items
            WHERE reception_id = $1
            ORDER BY sequence_num
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(reception_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM items WHERE reception_id = $1")
                .bind(reception_id)
                .fetch_one(&self.pool)
                .await?;

        timer.observe_duration();
        Ok(Page {
            items: convert_all(rows)?,
            total,
        })
    }
}

// =========================================================================
// Users
// =========================================================================

#[async_trait]
impl UserRepository for Database {
    #[instrument(skip(self, password_hash))]
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_user"])
            .start_timer();

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violated_constraint(&e).is_some() {
                ServiceError::UserAlreadyExists
            } else {
                ServiceError::from(e)
            }
        })?;

        timer.observe_duration();
        row.try_into()
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_user_by_email"])
            .start_timer();

        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();
        row.map(User::try_from).transpose()
    }
}
