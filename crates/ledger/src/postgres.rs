use async_trait::async_trait;
use common::{OrderId, Revision, UserId};
use domain::Order;
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};

use crate::error::LedgerError;
use crate::store::OrderLedger;
use crate::Result;

/// PostgreSQL-backed order ledger.
///
/// Each order is stored as hot columns (id, user, statuses, revision)
/// plus the full record as JSONB. The revision column implements the
/// compare-and-swap: `UPDATE ... WHERE id = $1 AND revision = $2`.
#[derive(Clone)]
pub struct PostgresOrderLedger {
    pool: PgPool,
}

impl PostgresOrderLedger {
    /// Creates a new PostgreSQL order ledger from an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database named by `database_url` (typically the
    /// `DATABASE_URL` environment variable).
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let record: serde_json::Value = row.try_get("record")?;
        let order: Order = serde_json::from_value(record)?;
        Ok(order)
    }
}

#[async_trait]
impl OrderLedger for PostgresOrderLedger {
    async fn insert(&self, mut order: Order) -> Result<Order> {
        order.revision = Revision::first();
        let record = serde_json::to_value(&order)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, payment_status, fulfillment_status, created_at, revision, record)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.payment_status.as_str())
        .bind(order.fulfillment_status.as_str())
        .bind(order.created_at)
        .bind(order.revision.as_i64())
        .bind(record)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return LedgerError::DuplicateOrder(order.id);
            }
            LedgerError::Database(e)
        })?;

        Ok(order)
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT record FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn update(&self, mut order: Order, expected: Revision) -> Result<Order> {
        order.revision = expected.next();
        let record = serde_json::to_value(&order)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET payment_status = $1, fulfillment_status = $2, revision = $3, record = $4
            WHERE id = $5 AND revision = $6
            "#,
        )
        .bind(order.payment_status.as_str())
        .bind(order.fulfillment_status.as_str())
        .bind(order.revision.as_i64())
        .bind(record)
        .bind(order.id.as_uuid())
        .bind(expected.as_i64())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a stale revision from a missing order.
            let actual: Option<i64> =
                sqlx::query_scalar("SELECT revision FROM orders WHERE id = $1")
                    .bind(order.id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await?;

            return match actual {
                Some(actual) => Err(LedgerError::RevisionConflict {
                    order_id: order.id,
                    expected,
                    actual: Revision::new(actual),
                }),
                None => Err(LedgerError::OrderNotFound(order.id)),
            };
        }

        Ok(order)
    }

    async fn remove(&self, order_id: OrderId) -> Result<()> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT record FROM orders WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}
