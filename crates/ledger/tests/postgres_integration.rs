//! PostgreSQL integration tests
//!
//! These tests share a single PostgreSQL container for efficiency and
//! are serialized with `serial_test` because they truncate the table.
//!
//! ```bash
//! cargo test -p ledger --test postgres_integration
//! ```

use std::sync::Arc;

use common::{OrderId, Revision, UserId};
use domain::{BillingDetails, LineItem, Money, PaymentAttempt, PaymentMethod, PaymentStatus};
use ledger::{LedgerError, OrderLedger, PostgresOrderLedger};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // Run migrations using raw_sql to execute multiple statements
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_orders_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh ledger with its own pool and a cleared table
async fn get_test_ledger() -> PostgresOrderLedger {
    let info = get_container_info().await;

    // Create a fresh pool for each test to avoid connection issues
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear table for test isolation
    sqlx::query("TRUNCATE TABLE orders")
        .execute(&pool)
        .await
        .unwrap();

    PostgresOrderLedger::new(pool)
}

fn create_test_order(user_id: UserId) -> domain::Order {
    domain::Order::new(
        OrderId::new(),
        user_id,
        vec![
            LineItem::new("rust-101", Money::from_cents(4999)),
            LineItem::new("rust-201", Money::from_cents(7999)),
        ],
        PaymentMethod::CreditCard,
        BillingDetails::new("Ada Lovelace", "ada@example.com"),
    )
    .unwrap()
}

#[tokio::test]
#[serial]
async fn insert_and_retrieve_order() {
    let ledger = get_test_ledger().await;
    let order = create_test_order(UserId::new());

    let stored = ledger.insert(order.clone()).await.unwrap();
    assert_eq!(stored.revision, Revision::first());

    let fetched = ledger.get(order.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, order.id);
    assert_eq!(fetched.total_amount, Money::from_cents(12998));
    assert_eq!(fetched.payment_status, PaymentStatus::Pending);
    assert_eq!(fetched.revision, Revision::first());
}

#[tokio::test]
#[serial]
async fn insert_duplicate_order_rejected() {
    let ledger = get_test_ledger().await;
    let order = create_test_order(UserId::new());

    ledger.insert(order.clone()).await.unwrap();
    let result = ledger.insert(order).await;
    assert!(matches!(result, Err(LedgerError::DuplicateOrder(_))));
}

#[tokio::test]
#[serial]
async fn get_missing_order_returns_none() {
    let ledger = get_test_ledger().await;
    let fetched = ledger.get(OrderId::new()).await.unwrap();
    assert!(fetched.is_none());
}

#[tokio::test]
#[serial]
async fn update_bumps_revision_and_persists_record() {
    let ledger = get_test_ledger().await;
    let order = ledger
        .insert(create_test_order(UserId::new()))
        .await
        .unwrap();

    let mut updated = order.clone();
    updated.claim_payment().unwrap();
    updated
        .settle(PaymentAttempt::approved(
            "PAY-0001",
            "TXN-0001",
            PaymentMethod::CreditCard,
        ))
        .unwrap();

    let stored = ledger.update(updated, order.revision).await.unwrap();
    assert_eq!(stored.revision, Revision::new(2));

    let fetched = ledger.get(order.id).await.unwrap().unwrap();
    assert_eq!(fetched.payment_status, PaymentStatus::Completed);
    assert_eq!(fetched.revision, Revision::new(2));
    assert_eq!(
        fetched.payment_details.unwrap().payment_id.as_deref(),
        Some("PAY-0001")
    );
}

#[tokio::test]
#[serial]
async fn update_with_stale_revision_conflicts() {
    let ledger = get_test_ledger().await;
    let order = ledger
        .insert(create_test_order(UserId::new()))
        .await
        .unwrap();

    let mut first = order.clone();
    first.claim_payment().unwrap();
    ledger.update(first, order.revision).await.unwrap();

    // Second writer still holds revision 1.
    let mut second = order.clone();
    second.claim_payment().unwrap();
    let result = ledger.update(second, order.revision).await;

    match result {
        Err(LedgerError::RevisionConflict {
            expected, actual, ..
        }) => {
            assert_eq!(expected, Revision::first());
            assert_eq!(actual, Revision::new(2));
        }
        other => panic!("expected revision conflict, got {:?}", other.map(|o| o.id)),
    }
}

#[tokio::test]
#[serial]
async fn update_missing_order_not_found() {
    let ledger = get_test_ledger().await;
    let order = create_test_order(UserId::new());
    let result = ledger.update(order, Revision::first()).await;
    assert!(matches!(result, Err(LedgerError::OrderNotFound(_))));
}

#[tokio::test]
#[serial]
async fn remove_rolls_back_inserted_order() {
    let ledger = get_test_ledger().await;
    let order = ledger
        .insert(create_test_order(UserId::new()))
        .await
        .unwrap();

    ledger.remove(order.id).await.unwrap();
    assert!(ledger.get(order.id).await.unwrap().is_none());

    // Removing again is a no-op.
    ledger.remove(order.id).await.unwrap();
}

#[tokio::test]
#[serial]
async fn list_for_user_returns_only_their_orders() {
    let ledger = get_test_ledger().await;
    let user = UserId::new();
    let other = UserId::new();

    let first = ledger.insert(create_test_order(user)).await.unwrap();
    let second = ledger.insert(create_test_order(user)).await.unwrap();
    ledger.insert(create_test_order(other)).await.unwrap();

    let orders = ledger.list_for_user(user).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, first.id);
    assert_eq!(orders[1].id, second.id);
}
