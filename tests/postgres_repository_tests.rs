//! Runs against a real database only when `TEST_DATABASE_URL` is set; otherwise
//! every test returns early.

use commerce_api::{
    PostgresRepository,
    models::{Coupon, CouponInput, EntityId, Role, RoleInput},
    repository::{Repository, StoreError, run_migrations},
};
use serial_test::serial;
use sqlx::{PgPool, postgres::PgPoolOptions};

// --- Helper Functions ---

async fn test_pool() -> Option<PgPool> {
    dotenv::dotenv().ok();
    let db_url = std::env::var("TEST_DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&db_url)
        .await
        .expect("Failed to connect to Postgres in tests");
    run_migrations(&pool).await.expect("migrations apply");
    Some(pool)
}

fn coupon_input(description: &str) -> CouponInput {
    CouponInput {
        description: description.to_string(),
        price: 9.99,
        category: "pg".to_string(),
    }
}

// --- Tests ---

#[tokio::test]
#[serial]
async fn test_pg_create_get_update_delete() {
    let Some(pool) = test_pool().await else { return };
    let repo = PostgresRepository::<Coupon>::new(pool);

    let created = repo.create(coupon_input("pg coupon")).await.unwrap();
    assert_eq!(created.description, "pg coupon");

    let fetched = repo.get_by_id(created.id).await.unwrap().expect("row exists");
    assert_eq!(fetched, created);

    let updated = repo
        .update(created.id, coupon_input("pg coupon v2"))
        .await
        .unwrap()
        .expect("row exists");
    assert_eq!(updated.description, "pg coupon v2");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    let listed = repo.get_all().await.unwrap();
    assert!(listed.iter().any(|c| c.id == created.id));

    repo.delete(created.id).await.unwrap();
    repo.delete(created.id).await.unwrap();
    assert!(repo.get_by_id(created.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_pg_unknown_id_is_absent() {
    let Some(pool) = test_pool().await else { return };
    let repo = PostgresRepository::<Coupon>::new(pool);
    let ghost = EntityId::generate();

    assert!(repo.get_by_id(ghost).await.unwrap().is_none());
    assert!(repo.update(ghost, coupon_input("ghost")).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_pg_collections_are_isolated() {
    let Some(pool) = test_pool().await else { return };
    let coupons = PostgresRepository::<Coupon>::new(pool.clone());
    let roles = PostgresRepository::<Role>::new(pool);

    let coupon = coupons.create(coupon_input("isolated")).await.unwrap();
    assert!(roles.get_by_id(coupon.id).await.unwrap().is_none());

    coupons.delete(coupon.id).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_pg_corrupt_document_is_rejected() {
    let Some(pool) = test_pool().await else { return };
    let roles = PostgresRepository::<Role>::new(pool.clone());

    let id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO documents (collection, schema_version, body) VALUES ('roles', 1, $1) RETURNING id",
    )
    .bind(sqlx::types::Json(serde_json::json!({ "title": "no name field" })))
    .fetch_one(&pool)
    .await
    .unwrap();

    let result = roles.get_by_id(EntityId::from(id)).await;
    assert!(matches!(result, Err(StoreError::Corrupt { .. })));

    let stale: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO documents (collection, schema_version, body) VALUES ('roles', 99, $1) RETURNING id",
    )
    .bind(sqlx::types::Json(
        serde_json::to_value(RoleInput {
            name: "future".into(),
            description: String::new(),
        })
        .unwrap(),
    ))
    .fetch_one(&pool)
    .await
    .unwrap();

    let result = roles.get_by_id(EntityId::from(stale)).await;
    assert!(matches!(result, Err(StoreError::Corrupt { expected: 1, .. })));

    sqlx::query("DELETE FROM documents WHERE id = ANY($1)")
        .bind(vec![id, stale])
        .execute(&pool)
        .await
        .unwrap();
}
