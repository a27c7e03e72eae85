use async_trait::async_trait;
use commerce_api::{
    InMemoryRepository, TimedRepository,
    models::{Coupon, CouponInput, EntityId, Role, RoleInput},
    repository::{Repository, RepositoryState, StoreError},
};
use std::{sync::Arc, time::Duration};

// --- Helper Functions ---

fn coupon_input(description: &str, price: f64) -> CouponInput {
    CouponInput {
        description: description.to_string(),
        price,
        category: "beverages".to_string(),
    }
}

// --- In-memory Adapter ---

#[tokio::test]
async fn test_create_then_get_returns_same_fields() {
    let repo = InMemoryRepository::<Coupon>::new();
    let input = coupon_input("Two for one", 4.5);

    let created = repo.create(input.clone()).await.unwrap();
    let fetched = repo.get_by_id(created.id).await.unwrap().expect("just created");

    assert_eq!(fetched, created);
    assert_eq!(fetched.description, input.description);
    assert_eq!(fetched.price, input.price);
    assert_eq!(fetched.category, input.category);
    assert_eq!(fetched.created_at, fetched.updated_at);
}

#[tokio::test]
async fn test_create_assigns_distinct_ids() {
    let repo = InMemoryRepository::<Coupon>::new();
    let a = repo.create(coupon_input("a", 1.0)).await.unwrap();
    let b = repo.create(coupon_input("a", 1.0)).await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(repo.len().await, 2);
}

#[tokio::test]
async fn test_get_all_lists_everything_in_insertion_order() {
    let repo = InMemoryRepository::<Coupon>::new();
    assert!(repo.get_all().await.unwrap().is_empty());

    let mut ids = Vec::new();
    for n in 0..5 {
        ids.push(repo.create(coupon_input(&format!("coupon {n}"), n as f64)).await.unwrap().id);
    }

    let listed: Vec<EntityId> = repo.get_all().await.unwrap().iter().map(|c| c.id).collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_update_replaces_fields_and_is_idempotent() {
    let repo = InMemoryRepository::<Coupon>::new();
    let created = repo.create(coupon_input("old", 1.0)).await.unwrap();
    let replacement = coupon_input("new", 2.0);

    let first = repo.update(created.id, replacement.clone()).await.unwrap().unwrap();
    let second = repo.update(created.id, replacement.clone()).await.unwrap().unwrap();

    assert_eq!(first.id, created.id);
    assert_eq!(first.created_at, created.created_at);
    assert_eq!(first.description, "new");
    assert_eq!(second.description, first.description);
    assert_eq!(second.price, first.price);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_update_of_unknown_id_is_none() {
    let repo = InMemoryRepository::<Coupon>::new();
    let result = repo
        .update(EntityId::generate(), coupon_input("ghost", 1.0))
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let repo = InMemoryRepository::<Role>::new();
    let role = repo
        .create(RoleInput {
            name: "support".into(),
            description: String::new(),
        })
        .await
        .unwrap();

    repo.delete(role.id).await.unwrap();
    repo.delete(role.id).await.unwrap();
    repo.delete(EntityId::generate()).await.unwrap();

    assert!(repo.get_by_id(role.id).await.unwrap().is_none());
    assert!(repo.get_all().await.unwrap().is_empty());
}

// --- Time Budget ---

/// Adapter that never answers within any reasonable budget.
struct StalledRepository;

#[async_trait]
impl Repository<Coupon> for StalledRepository {
    async fn get_all(&self) -> Result<Vec<Coupon>, StoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(vec![])
    }
    async fn get_by_id(&self, _id: EntityId) -> Result<Option<Coupon>, StoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(None)
    }
    async fn create(&self, _fields: CouponInput) -> Result<Coupon, StoreError> {
        std::future::pending().await
    }
    async fn update(&self, _id: EntityId, _fields: CouponInput) -> Result<Option<Coupon>, StoreError> {
        std::future::pending().await
    }
    async fn delete(&self, _id: EntityId) -> Result<(), StoreError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_timed_repository_gives_up_after_budget() {
    let budget = Duration::from_millis(20);
    let repo: RepositoryState<Coupon> = TimedRepository::wrap(Arc::new(StalledRepository), budget);

    let err = repo.get_all().await.unwrap_err();
    match err {
        StoreError::Timeout { collection, budget: reported } => {
            assert_eq!(collection, "coupons");
            assert_eq!(reported, budget);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }

    assert!(matches!(
        repo.delete(EntityId::generate()).await,
        Err(StoreError::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_timed_repository_passes_fast_calls_through() {
    let repo: RepositoryState<Coupon> =
        TimedRepository::wrap(Arc::new(InMemoryRepository::<Coupon>::new()), Duration::from_secs(1));

    let created = repo.create(coupon_input("quick", 0.0)).await.unwrap();
    assert_eq!(repo.get_by_id(created.id).await.unwrap(), Some(created));
}
