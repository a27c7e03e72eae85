use commerce_api::{
    InMemoryRepository, ResourceService,
    models::{Coupon, CouponInput, EntityId, MAX_ROLE_NAME_LEN, Order, OrderInput, Role, RoleInput},
    service::ServiceError,
};
use std::sync::Arc;

// --- Helper Functions ---

fn coupon_service() -> (Arc<InMemoryRepository<Coupon>>, ResourceService<Coupon>) {
    let repo = Arc::new(InMemoryRepository::<Coupon>::new());
    (repo.clone(), ResourceService::new(repo))
}

fn role_service() -> ResourceService<Role> {
    ResourceService::new(Arc::new(InMemoryRepository::<Role>::new()))
}

fn role(name: &str) -> RoleInput {
    RoleInput {
        name: name.to_string(),
        description: format!("{name} role"),
    }
}

// --- Validation ---

#[tokio::test]
async fn test_negative_price_is_rejected_and_nothing_is_stored() {
    let (repo, coupons) = coupon_service();

    let err = coupons
        .create(CouponInput {
            description: "broken".into(),
            price: -1.0,
            category: "misc".into(),
        })
        .await
        .unwrap_err();

    match err {
        ServiceError::Invalid(invalid) => assert_eq!(invalid.field, "price"),
        other => panic!("expected a validation error, got {other:?}"),
    }
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn test_blank_and_non_finite_fields_are_rejected() {
    let (_, coupons) = coupon_service();

    let blank = coupons
        .create(CouponInput {
            description: "   ".into(),
            price: 1.0,
            category: "misc".into(),
        })
        .await;
    assert!(matches!(blank, Err(ServiceError::Invalid(e)) if e.field == "description"));

    let nan = coupons
        .create(CouponInput {
            description: "nan".into(),
            price: f64::NAN,
            category: "misc".into(),
        })
        .await;
    assert!(matches!(nan, Err(ServiceError::Invalid(e)) if e.field == "price"));
}

#[tokio::test]
async fn test_invalid_update_leaves_entity_untouched() {
    let (_, coupons) = coupon_service();
    let created = coupons
        .create(CouponInput {
            description: "fine".into(),
            price: 3.0,
            category: "misc".into(),
        })
        .await
        .unwrap();

    let result = coupons
        .update(
            created.id,
            CouponInput {
                description: "fine".into(),
                price: -3.0,
                category: "misc".into(),
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::Invalid(_))));
    assert_eq!(coupons.get_by_id(created.id).await.unwrap(), Some(created));
}

#[tokio::test]
async fn test_order_quantity_must_be_positive() {
    let orders = ResourceService::<Order>::new(Arc::new(InMemoryRepository::<Order>::new()));
    let result = orders
        .create(OrderInput {
            customer: "Ada".into(),
            product: "Beans".into(),
            quantity: 0,
            total: 0.0,
            coupon_id: None,
        })
        .await;

    assert!(matches!(result, Err(ServiceError::Invalid(e)) if e.field == "quantity"));
}

#[tokio::test]
async fn test_order_coupon_reference_is_not_checked() {
    let orders = ResourceService::<Order>::new(Arc::new(InMemoryRepository::<Order>::new()));
    let order = orders
        .create(OrderInput {
            customer: "Ada".into(),
            product: "Beans".into(),
            quantity: 2,
            total: 38.0,
            coupon_id: Some("no-such-coupon".into()),
        })
        .await
        .unwrap();

    assert_eq!(order.coupon_id.as_deref(), Some("no-such-coupon"));
}

#[tokio::test]
async fn test_role_name_length_is_bounded() {
    let roles = role_service();
    let long = "r".repeat(MAX_ROLE_NAME_LEN + 1);

    let result = roles.create(role(&long)).await;
    assert!(matches!(result, Err(ServiceError::Invalid(e)) if e.field == "name"));

    let exact = "r".repeat(MAX_ROLE_NAME_LEN);
    assert!(roles.create(role(&exact)).await.is_ok());
}

// --- Uniqueness ---

#[tokio::test]
async fn test_duplicate_role_name_is_a_conflict() {
    let roles = role_service();
    roles.create(role("Support")).await.unwrap();

    let result = roles.create(role("  support ")).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
    assert_eq!(roles.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_role_can_be_updated_under_its_own_name() {
    let roles = role_service();
    let support = roles.create(role("support")).await.unwrap();

    let updated = roles
        .update(
            support.id,
            RoleInput {
                name: "Support".into(),
                description: "renamed casing".into(),
            },
        )
        .await
        .unwrap()
        .expect("role exists");

    assert_eq!(updated.name, "Support");
    assert_eq!(updated.description, "renamed casing");
}

#[tokio::test]
async fn test_renaming_onto_another_role_is_a_conflict() {
    let roles = role_service();
    roles.create(role("support")).await.unwrap();
    let billing = roles.create(role("billing")).await.unwrap();

    let result = roles.update(billing.id, role("support")).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
}

#[tokio::test]
async fn test_updating_an_unknown_role_under_a_taken_name_is_absent() {
    let roles = role_service();
    roles.create(role("support")).await.unwrap();

    let result = roles.update(EntityId::generate(), role("support")).await;
    assert!(matches!(result, Ok(None)));
    assert_eq!(roles.get_all().await.unwrap().len(), 1);
}

// --- Absence ---

#[tokio::test]
async fn test_absent_entities_are_none_not_errors() {
    let (_, coupons) = coupon_service();
    let ghost = EntityId::generate();

    assert!(coupons.get_by_id(ghost).await.unwrap().is_none());
    assert!(
        coupons
            .update(
                ghost,
                CouponInput {
                    description: "ghost".into(),
                    price: 1.0,
                    category: "misc".into(),
                }
            )
            .await
            .unwrap()
            .is_none()
    );
    assert!(coupons.delete(ghost).await.is_ok());
}
