use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::repository::{Document, DocumentMeta};

// --- Identity ---

/// EntityId
///
/// Opaque identifier assigned by the store when a document is created.
/// Callers only ever see it as a string; it never changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Mints a fresh identifier. Only persistence adapters should call this.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a path segment into an identifier.
    ///
    /// A malformed segment is a caller mistake, reported against the `id` field.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| ValidationError::new("id", format!("'{raw}' is not a valid identifier")))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// --- Validation ---

/// ValidationError
///
/// A single rejected input field. The message is safe to echo back to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Field-level rules a payload must satisfy before it is written.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::new(
            field,
            "must be a finite number greater than or equal to 0",
        ));
    }
    Ok(())
}

// --- Coupons ---

/// Coupon
///
/// A discount coupon as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Coupon {
    pub id: EntityId,
    pub description: String,
    #[schema(minimum = 0)]
    pub price: f64,
    pub category: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CouponInput
///
/// Mutable coupon fields, used for both POST and PUT. A PUT replaces every field.
/// Unknown fields, including a client-supplied `id`, are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct CouponInput {
    #[schema(example = "Two for one on espresso")]
    pub description: String,
    #[schema(example = 4.5, minimum = 0)]
    pub price: f64,
    #[schema(example = "beverages")]
    pub category: String,
}

impl Validate for CouponInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("description", &self.description)?;
        require_non_negative("price", self.price)?;
        require_text("category", &self.category)
    }
}

impl Document for Coupon {
    type Fields = CouponInput;
    const COLLECTION: &'static str = "coupons";
    const SCHEMA_VERSION: i32 = 1;

    fn assemble(meta: DocumentMeta, fields: CouponInput) -> Self {
        Self {
            id: meta.id,
            description: fields.description,
            price: fields.price,
            category: fields.category,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn fields(&self) -> CouponInput {
        CouponInput {
            description: self.description.clone(),
            price: self.price,
            category: self.category.clone(),
        }
    }
}

// --- Orders ---

/// Order
///
/// A customer order. `coupon_id` is carried as opaque data; nothing checks
/// that it points at an existing coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Order {
    pub id: EntityId,
    pub customer: String,
    pub product: String,
    pub quantity: u32,
    pub total: f64,
    pub coupon_id: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// OrderInput
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct OrderInput {
    #[schema(example = "Ada Lovelace")]
    pub customer: String,
    #[schema(example = "Espresso beans 1kg")]
    pub product: String,
    #[schema(example = 2, minimum = 1)]
    pub quantity: u32,
    #[schema(example = 38.0, minimum = 0)]
    pub total: f64,
    #[serde(default)]
    pub coupon_id: Option<String>,
}

impl Validate for OrderInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("customer", &self.customer)?;
        require_text("product", &self.product)?;
        if self.quantity == 0 {
            return Err(ValidationError::new("quantity", "must be at least 1"));
        }
        require_non_negative("total", self.total)?;
        match &self.coupon_id {
            Some(coupon) => require_text("coupon_id", coupon),
            None => Ok(()),
        }
    }
}

impl Document for Order {
    type Fields = OrderInput;
    const COLLECTION: &'static str = "orders";
    const SCHEMA_VERSION: i32 = 1;

    fn assemble(meta: DocumentMeta, fields: OrderInput) -> Self {
        Self {
            id: meta.id,
            customer: fields.customer,
            product: fields.product,
            quantity: fields.quantity,
            total: fields.total,
            coupon_id: fields.coupon_id,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn fields(&self) -> OrderInput {
        OrderInput {
            customer: self.customer.clone(),
            product: self.product.clone(),
            quantity: self.quantity,
            total: self.total,
            coupon_id: self.coupon_id.clone(),
        }
    }
}

// --- Roles ---

/// Longest role name accepted.
pub const MAX_ROLE_NAME_LEN: usize = 64;

/// Role
///
/// A named role. Names are unique, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Role {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// RoleInput
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct RoleInput {
    #[schema(example = "support")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "Can read orders and answer customers")]
    pub description: String,
}

impl Validate for RoleInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        if self.name.chars().count() > MAX_ROLE_NAME_LEN {
            return Err(ValidationError::new(
                "name",
                format!("must be at most {MAX_ROLE_NAME_LEN} characters"),
            ));
        }
        Ok(())
    }
}

impl Document for Role {
    type Fields = RoleInput;
    const COLLECTION: &'static str = "roles";
    const SCHEMA_VERSION: i32 = 1;

    fn assemble(meta: DocumentMeta, fields: RoleInput) -> Self {
        Self {
            id: meta.id,
            name: fields.name,
            description: fields.description,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn fields(&self) -> RoleInput {
        RoleInput {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    fn unique_key(fields: &RoleInput) -> Option<String> {
        Some(fields.name.trim().to_lowercase())
    }
}

// --- Wire helpers ---

/// ErrorResponse
///
/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}
