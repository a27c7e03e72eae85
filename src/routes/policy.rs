//! Route Access Policy
//!
//! Declares, per (resource, operation) pair, which gates run before the handler
//! and in what order. The router reads this table when it mounts endpoints, so
//! changing who may call what is a one-line edit here.
//!
//! Gates run left to right. `Authenticate` must precede `AuthorizeAdmin`.

/// The resources exposed over HTTP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Coupons,
    Orders,
    Roles,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::Coupons, Self::Orders, Self::Roles];

    /// Collection path the resource is mounted under.
    pub fn base_path(self) -> &'static str {
        match self {
            Self::Coupons => "/coupons",
            Self::Orders => "/orders",
            Self::Roles => "/roles",
        }
    }
}

/// The five CRUD endpoints every resource exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Self::List,
        Self::Get,
        Self::Create,
        Self::Update,
        Self::Delete,
    ];
}

/// A pre-handler check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    /// Verifies the bearer token and attaches the caller's identity. 401 on failure.
    Authenticate,
    /// Requires the configured administrator role. 403 on failure.
    AuthorizeAdmin,
}

pub const PUBLIC: &[Gate] = &[];
pub const ADMIN_ONLY: &[Gate] = &[Gate::Authenticate, Gate::AuthorizeAdmin];

#[derive(Clone, Copy, Debug)]
pub struct RoutePolicy {
    pub resource: ResourceKind,
    pub operation: Operation,
    pub gates: &'static [Gate],
}

const fn policy(
    resource: ResourceKind,
    operation: Operation,
    gates: &'static [Gate],
) -> RoutePolicy {
    RoutePolicy {
        resource,
        operation,
        gates,
    }
}

use Operation::*;
use ResourceKind::*;

/// Reads are public; every write needs an administrator.
pub const POLICY_TABLE: &[RoutePolicy] = &[
    policy(Coupons, List, PUBLIC),
    policy(Coupons, Get, PUBLIC),
    policy(Coupons, Create, ADMIN_ONLY),
    policy(Coupons, Update, ADMIN_ONLY),
    policy(Coupons, Delete, ADMIN_ONLY),
    policy(Orders, List, PUBLIC),
    policy(Orders, Get, PUBLIC),
    policy(Orders, Create, ADMIN_ONLY),
    policy(Orders, Update, ADMIN_ONLY),
    policy(Orders, Delete, ADMIN_ONLY),
    policy(Roles, List, PUBLIC),
    policy(Roles, Get, PUBLIC),
    policy(Roles, Create, ADMIN_ONLY),
    policy(Roles, Update, ADMIN_ONLY),
    policy(Roles, Delete, ADMIN_ONLY),
];

/// gates_for
///
/// Looks up the gate chain for a pair. A pair missing from the table gets the
/// strictest chain rather than none.
pub fn gates_for(resource: ResourceKind, operation: Operation) -> &'static [Gate] {
    POLICY_TABLE
        .iter()
        .find(|entry| entry.resource == resource && entry.operation == operation)
        .map(|entry| entry.gates)
        .unwrap_or(ADMIN_ONLY)
}
