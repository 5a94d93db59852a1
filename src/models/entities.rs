//! Persistence-side records as loaded from and written to PostgreSQL.
//!
//! Associations pointing back at a parent (an order's user, a link's order)
//! are stored as identifiers only, so no entity graph can contain a cycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;

use super::{OrderStatus, ProductType};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CafeteriaEntity {
    pub id: Option<i64>,
    pub name: String,
    pub location: Option<String>,
}

/// A product on sale; `deleted` marks a soft-deleted row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductEntity {
    pub id: Option<i64>,
    pub name: String,
    pub price: Decimal,
    pub product_type: ProductType,
    pub cafeteria_id: Option<i64>,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleEntity {
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderEntity {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReviewEntity {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub product_id: Option<i64>,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user together with the associations loaded alongside it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserEntity {
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    pub roles: HashSet<RoleEntity>,
    pub orders: Vec<OrderEntity>,
    pub reviews: HashSet<ReviewEntity>,
}

/// Association row linking an order to a product.
///
/// `product` holds the joined product row when it could be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderProductEntity {
    pub id: Option<i64>,
    pub order_id: i64,
    pub product_id: i64,
    pub product: Option<ProductEntity>,
    pub quantity: i32,
    pub deleted: bool,
}
