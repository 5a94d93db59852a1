use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{OrderStatus, ProductType};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CafeteriaDto {
    pub id: Option<i64>,
    pub name: String,
    pub location: Option<String>,
}

/// Product as exchanged with clients. `id` and `deleted` are ignored on create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductDto {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub price: Decimal,
    pub product_type: ProductType,
    #[serde(default)]
    pub cafeteria_id: Option<i64>,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleDto {
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewDto {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub product_id: Option<i64>,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub roles: HashSet<RoleDto>,
    #[serde(default)]
    pub orders: Vec<OrderDto>,
    #[serde(default)]
    pub reviews: HashSet<ReviewDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderProductDto {
    pub id: Option<i64>,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub deleted: bool,
}
