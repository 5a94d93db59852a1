use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of products a cafeteria sells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Meal,
    Drink,
    Snack,
    Dessert,
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductType::Meal => write!(f, "meal"),
            ProductType::Drink => write!(f, "drink"),
            ProductType::Snack => write!(f, "snack"),
            ProductType::Dessert => write!(f, "dessert"),
        }
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "meal" => Ok(ProductType::Meal),
            "drink" => Ok(ProductType::Drink),
            "snack" => Ok(ProductType::Snack),
            "dessert" => Ok(ProductType::Dessert),
            _ => Err(format!("Invalid product type: {}", s)),
        }
    }
}

/// Lifecycle of a placed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    ReadyForPickup,
    Completed,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Preparing => write!(f, "preparing"),
            OrderStatus::ReadyForPickup => write!(f, "ready_for_pickup"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready_for_pickup" => Ok(OrderStatus::ReadyForPickup),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}
