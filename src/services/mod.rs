// Services module - business logic layer

pub mod cafeteria_service;
pub mod product_service;
pub mod user_service;

pub use cafeteria_service::CafeteriaService;
pub use product_service::ProductService;
pub use user_service::UserService;

use rust_decimal::Decimal;

use crate::models::{ServiceError, ServiceResult};

/// Prices are stored as NUMERIC(10, 2)
const PRICE_SCALE: u32 = 2;
const PRICE_INTEGER_DIGITS: u32 = 8;

/// Reject identifiers that can never name a stored row
pub(crate) fn require_positive_id(entity: &str, id: i64) -> ServiceResult<()> {
    if id <= 0 {
        return Err(ServiceError::bad_request(format!(
            "{} id must be positive, got {}",
            entity, id
        )));
    }
    Ok(())
}

/// Reject prices the products table would round or overflow
pub(crate) fn validate_price(price: Decimal) -> ServiceResult<()> {
    if price.normalize().scale() > PRICE_SCALE {
        return Err(ServiceError::bad_request(format!(
            "Price {} has more than {} decimal places",
            price, PRICE_SCALE
        )));
    }

    if price.abs() >= Decimal::from(10i64.pow(PRICE_INTEGER_DIGITS)) {
        return Err(ServiceError::bad_request(format!(
            "Price {} is out of range",
            price
        )));
    }

    Ok(())
}
