use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    CafeteriaDto, ProductDto, RepositoryError, ServiceError, UserDto,
};
use crate::services::{CafeteriaService, ProductService, UserService};

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

/// Shared application state containing all services
#[derive(Clone)]
pub struct ApiState {
    pub product_service: Arc<ProductService>,
    pub cafeteria_service: Arc<CafeteriaService>,
    pub user_service: Arc<UserService>,
}

/// Create API router with all endpoints
pub fn create_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/products", get(get_all_products).post(create_product))
        .route(
            "/api/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/cafeterias", get(get_all_cafeterias))
        .route("/api/cafeterias/:id", get(get_cafeteria))
        .route("/api/cafeterias/:id/products", get(get_cafeteria_products))
        .route("/api/orders/:id/products", get(get_order_products))
        .route("/api/users", get(get_all_users))
        .route("/api/users/:id", get(get_user))
        .with_state(state)
}

// =============================================================================
// PRODUCT ENDPOINTS
// =============================================================================

#[instrument(name = "get_all_products", skip(state))]
pub async fn get_all_products(State(state): State<ApiState>) -> ApiResult<Json<Vec<ProductDto>>> {
    state
        .product_service
        .get_all_products()
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_product", skip(state), fields(id = %id))]
pub async fn get_product(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProductDto>> {
    state
        .product_service
        .get_product_by_id(id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "create_product", skip(state, dto), fields(name = %dto.name))]
pub async fn create_product(
    State(state): State<ApiState>,
    Json(dto): Json<ProductDto>,
) -> ApiResult<(StatusCode, Json<ProductDto>)> {
    let created = state
        .product_service
        .create_product(dto)
        .await
        .map_err(service_error_to_response)?;

    crate::info_with_trace!(product_id = ?created.id, "Product created");
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(name = "update_product", skip(state, dto), fields(id = %id))]
pub async fn update_product(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(dto): Json<ProductDto>,
) -> ApiResult<Json<ProductDto>> {
    state
        .product_service
        .update_product(id, dto)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "delete_product", skip(state), fields(id = %id))]
pub async fn delete_product(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .product_service
        .delete_product(id)
        .await
        .map_err(service_error_to_response)?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(name = "get_order_products", skip(state), fields(order_id = %order_id))]
pub async fn get_order_products(
    State(state): State<ApiState>,
    Path(order_id): Path<i64>,
) -> ApiResult<Json<Vec<ProductDto>>> {
    state
        .product_service
        .get_all_products_from_order_id(order_id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

// =============================================================================
// CAFETERIA ENDPOINTS
// =============================================================================

#[instrument(name = "get_all_cafeterias", skip(state))]
pub async fn get_all_cafeterias(
    State(state): State<ApiState>,
) -> ApiResult<Json<Vec<CafeteriaDto>>> {
    state
        .cafeteria_service
        .get_all_cafeterias()
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_cafeteria", skip(state), fields(id = %id))]
pub async fn get_cafeteria(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CafeteriaDto>> {
    state
        .cafeteria_service
        .get_cafeteria_by_id(id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_cafeteria_products", skip(state), fields(cafeteria_id = %id))]
pub async fn get_cafeteria_products(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<ProductDto>>> {
    state
        .product_service
        .get_all_products_from_cafeteria_id(id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

// =============================================================================
// USER ENDPOINTS
// =============================================================================

#[instrument(name = "get_all_users", skip(state))]
pub async fn get_all_users(State(state): State<ApiState>) -> ApiResult<Json<Vec<UserDto>>> {
    state
        .user_service
        .get_all_users()
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_user", skip(state), fields(id = %id))]
pub async fn get_user(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserDto>> {
    state
        .user_service
        .get_user_by_id(id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Convert ServiceError to HTTP response
fn service_error_to_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, message) = match &err {
        ServiceError::BadRequest { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::Mapping { .. } => {
            crate::error_with_trace!(error = %err, "Mapping invariant violated");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
        ServiceError::Repository { source } => match source {
            RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            RepositoryError::ConstraintViolation { .. } | RepositoryError::InvalidInput { .. } => {
                crate::warn_with_trace!(error = %source, "Repository rejected request data");
                (StatusCode::BAD_REQUEST, source.to_string())
            }
            RepositoryError::ConnectionFailed { .. } | RepositoryError::Timeout => {
                crate::error_with_trace!(error = %source, "Repository unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Database unavailable".to_string(),
                )
            }
            _ => {
                crate::error_with_trace!(error = %source, "Repository operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        },
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
