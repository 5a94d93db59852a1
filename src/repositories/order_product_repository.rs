use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument};

use super::product_repository::{row_to_product, ProductRow};
use crate::models::{DeletedFilter, OrderProductEntity, RepositoryError, RepositoryResult};
use crate::observability::DatabaseTracingMiddleware;

/// Trait defining the interface for order line access
#[async_trait]
pub trait OrderProductRepository: Send + Sync {
    /// Links of one order passing the filter, each with its product joined
    async fn find_by_order_id(
        &self,
        order_id: i64,
        filter: DeletedFilter,
    ) -> RepositoryResult<Vec<OrderProductEntity>>;
}

/// One link row with the product columns of the left join.
/// Product columns are null when the referenced product row is gone.
#[derive(Debug, sqlx::FromRow)]
struct OrderProductRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    quantity: i32,
    deleted: bool,
    p_id: Option<i64>,
    p_name: Option<String>,
    p_price: Option<Decimal>,
    p_product_type: Option<String>,
    p_cafeteria_id: Option<i64>,
    p_deleted: Option<bool>,
}

fn row_to_order_product(row: OrderProductRow) -> RepositoryResult<OrderProductEntity> {
    let product = match (row.p_id, row.p_name, row.p_price, row.p_product_type) {
        (Some(id), Some(name), Some(price), Some(product_type)) => Some(row_to_product(ProductRow {
            id,
            name,
            price,
            product_type,
            cafeteria_id: row.p_cafeteria_id,
            deleted: row.p_deleted.unwrap_or(false),
        })?),
        _ => None,
    };

    Ok(OrderProductEntity {
        id: Some(row.id),
        order_id: row.order_id,
        product_id: row.product_id,
        product,
        quantity: row.quantity,
        deleted: row.deleted,
    })
}

const TABLE: &str = "order_products";

const FIND_BY_ORDER_SQL: &str = "\
    SELECT op.id, op.order_id, op.product_id, op.quantity, op.deleted, \
           p.id AS p_id, p.name AS p_name, p.price AS p_price, \
           p.product_type AS p_product_type, p.cafeteria_id AS p_cafeteria_id, \
           p.deleted AS p_deleted \
    FROM order_products op \
    LEFT JOIN products p ON p.id = op.product_id \
    WHERE op.order_id = $1 AND ($2::BOOLEAN IS NULL OR op.deleted = $2) \
    ORDER BY op.id";

/// PostgreSQL implementation of the OrderProductRepository trait
pub struct PgOrderProductRepository {
    pool: PgPool,
    tracer: Arc<DatabaseTracingMiddleware>,
}

impl PgOrderProductRepository {
    pub fn new(pool: PgPool, tracer: Arc<DatabaseTracingMiddleware>) -> Self {
        Self { pool, tracer }
    }
}

#[async_trait]
impl OrderProductRepository for PgOrderProductRepository {
    #[instrument(skip(self), fields(table = TABLE, order_id = %order_id))]
    async fn find_by_order_id(
        &self,
        order_id: i64,
        filter: DeletedFilter,
    ) -> RepositoryResult<Vec<OrderProductEntity>> {
        info!("Finding order lines");

        let rows = self
            .tracer
            .trace_operation("find_by_order_id", TABLE, async {
                sqlx::query_as::<_, OrderProductRow>(FIND_BY_ORDER_SQL)
                    .bind(order_id)
                    .bind(filter.as_sql_param())
                    .fetch_all(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        rows.into_iter().map(row_to_order_product).collect()
    }
}
