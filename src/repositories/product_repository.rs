use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{DeletedFilter, ProductEntity, ProductType, RepositoryError, RepositoryResult};
use crate::observability::DatabaseTracingMiddleware;

/// Trait defining the interface for product data access operations
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Find a product by its ID, whatever its deleted flag
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ProductEntity>>;

    /// Find all products passing the soft-delete filter
    async fn find_all(&self, filter: DeletedFilter) -> RepositoryResult<Vec<ProductEntity>>;

    /// Find the products sold by one cafeteria
    async fn find_by_cafeteria_id(
        &self,
        cafeteria_id: i64,
        filter: DeletedFilter,
    ) -> RepositoryResult<Vec<ProductEntity>>;

    /// Insert when `id` is unset, otherwise update the existing row
    async fn save(&self, product: ProductEntity) -> RepositoryResult<ProductEntity>;

    /// Apply `changes` to the product only while it is not deleted.
    ///
    /// The check and the write are one statement, so a delete committed
    /// first wins and `None` is returned.
    async fn update_details(
        &self,
        id: i64,
        changes: ProductChanges,
    ) -> RepositoryResult<Option<ProductEntity>>;

    /// Flag a live product as deleted; `false` when no live row has this id
    async fn soft_delete(&self, id: i64) -> RepositoryResult<bool>;
}

/// The product fields callers may change after creation
#[derive(Debug, Clone, PartialEq)]
pub struct ProductChanges {
    pub name: String,
    pub price: Decimal,
    pub product_type: ProductType,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub product_type: String,
    pub cafeteria_id: Option<i64>,
    pub deleted: bool,
}

/// Convert a products row to an entity
pub(crate) fn row_to_product(row: ProductRow) -> RepositoryResult<ProductEntity> {
    let product_type =
        ProductType::from_str(&row.product_type).map_err(|e| RepositoryError::InvalidData {
            message: format!("product {}: {}", row.id, e),
        })?;

    Ok(ProductEntity {
        id: Some(row.id),
        name: row.name,
        price: row.price,
        product_type,
        cafeteria_id: row.cafeteria_id,
        deleted: row.deleted,
    })
}

const PRODUCT_COLUMNS: &str = "id, name, price, product_type, cafeteria_id, deleted";
const TABLE: &str = "products";

/// PostgreSQL implementation of the ProductRepository trait
pub struct PgProductRepository {
    pool: PgPool,
    tracer: Arc<DatabaseTracingMiddleware>,
}

impl PgProductRepository {
    pub fn new(pool: PgPool, tracer: Arc<DatabaseTracingMiddleware>) -> Self {
        Self { pool, tracer }
    }

    async fn insert(&self, product: &ProductEntity) -> RepositoryResult<ProductRow> {
        let sql = format!(
            "INSERT INTO products (name, price, product_type, cafeteria_id, deleted) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            PRODUCT_COLUMNS
        );

        self.tracer
            .trace_operation("insert", TABLE, async {
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(&product.name)
                    .bind(product.price)
                    .bind(product.product_type.to_string())
                    .bind(product.cafeteria_id)
                    .bind(product.deleted)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await
    }

    async fn update(&self, id: i64, product: &ProductEntity) -> RepositoryResult<ProductRow> {
        let sql = format!(
            "UPDATE products SET name = $2, price = $3, product_type = $4, \
             cafeteria_id = $5, deleted = $6 WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        );

        self.tracer
            .trace_operation("update", TABLE, async {
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(id)
                    .bind(&product.name)
                    .bind(product.price)
                    .bind(product.product_type.to_string())
                    .bind(product.cafeteria_id)
                    .bind(product.deleted)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(RepositoryError::from)?
                    .ok_or(RepositoryError::NotFound)
            })
            .await
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    #[instrument(skip(self), fields(table = TABLE, id = %id))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ProductEntity>> {
        info!("Finding product by ID");

        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let row = self
            .tracer
            .trace_operation("find_by_id", TABLE, async {
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        row.map(row_to_product).transpose()
    }

    #[instrument(skip(self), fields(table = TABLE))]
    async fn find_all(&self, filter: DeletedFilter) -> RepositoryResult<Vec<ProductEntity>> {
        info!("Finding all products");

        let sql = format!(
            "SELECT {} FROM products WHERE ($1::BOOLEAN IS NULL OR deleted = $1) ORDER BY id",
            PRODUCT_COLUMNS
        );
        let rows = self
            .tracer
            .trace_operation("find_all", TABLE, async {
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(filter.as_sql_param())
                    .fetch_all(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        let products = rows
            .into_iter()
            .map(row_to_product)
            .collect::<RepositoryResult<Vec<_>>>()?;

        info!("Found {} products", products.len());
        Ok(products)
    }

    #[instrument(skip(self), fields(table = TABLE, cafeteria_id = %cafeteria_id))]
    async fn find_by_cafeteria_id(
        &self,
        cafeteria_id: i64,
        filter: DeletedFilter,
    ) -> RepositoryResult<Vec<ProductEntity>> {
        info!("Finding products by cafeteria");

        let sql = format!(
            "SELECT {} FROM products WHERE cafeteria_id = $1 \
             AND ($2::BOOLEAN IS NULL OR deleted = $2) ORDER BY id",
            PRODUCT_COLUMNS
        );
        let rows = self
            .tracer
            .trace_operation("find_by_cafeteria_id", TABLE, async {
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(cafeteria_id)
                    .bind(filter.as_sql_param())
                    .fetch_all(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        rows.into_iter().map(row_to_product).collect()
    }

    #[instrument(skip(self, product), fields(table = TABLE, id = ?product.id))]
    async fn save(&self, product: ProductEntity) -> RepositoryResult<ProductEntity> {
        let row = match product.id {
            None => {
                info!("Inserting new product");
                self.insert(&product).await?
            }
            Some(id) => {
                info!("Updating product");
                self.update(id, &product).await?
            }
        };

        row_to_product(row)
    }

    #[instrument(skip(self, changes), fields(table = TABLE, id = %id))]
    async fn update_details(
        &self,
        id: i64,
        changes: ProductChanges,
    ) -> RepositoryResult<Option<ProductEntity>> {
        info!("Updating product details");

        let sql = format!(
            "UPDATE products SET name = $2, price = $3, product_type = $4 \
             WHERE id = $1 AND deleted = FALSE RETURNING {}",
            PRODUCT_COLUMNS
        );
        let row = self
            .tracer
            .trace_operation("update_details", TABLE, async {
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(id)
                    .bind(&changes.name)
                    .bind(changes.price)
                    .bind(changes.product_type.to_string())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        row.map(row_to_product).transpose()
    }

    #[instrument(skip(self), fields(table = TABLE, id = %id))]
    async fn soft_delete(&self, id: i64) -> RepositoryResult<bool> {
        info!("Soft-deleting product");

        let result = self
            .tracer
            .trace_operation("soft_delete", TABLE, async {
                sqlx::query("UPDATE products SET deleted = TRUE WHERE id = $1 AND deleted = FALSE")
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
