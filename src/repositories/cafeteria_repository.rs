use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{CafeteriaEntity, RepositoryError, RepositoryResult};
use crate::observability::DatabaseTracingMiddleware;

/// Trait defining the interface for cafeteria data access operations
#[async_trait]
pub trait CafeteriaRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<CafeteriaEntity>>;

    async fn find_all(&self) -> RepositoryResult<Vec<CafeteriaEntity>>;
}

#[derive(Debug, sqlx::FromRow)]
struct CafeteriaRow {
    id: i64,
    name: String,
    location: Option<String>,
}

fn row_to_cafeteria(row: CafeteriaRow) -> CafeteriaEntity {
    CafeteriaEntity {
        id: Some(row.id),
        name: row.name,
        location: row.location,
    }
}

const TABLE: &str = "cafeterias";

/// PostgreSQL implementation of the CafeteriaRepository trait
pub struct PgCafeteriaRepository {
    pool: PgPool,
    tracer: Arc<DatabaseTracingMiddleware>,
}

impl PgCafeteriaRepository {
    pub fn new(pool: PgPool, tracer: Arc<DatabaseTracingMiddleware>) -> Self {
        Self { pool, tracer }
    }
}

#[async_trait]
impl CafeteriaRepository for PgCafeteriaRepository {
    #[instrument(skip(self), fields(table = TABLE, id = %id))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<CafeteriaEntity>> {
        info!("Finding cafeteria by ID");

        let row = self
            .tracer
            .trace_operation("find_by_id", TABLE, async {
                sqlx::query_as::<_, CafeteriaRow>(
                    "SELECT id, name, location FROM cafeterias WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(RepositoryError::from)
            })
            .await?;

        Ok(row.map(row_to_cafeteria))
    }

    #[instrument(skip(self), fields(table = TABLE))]
    async fn find_all(&self) -> RepositoryResult<Vec<CafeteriaEntity>> {
        info!("Finding all cafeterias");

        let rows = self
            .tracer
            .trace_operation("find_all", TABLE, async {
                sqlx::query_as::<_, CafeteriaRow>(
                    "SELECT id, name, location FROM cafeterias ORDER BY id",
                )
                .fetch_all(&self.pool)
                .await
                .map_err(RepositoryError::from)
            })
            .await?;

        Ok(rows.into_iter().map(row_to_cafeteria).collect())
    }
}
