use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    OrderEntity, OrderStatus, RepositoryError, RepositoryResult, ReviewEntity, RoleEntity,
    UserEntity,
};
use crate::observability::DatabaseTracingMiddleware;

/// Trait defining the interface for user data access operations.
///
/// Users are returned with their roles, orders and reviews loaded.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<UserEntity>>;

    async fn find_all(&self) -> RepositoryResult<Vec<UserEntity>>;
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
}

#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
    user_id: i64,
    id: i64,
    name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    status: String,
    total_price: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    user_id: i64,
    product_id: Option<i64>,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

/// Associations of a batch of users, keyed by user id
#[derive(Default)]
struct UserAssociations {
    roles: HashMap<i64, HashSet<RoleEntity>>,
    orders: HashMap<i64, Vec<OrderEntity>>,
    reviews: HashMap<i64, HashSet<ReviewEntity>>,
}

impl UserAssociations {
    fn attach(&mut self, row: UserRow) -> UserEntity {
        UserEntity {
            id: Some(row.id),
            username: row.username,
            email: row.email,
            roles: self.roles.remove(&row.id).unwrap_or_default(),
            orders: self.orders.remove(&row.id).unwrap_or_default(),
            reviews: self.reviews.remove(&row.id).unwrap_or_default(),
        }
    }
}

fn row_to_order(row: OrderRow) -> RepositoryResult<OrderEntity> {
    let status = OrderStatus::from_str(&row.status).map_err(|e| RepositoryError::InvalidData {
        message: format!("order {}: {}", row.id, e),
    })?;

    Ok(OrderEntity {
        id: Some(row.id),
        user_id: Some(row.user_id),
        status,
        total_price: row.total_price,
        created_at: row.created_at,
    })
}

const USER_SQL: &str = "SELECT id, username, email FROM users";

const ROLES_SQL: &str = "\
    SELECT ur.user_id, r.id, r.name \
    FROM user_roles ur JOIN roles r ON r.id = ur.role_id \
    WHERE ur.user_id = ANY($1)";

const ORDERS_SQL: &str = "\
    SELECT id, user_id, status, total_price, created_at \
    FROM orders WHERE user_id = ANY($1) ORDER BY created_at, id";

const REVIEWS_SQL: &str = "\
    SELECT id, user_id, product_id, rating, comment, created_at \
    FROM reviews WHERE user_id = ANY($1)";

/// PostgreSQL implementation of the UserRepository trait
pub struct PgUserRepository {
    pool: PgPool,
    tracer: Arc<DatabaseTracingMiddleware>,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, tracer: Arc<DatabaseTracingMiddleware>) -> Self {
        Self { pool, tracer }
    }

    async fn load_associations(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_ids: &[i64],
    ) -> RepositoryResult<UserAssociations> {
        let mut associations = UserAssociations::default();
        if user_ids.is_empty() {
            return Ok(associations);
        }

        let roles = self
            .tracer
            .trace_operation("find_roles", "user_roles", async {
                sqlx::query_as::<_, RoleRow>(ROLES_SQL)
                    .bind(user_ids)
                    .fetch_all(&mut **tx)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;
        for row in roles {
            associations
                .roles
                .entry(row.user_id)
                .or_default()
                .insert(RoleEntity {
                    id: Some(row.id),
                    name: row.name,
                });
        }

        let orders = self
            .tracer
            .trace_operation("find_orders", "orders", async {
                sqlx::query_as::<_, OrderRow>(ORDERS_SQL)
                    .bind(user_ids)
                    .fetch_all(&mut **tx)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;
        for row in orders {
            let user_id = row.user_id;
            associations
                .orders
                .entry(user_id)
                .or_default()
                .push(row_to_order(row)?);
        }

        let reviews = self
            .tracer
            .trace_operation("find_reviews", "reviews", async {
                sqlx::query_as::<_, ReviewRow>(REVIEWS_SQL)
                    .bind(user_ids)
                    .fetch_all(&mut **tx)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;
        for row in reviews {
            associations
                .reviews
                .entry(row.user_id)
                .or_default()
                .insert(ReviewEntity {
                    id: Some(row.id),
                    user_id: Some(row.user_id),
                    product_id: row.product_id,
                    rating: row.rating,
                    comment: row.comment,
                    created_at: row.created_at,
                });
        }

        Ok(associations)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self), fields(table = "users", id = %id))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<UserEntity>> {
        info!("Finding user by ID");

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let sql = format!("{} WHERE id = $1", USER_SQL);
        let row = self
            .tracer
            .trace_operation("find_by_id", "users", async {
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        let user = match row {
            Some(row) => {
                let mut associations = self.load_associations(&mut tx, &[id]).await?;
                Some(associations.attach(row))
            }
            None => None,
        };

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(user)
    }

    #[instrument(skip(self), fields(table = "users"))]
    async fn find_all(&self) -> RepositoryResult<Vec<UserEntity>> {
        info!("Finding all users");

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let sql = format!("{} ORDER BY id", USER_SQL);
        let rows = self
            .tracer
            .trace_operation("find_all", "users", async {
                sqlx::query_as::<_, UserRow>(&sql)
                    .fetch_all(&mut *tx)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut associations = self.load_associations(&mut tx, &ids).await?;
        let users: Vec<UserEntity> = rows
            .into_iter()
            .map(|row| associations.attach(row))
            .collect();

        tx.commit().await.map_err(RepositoryError::from)?;

        info!("Found {} users", users.len());
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn create_test_order_row(status: &str) -> OrderRow {
        OrderRow {
            id: 12,
            user_id: 3,
            status: status.to_string(),
            total_price: dec!(14.50),
            created_at: Utc.with_ymd_and_hms(2024, 5, 6, 11, 45, 0).unwrap(),
        }
    }

    #[test]
    fn test_row_to_order() {
        let order = row_to_order(create_test_order_row("ready_for_pickup")).unwrap();

        assert_eq!(order.id, Some(12));
        assert_eq!(order.user_id, Some(3));
        assert_eq!(order.status, OrderStatus::ReadyForPickup);
        assert_eq!(order.total_price, dec!(14.50));
    }

    #[test]
    fn test_row_to_order_unknown_status() {
        let result = row_to_order(create_test_order_row("lost"));
        assert!(matches!(result, Err(RepositoryError::InvalidData { .. })));
    }

    #[test]
    fn test_attach_takes_user_associations() {
        let mut associations = UserAssociations::default();
        associations.roles.entry(3).or_default().insert(RoleEntity {
            id: Some(1),
            name: "ADMIN".to_string(),
        });
        associations
            .orders
            .entry(3)
            .or_default()
            .push(row_to_order(create_test_order_row("pending")).unwrap());

        let with = associations.attach(UserRow {
            id: 3,
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
        });
        let without = associations.attach(UserRow {
            id: 4,
            username: "ben".to_string(),
            email: "ben@example.com".to_string(),
        });

        assert_eq!(with.roles.len(), 1);
        assert_eq!(with.orders.len(), 1);
        assert!(with.reviews.is_empty());
        assert!(without.roles.is_empty());
        assert!(without.orders.is_empty());
    }
}
