#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

use cafeteria_rs::models::{
    CafeteriaEntity, DeletedFilter, OrderEntity, OrderProductEntity, OrderStatus, ProductEntity,
    ProductType, RepositoryError, RepositoryResult, ReviewEntity, RoleEntity, UserEntity,
};
use cafeteria_rs::observability::{BusinessTracingMiddleware, Metrics};
use cafeteria_rs::repositories::{
    CafeteriaRepository, OrderProductRepository, ProductChanges, ProductRepository,
    UserRepository,
};
use cafeteria_rs::services::{CafeteriaService, ProductService, UserService};
use cafeteria_rs::{create_app, ApiState};

// =============================================================================
// IN-MEMORY REPOSITORIES
// =============================================================================

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: Mutex<BTreeMap<i64, ProductEntity>>,
    save_calls: AtomicUsize,
    racing_delete: Mutex<Option<i64>>,
}

impl InMemoryProductRepository {
    pub fn with_products(products: Vec<ProductEntity>) -> Self {
        let repository = Self::default();
        {
            let mut stored = repository.products.lock().unwrap();
            for product in products {
                let id = product.id.expect("seeded products need an id");
                stored.insert(id, product);
            }
        }
        repository
    }

    pub fn snapshot(&self) -> Vec<ProductEntity> {
        self.products.lock().unwrap().values().cloned().collect()
    }

    pub fn get(&self, id: i64) -> Option<ProductEntity> {
        self.products.lock().unwrap().get(&id).cloned()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Have another client soft-delete `id` just before the next write lands
    pub fn delete_before_next_write(&self, id: i64) {
        *self.racing_delete.lock().unwrap() = Some(id);
    }

    fn lock_for_write(&self) -> std::sync::MutexGuard<'_, BTreeMap<i64, ProductEntity>> {
        let mut stored = self.products.lock().unwrap();
        if let Some(id) = self.racing_delete.lock().unwrap().take() {
            if let Some(product) = stored.get_mut(&id) {
                product.deleted = true;
            }
        }
        stored
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ProductEntity>> {
        Ok(self.get(id))
    }

    async fn find_all(&self, filter: DeletedFilter) -> RepositoryResult<Vec<ProductEntity>> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|p| filter.admits(p.deleted))
            .collect())
    }

    async fn find_by_cafeteria_id(
        &self,
        cafeteria_id: i64,
        filter: DeletedFilter,
    ) -> RepositoryResult<Vec<ProductEntity>> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|p| p.cafeteria_id == Some(cafeteria_id) && filter.admits(p.deleted))
            .collect())
    }

    async fn save(&self, mut product: ProductEntity) -> RepositoryResult<ProductEntity> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.lock_for_write();

        let id = match product.id {
            Some(id) if stored.contains_key(&id) => id,
            Some(_) => return Err(RepositoryError::NotFound),
            None => stored.keys().next_back().map_or(1, |last| last + 1),
        };
        product.id = Some(id);
        stored.insert(id, product.clone());

        Ok(product)
    }

    async fn update_details(
        &self,
        id: i64,
        changes: ProductChanges,
    ) -> RepositoryResult<Option<ProductEntity>> {
        let mut stored = self.lock_for_write();

        Ok(stored
            .get_mut(&id)
            .filter(|product| !product.deleted)
            .map(|product| {
                product.name = changes.name;
                product.price = changes.price;
                product.product_type = changes.product_type;
                product.clone()
            }))
    }

    async fn soft_delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut stored = self.lock_for_write();

        match stored.get_mut(&id) {
            Some(product) if !product.deleted => {
                product.deleted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub struct InMemoryCafeteriaRepository {
    cafeterias: Vec<CafeteriaEntity>,
}

impl InMemoryCafeteriaRepository {
    pub fn new(cafeterias: Vec<CafeteriaEntity>) -> Self {
        Self { cafeterias }
    }
}

#[async_trait]
impl CafeteriaRepository for InMemoryCafeteriaRepository {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<CafeteriaEntity>> {
        Ok(self.cafeterias.iter().find(|c| c.id == Some(id)).cloned())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<CafeteriaEntity>> {
        Ok(self.cafeterias.clone())
    }
}

/// Joins links against the product store at query time, like the SQL left join
pub struct InMemoryOrderProductRepository {
    links: Vec<OrderProductEntity>,
    products: Arc<InMemoryProductRepository>,
}

impl InMemoryOrderProductRepository {
    pub fn new(links: Vec<OrderProductEntity>, products: Arc<InMemoryProductRepository>) -> Self {
        Self { links, products }
    }
}

#[async_trait]
impl OrderProductRepository for InMemoryOrderProductRepository {
    async fn find_by_order_id(
        &self,
        order_id: i64,
        filter: DeletedFilter,
    ) -> RepositoryResult<Vec<OrderProductEntity>> {
        Ok(self
            .links
            .iter()
            .filter(|link| link.order_id == order_id && filter.admits(link.deleted))
            .map(|link| OrderProductEntity {
                product: self.products.get(link.product_id),
                ..link.clone()
            })
            .collect())
    }
}

pub struct InMemoryUserRepository {
    users: Vec<UserEntity>,
}

impl InMemoryUserRepository {
    pub fn new(users: Vec<UserEntity>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<UserEntity>> {
        Ok(self.users.iter().find(|u| u.id == Some(id)).cloned())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<UserEntity>> {
        Ok(self.users.clone())
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn product(id: i64, name: &str, cafeteria_id: i64) -> ProductEntity {
    ProductEntity {
        id: Some(id),
        name: name.to_string(),
        price: dec!(3.50),
        product_type: ProductType::Meal,
        cafeteria_id: Some(cafeteria_id),
        deleted: false,
    }
}

pub fn cafeteria(id: i64, name: &str) -> CafeteriaEntity {
    CafeteriaEntity {
        id: Some(id),
        name: name.to_string(),
        location: Some(format!("{} building", name)),
    }
}

pub fn link(id: i64, order_id: i64, product_id: i64, deleted: bool) -> OrderProductEntity {
    OrderProductEntity {
        id: Some(id),
        order_id,
        product_id,
        product: None,
        quantity: 1,
        deleted,
    }
}

pub fn user(id: i64, username: &str) -> UserEntity {
    let created_at = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();

    UserEntity {
        id: Some(id),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        roles: [RoleEntity {
            id: Some(1),
            name: "CUSTOMER".to_string(),
        }]
        .into_iter()
        .collect(),
        orders: vec![OrderEntity {
            id: Some(id * 10),
            user_id: Some(id),
            status: OrderStatus::Completed,
            total_price: dec!(7.00),
            created_at,
        }],
        reviews: [ReviewEntity {
            id: Some(id * 100),
            user_id: Some(id),
            product_id: Some(1),
            rating: 5,
            comment: None,
            created_at,
        }]
        .into_iter()
        .collect(),
    }
}

/// Store contents for a test run
#[derive(Default)]
pub struct Seed {
    pub products: Vec<ProductEntity>,
    pub cafeterias: Vec<CafeteriaEntity>,
    pub links: Vec<OrderProductEntity>,
    pub users: Vec<UserEntity>,
}

impl Seed {
    /// Two cafeterias, a few products (one deleted), one order and two users
    pub fn standard() -> Self {
        let mut deleted = product(4, "Old Muffin", 2);
        deleted.deleted = true;

        Seed {
            products: vec![
                product(1, "Pasta", 1),
                product(2, "Salad", 1),
                product(3, "Coffee", 2),
                deleted,
            ],
            cafeterias: vec![cafeteria(1, "Main"), cafeteria(2, "Annex")],
            links: vec![
                link(1, 10, 2, false),
                link(2, 10, 1, false),
                link(3, 10, 3, true),
                link(4, 10, 2, false),
                link(5, 10, 4, false),
                link(6, 20, 3, true),
            ],
            users: vec![user(1, "alice"), user(2, "bob")],
        }
    }
}

// =============================================================================
// TEST ENVIRONMENT
// =============================================================================

pub struct TestEnvironment {
    pub app: Router,
    pub products: Arc<InMemoryProductRepository>,
    pub metrics: Arc<Metrics>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with_seed(Seed::standard())
    }

    pub fn empty() -> Self {
        Self::with_seed(Seed::default())
    }

    pub fn with_seed(seed: Seed) -> Self {
        let metrics = Arc::new(Metrics::new().expect("metrics registry"));
        let tracer = Arc::new(BusinessTracingMiddleware::new(metrics.clone()));

        let products = Arc::new(InMemoryProductRepository::with_products(seed.products));
        let cafeterias = Arc::new(InMemoryCafeteriaRepository::new(seed.cafeterias));
        let links = Arc::new(InMemoryOrderProductRepository::new(
            seed.links,
            products.clone(),
        ));
        let users = Arc::new(InMemoryUserRepository::new(seed.users));

        let api_state = ApiState {
            product_service: Arc::new(ProductService::new(
                products.clone(),
                cafeterias.clone(),
                links,
                tracer.clone(),
            )),
            cafeteria_service: Arc::new(CafeteriaService::new(cafeterias, tracer.clone())),
            user_service: Arc::new(UserService::new(users, tracer)),
        };

        let app = create_app(metrics.clone(), api_state, Duration::from_secs(5));

        Self {
            app,
            products,
            metrics,
        }
    }

    /// Send one request through the router and decode the JSON body (Null when empty)
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }
}
