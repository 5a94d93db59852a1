// Repositories module - data access layer

pub mod cafeteria_repository;
pub mod order_product_repository;
pub mod product_repository;
pub mod user_repository;

pub use cafeteria_repository::{CafeteriaRepository, PgCafeteriaRepository};
pub use order_product_repository::{OrderProductRepository, PgOrderProductRepository};
pub use product_repository::{PgProductRepository, ProductChanges, ProductRepository};
pub use user_repository::{PgUserRepository, UserRepository};
