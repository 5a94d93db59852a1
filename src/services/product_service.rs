use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

use super::{require_positive_id, validate_price};
use crate::mappers::{EntityMapper, OrderProductMapper, ProductMapper};
use crate::models::{DeletedFilter, ProductDto, ProductEntity, ServiceError, ServiceResult};
use crate::observability::BusinessTracingMiddleware;
use crate::repositories::{
    CafeteriaRepository, OrderProductRepository, ProductChanges, ProductRepository,
};

const SERVICE: &str = "product";

/// Service for managing the products sold by cafeterias.
///
/// Soft-deleted products are invisible here: listings skip them and lookups
/// by id report them as missing.
pub struct ProductService {
    product_repository: Arc<dyn ProductRepository>,
    cafeteria_repository: Arc<dyn CafeteriaRepository>,
    order_product_repository: Arc<dyn OrderProductRepository>,
    tracer: Arc<BusinessTracingMiddleware>,
}

impl ProductService {
    pub fn new(
        product_repository: Arc<dyn ProductRepository>,
        cafeteria_repository: Arc<dyn CafeteriaRepository>,
        order_product_repository: Arc<dyn OrderProductRepository>,
        tracer: Arc<BusinessTracingMiddleware>,
    ) -> Self {
        Self {
            product_repository,
            cafeteria_repository,
            order_product_repository,
            tracer,
        }
    }

    /// Create a new product. Any `id` or `deleted` value in the request is ignored.
    #[instrument(skip(self, dto), fields(name = %dto.name, cafeteria_id = ?dto.cafeteria_id))]
    pub async fn create_product(&self, dto: ProductDto) -> ServiceResult<ProductDto> {
        self.tracer
            .trace_service_operation(SERVICE, "create_product", async {
                crate::info_with_trace!("Creating new product");
                validate_price(dto.price)?;

                if let Some(cafeteria_id) = dto.cafeteria_id {
                    require_positive_id("Cafeteria", cafeteria_id)?;
                    if self
                        .cafeteria_repository
                        .find_by_id(cafeteria_id)
                        .await?
                        .is_none()
                    {
                        return Err(ServiceError::not_found("Cafeteria", cafeteria_id));
                    }
                }

                let mut entity = ProductMapper::to_entity(&dto)?;
                entity.id = None;
                entity.deleted = false;

                let saved = self.product_repository.save(entity).await?;
                crate::info_with_trace!(product_id = ?saved.id, "Product created successfully");

                Ok(ProductMapper::to_dto(&saved)?)
            })
            .await
    }

    /// Get a product by ID
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product_by_id(&self, id: i64) -> ServiceResult<ProductDto> {
        self.tracer
            .trace_service_operation(SERVICE, "get_product_by_id", async {
                let product = self.find_active(id).await?;
                Ok(ProductMapper::to_dto(&product)?)
            })
            .await
    }

    /// List every active product
    #[instrument(skip(self))]
    pub async fn get_all_products(&self) -> ServiceResult<Vec<ProductDto>> {
        self.tracer
            .trace_service_operation(SERVICE, "get_all_products", async {
                let products = self
                    .product_repository
                    .find_all(DeletedFilter::ActiveOnly)
                    .await?;

                if products.is_empty() {
                    return Err(ServiceError::empty("No products found"));
                }

                crate::info_with_trace!("Found {} products", products.len());
                Ok(ProductMapper::map_all_to_dto(&products)?)
            })
            .await
    }

    /// List the active products of one cafeteria
    #[instrument(skip(self), fields(cafeteria_id = %cafeteria_id))]
    pub async fn get_all_products_from_cafeteria_id(
        &self,
        cafeteria_id: i64,
    ) -> ServiceResult<Vec<ProductDto>> {
        self.tracer
            .trace_service_operation(SERVICE, "get_all_products_from_cafeteria_id", async {
                require_positive_id("Cafeteria", cafeteria_id)?;

                let products = self
                    .product_repository
                    .find_by_cafeteria_id(cafeteria_id, DeletedFilter::ActiveOnly)
                    .await?;

                if products.is_empty() {
                    return Err(ServiceError::empty(format!(
                        "No products found for cafeteria id: {}",
                        cafeteria_id
                    )));
                }

                Ok(ProductMapper::map_all_to_dto(&products)?)
            })
            .await
    }

    /// List the distinct active products on an order, in line order.
    ///
    /// Deleted lines, lines whose product row is gone and deleted products
    /// are all skipped.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_all_products_from_order_id(
        &self,
        order_id: i64,
    ) -> ServiceResult<Vec<ProductDto>> {
        self.tracer
            .trace_service_operation(SERVICE, "get_all_products_from_order_id", async {
                require_positive_id("Order", order_id)?;

                let links = self
                    .order_product_repository
                    .find_by_order_id(order_id, DeletedFilter::ActiveOnly)
                    .await?;

                let mut seen = HashSet::new();
                let mut products: Vec<ProductEntity> = Vec::new();
                for link in links {
                    OrderProductMapper::check_joined_product(&link)?;

                    let Some(product) = link.product else {
                        crate::warn_with_trace!(
                            product_id = link.product_id,
                            "Order line references a missing product"
                        );
                        continue;
                    };
                    if product.deleted || !seen.insert(link.product_id) {
                        continue;
                    }
                    products.push(product);
                }

                if products.is_empty() {
                    return Err(ServiceError::empty(format!(
                        "No products found for order id: {}",
                        order_id
                    )));
                }

                Ok(ProductMapper::map_all_to_dto(&products)?)
            })
            .await
    }

    /// Overwrite name, price and product type of a live product
    #[instrument(skip(self, dto), fields(id = %id))]
    pub async fn update_product(&self, id: i64, dto: ProductDto) -> ServiceResult<ProductDto> {
        self.tracer
            .trace_service_operation(SERVICE, "update_product", async {
                require_positive_id("Product", id)?;
                validate_price(dto.price)?;

                let changes = ProductChanges {
                    name: dto.name,
                    price: dto.price,
                    product_type: dto.product_type,
                };
                let updated = self
                    .product_repository
                    .update_details(id, changes)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Product", id))?;
                crate::info_with_trace!("Product updated successfully");

                Ok(ProductMapper::to_dto(&updated)?)
            })
            .await
    }

    /// Soft-delete a product
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: i64) -> ServiceResult<()> {
        self.tracer
            .trace_service_operation(SERVICE, "delete_product", async {
                require_positive_id("Product", id)?;

                if !self.product_repository.soft_delete(id).await? {
                    return Err(ServiceError::not_found("Product", id));
                }
                crate::info_with_trace!("Product deleted successfully");

                Ok(())
            })
            .await
    }

    async fn find_active(&self, id: i64) -> ServiceResult<ProductEntity> {
        require_positive_id("Product", id)?;

        match self.product_repository.find_by_id(id).await? {
            Some(product) if !product.deleted => Ok(product),
            _ => Err(ServiceError::not_found("Product", id)),
        }
    }
}
