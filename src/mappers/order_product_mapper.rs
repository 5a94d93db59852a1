use super::EntityMapper;
use crate::models::{MappingError, MappingResult, OrderProductDto, OrderProductEntity};

/// Maps order/product links by identifier. The joined product is not carried
/// into the DTO and is left unloaded on the way back.
pub struct OrderProductMapper;

impl OrderProductMapper {
    /// Reject a link whose joined product row is not the one it references
    pub fn check_joined_product(entity: &OrderProductEntity) -> MappingResult<()> {
        match &entity.product {
            Some(product) if product.id != Some(entity.product_id) => {
                Err(MappingError::InvalidReference {
                    type_name: Self::ENTITY_NAME,
                    message: format!(
                        "link references product {} but joined product is {:?}",
                        entity.product_id, product.id
                    ),
                })
            }
            _ => Ok(()),
        }
    }
}

impl EntityMapper for OrderProductMapper {
    type Entity = OrderProductEntity;
    type Dto = OrderProductDto;

    const ENTITY_NAME: &'static str = "OrderProductEntity";
    const DTO_NAME: &'static str = "OrderProductDTO";

    fn to_dto(entity: &OrderProductEntity) -> MappingResult<OrderProductDto> {
        Self::check_joined_product(entity)?;

        Ok(OrderProductDto {
            id: entity.id,
            order_id: entity.order_id,
            product_id: entity.product_id,
            quantity: entity.quantity,
            deleted: entity.deleted,
        })
    }

    fn to_entity(dto: &OrderProductDto) -> MappingResult<OrderProductEntity> {
        Ok(OrderProductEntity {
            id: dto.id,
            order_id: dto.order_id,
            product_id: dto.product_id,
            product: None,
            quantity: dto.quantity,
            deleted: dto.deleted,
        })
    }
}
