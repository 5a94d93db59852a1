use super::EntityMapper;
use crate::models::{MappingResult, OrderDto, OrderEntity};

/// Maps orders without descending into their line items or owning user.
pub struct OrderMapper;

impl EntityMapper for OrderMapper {
    type Entity = OrderEntity;
    type Dto = OrderDto;

    const ENTITY_NAME: &'static str = "OrderEntity";
    const DTO_NAME: &'static str = "OrderDTO";

    fn to_dto(entity: &OrderEntity) -> MappingResult<OrderDto> {
        Ok(OrderDto {
            id: entity.id,
            user_id: entity.user_id,
            status: entity.status,
            total_price: entity.total_price,
            created_at: entity.created_at,
        })
    }

    fn to_entity(dto: &OrderDto) -> MappingResult<OrderEntity> {
        Ok(OrderEntity {
            id: dto.id,
            user_id: dto.user_id,
            status: dto.status,
            total_price: dto.total_price,
            created_at: dto.created_at,
        })
    }
}
