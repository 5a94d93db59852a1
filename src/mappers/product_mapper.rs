use super::EntityMapper;
use crate::models::{MappingResult, ProductDto, ProductEntity};

pub struct ProductMapper;

impl EntityMapper for ProductMapper {
    type Entity = ProductEntity;
    type Dto = ProductDto;

    const ENTITY_NAME: &'static str = "ProductEntity";
    const DTO_NAME: &'static str = "ProductDTO";

    fn to_dto(entity: &ProductEntity) -> MappingResult<ProductDto> {
        Ok(ProductDto {
            id: entity.id,
            name: entity.name.clone(),
            price: entity.price,
            product_type: entity.product_type,
            cafeteria_id: entity.cafeteria_id,
            deleted: entity.deleted,
        })
    }

    fn to_entity(dto: &ProductDto) -> MappingResult<ProductEntity> {
        Ok(ProductEntity {
            id: dto.id,
            name: dto.name.clone(),
            price: dto.price,
            product_type: dto.product_type,
            cafeteria_id: dto.cafeteria_id,
            deleted: dto.deleted,
        })
    }
}
