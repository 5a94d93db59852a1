use super::EntityMapper;
use crate::models::{MappingResult, ReviewDto, ReviewEntity};

pub struct ReviewMapper;

impl EntityMapper for ReviewMapper {
    type Entity = ReviewEntity;
    type Dto = ReviewDto;

    const ENTITY_NAME: &'static str = "ReviewEntity";
    const DTO_NAME: &'static str = "ReviewDTO";

    fn to_dto(entity: &ReviewEntity) -> MappingResult<ReviewDto> {
        Ok(ReviewDto {
            id: entity.id,
            user_id: entity.user_id,
            product_id: entity.product_id,
            rating: entity.rating,
            comment: entity.comment.clone(),
            created_at: entity.created_at,
        })
    }

    fn to_entity(dto: &ReviewDto) -> MappingResult<ReviewEntity> {
        Ok(ReviewEntity {
            id: dto.id,
            user_id: dto.user_id,
            product_id: dto.product_id,
            rating: dto.rating,
            comment: dto.comment.clone(),
            created_at: dto.created_at,
        })
    }
}
