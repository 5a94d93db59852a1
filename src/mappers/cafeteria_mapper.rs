use super::EntityMapper;
use crate::models::{CafeteriaDto, CafeteriaEntity, MappingResult};

pub struct CafeteriaMapper;

impl EntityMapper for CafeteriaMapper {
    type Entity = CafeteriaEntity;
    type Dto = CafeteriaDto;

    const ENTITY_NAME: &'static str = "CafeteriaEntity";
    const DTO_NAME: &'static str = "CafeteriaDTO";

    fn to_dto(entity: &CafeteriaEntity) -> MappingResult<CafeteriaDto> {
        Ok(CafeteriaDto {
            id: entity.id,
            name: entity.name.clone(),
            location: entity.location.clone(),
        })
    }

    fn to_entity(dto: &CafeteriaDto) -> MappingResult<CafeteriaEntity> {
        Ok(CafeteriaEntity {
            id: dto.id,
            name: dto.name.clone(),
            location: dto.location.clone(),
        })
    }
}
