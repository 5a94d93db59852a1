use super::EntityMapper;
use crate::models::{MappingResult, RoleDto, RoleEntity};

pub struct RoleMapper;

impl EntityMapper for RoleMapper {
    type Entity = RoleEntity;
    type Dto = RoleDto;

    const ENTITY_NAME: &'static str = "RoleEntity";
    const DTO_NAME: &'static str = "RoleDTO";

    fn to_dto(entity: &RoleEntity) -> MappingResult<RoleDto> {
        Ok(RoleDto {
            id: entity.id,
            name: entity.name.clone(),
        })
    }

    fn to_entity(dto: &RoleDto) -> MappingResult<RoleEntity> {
        Ok(RoleEntity {
            id: dto.id,
            name: dto.name.clone(),
        })
    }
}
