//! Stateless translation between persistence entities and transfer objects.
//!
//! Each mapper walks exactly one level of association. Nested records refer
//! back to their parent by identifier, and mappers only check that those
//! identifiers agree with the parent being mapped.

pub mod cafeteria_mapper;
pub mod order_mapper;
pub mod order_product_mapper;
pub mod product_mapper;
pub mod review_mapper;
pub mod role_mapper;
pub mod user_mapper;

pub use cafeteria_mapper::CafeteriaMapper;
pub use order_mapper::OrderMapper;
pub use order_product_mapper::OrderProductMapper;
pub use product_mapper::ProductMapper;
pub use review_mapper::ReviewMapper;
pub use role_mapper::RoleMapper;
pub use user_mapper::UserMapper;

use crate::models::{MappingError, MappingResult};

/// Bidirectional entity/DTO translation for one record type
pub trait EntityMapper {
    type Entity;
    type Dto;

    /// Name reported when an entity is missing
    const ENTITY_NAME: &'static str;
    /// Name reported when a DTO is missing
    const DTO_NAME: &'static str;

    fn to_dto(entity: &Self::Entity) -> MappingResult<Self::Dto>;

    fn to_entity(dto: &Self::Dto) -> MappingResult<Self::Entity>;

    /// Map a possibly absent entity, rejecting absence with [`MappingError::NullInput`]
    fn map_to_dto(entity: Option<&Self::Entity>) -> MappingResult<Self::Dto> {
        let entity = entity.ok_or(MappingError::NullInput {
            type_name: Self::ENTITY_NAME,
        })?;
        Self::to_dto(entity)
    }

    /// Map a possibly absent DTO, rejecting absence with [`MappingError::NullInput`]
    fn map_to_entity(dto: Option<&Self::Dto>) -> MappingResult<Self::Entity> {
        let dto = dto.ok_or(MappingError::NullInput {
            type_name: Self::DTO_NAME,
        })?;
        Self::to_entity(dto)
    }

    /// Map a collection of entities into whatever container the caller collects into
    fn map_all_to_dto<'a, I, C>(entities: I) -> MappingResult<C>
    where
        Self::Entity: 'a,
        I: IntoIterator<Item = &'a Self::Entity>,
        C: FromIterator<Self::Dto>,
    {
        entities.into_iter().map(Self::to_dto).collect()
    }

    /// Map a collection of DTOs into whatever container the caller collects into
    fn map_all_to_entity<'a, I, C>(dtos: I) -> MappingResult<C>
    where
        Self::Dto: 'a,
        I: IntoIterator<Item = &'a Self::Dto>,
        C: FromIterator<Self::Entity>,
    {
        dtos.into_iter().map(Self::to_entity).collect()
    }
}

/// Reject a nested record whose back-reference names a different parent
pub(crate) fn check_parent_reference(
    type_name: &'static str,
    child: &str,
    child_id: Option<i64>,
    parent_ref: Option<i64>,
    parent_id: Option<i64>,
) -> MappingResult<()> {
    match (parent_ref, parent_id) {
        (Some(referenced), Some(actual)) if referenced != actual => {
            Err(MappingError::InvalidReference {
                type_name,
                message: format!(
                    "{} {} belongs to {}, not {}",
                    child,
                    child_id.map_or_else(|| "<unsaved>".to_string(), |id| id.to_string()),
                    referenced,
                    actual
                ),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_parent_reference() {
        assert!(check_parent_reference("UserEntity", "order", Some(1), Some(2), Some(2)).is_ok());
        assert!(check_parent_reference("UserEntity", "order", Some(1), None, Some(2)).is_ok());
        assert!(check_parent_reference("UserEntity", "order", None, Some(3), None).is_ok());

        let err = check_parent_reference("UserEntity", "order", Some(1), Some(3), Some(2))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid reference in UserEntity: order 1 belongs to 3, not 2"
        );
    }
}
