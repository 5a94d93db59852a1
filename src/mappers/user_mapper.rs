use std::collections::HashSet;

use super::{check_parent_reference, EntityMapper, OrderMapper, ReviewMapper, RoleMapper};
use crate::models::{
    MappingResult, OrderDto, OrderEntity, ReviewDto, ReviewEntity, RoleDto, RoleEntity, UserDto,
    UserEntity,
};

/// Maps a user together with its roles, orders and reviews.
///
/// Orders keep their sequence; roles and reviews are collected into sets.
/// Nested orders and reviews must either omit their `user_id` or name the
/// user being mapped.
pub struct UserMapper;

impl EntityMapper for UserMapper {
    type Entity = UserEntity;
    type Dto = UserDto;

    const ENTITY_NAME: &'static str = "UserEntity";
    const DTO_NAME: &'static str = "UserDTO";

    fn to_dto(entity: &UserEntity) -> MappingResult<UserDto> {
        for order in &entity.orders {
            check_parent_reference(Self::ENTITY_NAME, "order", order.id, order.user_id, entity.id)?;
        }
        for review in &entity.reviews {
            check_parent_reference(
                Self::ENTITY_NAME,
                "review",
                review.id,
                review.user_id,
                entity.id,
            )?;
        }

        let roles: HashSet<RoleDto> = RoleMapper::map_all_to_dto(&entity.roles)?;
        let orders: Vec<OrderDto> = OrderMapper::map_all_to_dto(&entity.orders)?;
        let reviews: HashSet<ReviewDto> = ReviewMapper::map_all_to_dto(&entity.reviews)?;

        Ok(UserDto {
            id: entity.id,
            username: entity.username.clone(),
            email: entity.email.clone(),
            roles,
            orders,
            reviews,
        })
    }

    fn to_entity(dto: &UserDto) -> MappingResult<UserEntity> {
        for order in &dto.orders {
            check_parent_reference(Self::DTO_NAME, "order", order.id, order.user_id, dto.id)?;
        }
        for review in &dto.reviews {
            check_parent_reference(Self::DTO_NAME, "review", review.id, review.user_id, dto.id)?;
        }

        let roles: HashSet<RoleEntity> = RoleMapper::map_all_to_entity(&dto.roles)?;
        let orders: Vec<OrderEntity> = OrderMapper::map_all_to_entity(&dto.orders)?;
        let reviews: HashSet<ReviewEntity> = ReviewMapper::map_all_to_entity(&dto.reviews)?;

        Ok(UserEntity {
            id: dto.id,
            username: dto.username.clone(),
            email: dto.email.clone(),
            roles,
            orders,
            reviews,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MappingError, OrderStatus};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn create_test_order(id: i64, user_id: Option<i64>) -> OrderEntity {
        OrderEntity {
            id: Some(id),
            user_id,
            status: OrderStatus::Completed,
            total_price: dec!(9.80),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn create_test_user() -> UserEntity {
        let roles = [
            RoleEntity {
                id: Some(1),
                name: "CUSTOMER".to_string(),
            },
            RoleEntity {
                id: Some(2),
                name: "STAFF".to_string(),
            },
        ]
        .into_iter()
        .collect();

        let reviews = [ReviewEntity {
            id: Some(5),
            user_id: Some(10),
            product_id: Some(3),
            rating: 4,
            comment: Some("Good coffee".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 0).unwrap(),
        }]
        .into_iter()
        .collect();

        UserEntity {
            id: Some(10),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            roles,
            orders: vec![
                create_test_order(30, Some(10)),
                create_test_order(20, None),
                create_test_order(25, Some(10)),
            ],
            reviews,
        }
    }

    #[test]
    fn test_user_to_dto_maps_associations() {
        let dto = UserMapper::map_to_dto(Some(&create_test_user())).unwrap();

        assert_eq!(dto.id, Some(10));
        assert_eq!(dto.username, "jdoe");
        assert_eq!(dto.email, "jdoe@example.com");
        assert_eq!(dto.roles.len(), 2);
        assert_eq!(dto.reviews.len(), 1);

        let order_ids: Vec<Option<i64>> = dto.orders.iter().map(|o| o.id).collect();
        assert_eq!(order_ids, vec![Some(30), Some(20), Some(25)]);
    }

    #[test]
    fn test_user_round_trip() {
        let entity = create_test_user();
        let dto = UserMapper::to_dto(&entity).unwrap();
        assert_eq!(UserMapper::to_entity(&dto).unwrap(), entity);
    }

    #[test]
    fn test_review_of_other_user_rejected_on_entity_side() {
        let mut dto = UserMapper::to_dto(&create_test_user()).unwrap();
        let mut review = dto.reviews.iter().next().cloned().unwrap();
        review.id = Some(6);
        review.user_id = Some(12);
        dto.reviews.insert(review);

        let err = UserMapper::to_entity(&dto).unwrap_err();
        assert!(matches!(
            err,
            MappingError::InvalidReference {
                type_name: "UserDTO",
                ..
            }
        ));
    }

    #[test]
    fn test_order_of_other_user_rejected() {
        let mut user = create_test_user();
        user.orders.push(create_test_order(99, Some(11)));

        let err = UserMapper::to_dto(&user).unwrap_err();
        assert!(matches!(
            err,
            MappingError::InvalidReference {
                type_name: "UserEntity",
                ..
            }
        ));
    }

    #[test]
    fn test_null_user_rejected() {
        assert_eq!(
            UserMapper::map_to_dto(None).unwrap_err(),
            MappingError::NullInput {
                type_name: "UserEntity"
            }
        );
        assert_eq!(
            UserMapper::map_to_entity(None).unwrap_err(),
            MappingError::NullInput {
                type_name: "UserDTO"
            }
        );
    }

    #[test]
    fn test_empty_associations() {
        let user = UserEntity {
            id: None,
            username: "new".to_string(),
            email: "new@example.com".to_string(),
            ..Default::default()
        };

        let dto = UserMapper::to_dto(&user).unwrap();
        assert!(dto.roles.is_empty());
        assert!(dto.orders.is_empty());
        assert!(dto.reviews.is_empty());
    }
}
