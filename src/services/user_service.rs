use std::sync::Arc;
use tracing::instrument;

use super::require_positive_id;
use crate::mappers::{EntityMapper, UserMapper};
use crate::models::{ServiceError, ServiceResult, UserDto};
use crate::observability::BusinessTracingMiddleware;
use crate::repositories::UserRepository;

const SERVICE: &str = "user";

/// Read access to users together with their roles, orders and reviews
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    tracer: Arc<BusinessTracingMiddleware>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, tracer: Arc<BusinessTracingMiddleware>) -> Self {
        Self { repository, tracer }
    }

    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_user_by_id(&self, id: i64) -> ServiceResult<UserDto> {
        self.tracer
            .trace_service_operation(SERVICE, "get_user_by_id", async {
                require_positive_id("User", id)?;

                let user = self
                    .repository
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("User", id))?;

                Ok(UserMapper::to_dto(&user)?)
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_all_users(&self) -> ServiceResult<Vec<UserDto>> {
        self.tracer
            .trace_service_operation(SERVICE, "get_all_users", async {
                let users = self.repository.find_all().await?;

                if users.is_empty() {
                    return Err(ServiceError::empty("No users found"));
                }

                crate::info_with_trace!("Found {} users", users.len());
                Ok(UserMapper::map_all_to_dto(&users)?)
            })
            .await
    }
}
