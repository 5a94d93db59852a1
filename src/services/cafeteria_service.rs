use std::sync::Arc;
use tracing::instrument;

use super::require_positive_id;
use crate::mappers::{CafeteriaMapper, EntityMapper};
use crate::models::{CafeteriaDto, ServiceError, ServiceResult};
use crate::observability::BusinessTracingMiddleware;
use crate::repositories::CafeteriaRepository;

const SERVICE: &str = "cafeteria";

pub struct CafeteriaService {
    repository: Arc<dyn CafeteriaRepository>,
    tracer: Arc<BusinessTracingMiddleware>,
}

impl CafeteriaService {
    pub fn new(
        repository: Arc<dyn CafeteriaRepository>,
        tracer: Arc<BusinessTracingMiddleware>,
    ) -> Self {
        Self { repository, tracer }
    }

    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_cafeteria_by_id(&self, id: i64) -> ServiceResult<CafeteriaDto> {
        self.tracer
            .trace_service_operation(SERVICE, "get_cafeteria_by_id", async {
                require_positive_id("Cafeteria", id)?;

                let cafeteria = self
                    .repository
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Cafeteria", id))?;

                Ok(CafeteriaMapper::to_dto(&cafeteria)?)
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_all_cafeterias(&self) -> ServiceResult<Vec<CafeteriaDto>> {
        self.tracer
            .trace_service_operation(SERVICE, "get_all_cafeterias", async {
                let cafeterias = self.repository.find_all().await?;

                if cafeterias.is_empty() {
                    return Err(ServiceError::empty("No cafeterias found"));
                }

                Ok(CafeteriaMapper::map_all_to_dto(&cafeterias)?)
            })
            .await
    }
}
