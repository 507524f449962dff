pub mod health;
pub mod mappings;
pub mod status;

use std::sync::Arc;

use crate::{repositories::MappingsRepository, services::StatusService};

#[derive(Clone)]
pub struct AppState {
    pub mappings_repository: Arc<MappingsRepository>,
    pub status_service: StatusService,
}

impl AppState {
    pub fn new(mappings_repository: Arc<MappingsRepository>, status_service: StatusService) -> Self {
        Self {
            mappings_repository,
            status_service,
        }
    }
}
